use jobpulse::config::Config;
use jobpulse::models::JobSource;

pub fn sources(config: &Config) {
    println!("Available sources");
    println!("=================");

    for source in JobSource::all() {
        let settings = config.sources.get(source);
        println!(
            "  {:<10} {:<6} {} (min interval {}ms, {} attempts)",
            source.as_str(),
            source.display_name(),
            settings.base_url,
            settings.min_interval_ms,
            settings.max_attempts
        );
    }
}
