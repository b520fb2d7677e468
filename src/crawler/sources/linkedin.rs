//! LinkedIn (링크드인) adapter for the public guest job search
//!
//! Only postings visible without login are crawled. LinkedIn is sensitive to
//! scraping, so this source gets the slowest pacing and fewest retries in the
//! default configuration and sends navigation-style headers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use url::Url;

use crate::config::Config;
use crate::crawler::fetcher::FetchClient;
use crate::crawler::headers::HeaderProfile;
use crate::crawler::sources::{fetch_body, site_url, truncate_page};
use crate::crawler::JobCrawler;
use crate::models::{JobPosting, JobSource, SearchFilter};
use crate::parser::extract::match_id;
use crate::parser::selectors::{parse_selector, selector_chain, SelectorChain};
use crate::parser::{
    absolute_url, element_text, label_value_pairs, lookup, parse_relative_date, parse_timestamp,
    strip_query,
};
use crate::utils::error::{CrawlerError, ParseError};

const SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Cards per guest search page, fixed by LinkedIn
const PAGE_SIZE: u32 = 25;

const DEFAULT_LOCATION: &str = "대한민국";

/// Geo id for the whole country, used for unknown locations
const KOREA_GEO_ID: &str = "105149562";

/// Only postings from the last week
const POSTED_WITHIN: &str = "r604800";

lazy_static! {
    static ref CARDS: SelectorChain = selector_chain!(
        ".job-search-card",
        ".base-card",
        "li.jobs-search-results__list-item",
    );
    static ref TITLE: SelectorChain = selector_chain!(
        ".base-search-card__title",
        ".job-search-card__title",
        "h3.base-search-card__title",
    );
    static ref LINK: SelectorChain =
        selector_chain!("a.base-card__full-link", "a[data-tracking-control-name]");
    static ref COMPANY: SelectorChain = selector_chain!(
        ".base-search-card__subtitle",
        ".job-search-card__company-name",
        "h4.base-search-card__subtitle",
    );
    static ref LOCATION: SelectorChain = selector_chain!(
        ".job-search-card__location",
        ".base-search-card__metadata span",
    );
    static ref POSTED: SelectorChain = selector_chain!(".job-search-card__listdate", "time");
    static ref LOGO: SelectorChain = selector_chain!(".artdeco-entity-image", "img.company-logo");

    static ref DETAIL_TITLE: SelectorChain =
        selector_chain!(".top-card-layout__title", "h1.topcard__title");
    static ref DETAIL_COMPANY: SelectorChain = selector_chain!(
        ".topcard__org-name-link",
        ".top-card-layout__second-subline a",
    );
    static ref DETAIL_LOCATION: SelectorChain = selector_chain!(
        ".topcard__flavor--bullet",
        ".top-card-layout__first-subline span",
    );
    static ref DETAIL_DESCRIPTION: SelectorChain = selector_chain!(
        ".description__text",
        ".show-more-less-html__markup",
    );
    static ref CRITERIA_ITEMS: SelectorChain = selector_chain!(
        ".description__job-criteria-item",
        ".job-criteria__item",
    );
    static ref CRITERIA_LABEL: Selector =
        parse_selector!(".description__job-criteria-subheader, h3");
    static ref CRITERIA_VALUE: Selector = parse_selector!(".description__job-criteria-text, span");

    static ref ID_PATTERNS: Vec<Regex> =
        vec![Regex::new(r"jobs/view/(?:[^/?]*-)?(\d+)").expect("valid regex")];
}

/// LinkedIn job crawler for public postings
pub struct LinkedInCrawler {
    fetcher: FetchClient,
    site_url: Url,
}

impl LinkedInCrawler {
    /// Create the adapter from the `sources.linkedin` configuration
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let fetcher = FetchClient::for_source(config, JobSource::LinkedIn)?
            .with_profile(HeaderProfile::Navigate);
        let site_url = site_url(&fetcher, JobSource::LinkedIn)?;
        Ok(Self { fetcher, site_url })
    }
}

#[async_trait]
impl JobCrawler for LinkedInCrawler {
    fn source(&self) -> JobSource {
        JobSource::LinkedIn
    }

    async fn search_page(
        &self,
        filter: &SearchFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobPosting>, CrawlerError> {
        let params = search_params(filter, page);
        let Some(body) = fetch_body(&self.fetcher, self.source(), SEARCH_PATH, &params).await
        else {
            return Ok(Vec::new());
        };

        Ok(truncate_page(
            parse_search_results(&body, &self.site_url, Utc::now()),
            limit,
        ))
    }

    async fn fetch_detail(&self, source_id: &str) -> Result<Option<JobPosting>, CrawlerError> {
        let path = format!("/jobs/view/{source_id}");
        let Some(body) = fetch_body(&self.fetcher, self.source(), &path, &[]).await else {
            return Ok(None);
        };

        let url = absolute_url(&self.site_url, &path);
        match parse_detail(&body, source_id, &url) {
            Ok(posting) => Ok(Some(posting)),
            Err(e) => {
                tracing::warn!(source = "linkedin", source_id, error = %e, "Unparseable detail page");
                Ok(None)
            }
        }
    }
}

/// Query parameters for one page of search results
pub fn search_params(filter: &SearchFilter, page: u32) -> Vec<(&'static str, String)> {
    let location = filter.location.as_deref().map(str::trim);
    let start = page.saturating_sub(1) * PAGE_SIZE;

    let mut params = vec![
        ("keywords", filter.keyword.clone()),
        (
            "location",
            location.unwrap_or(DEFAULT_LOCATION).to_string(),
        ),
        ("start", start.to_string()),
        ("f_TPR", POSTED_WITHIN.to_string()),
        ("geoId", geo_id(location).to_string()),
    ];

    if let Some(level) = filter.experience_level.as_deref().and_then(experience_code) {
        params.push(("f_E", level.to_string()));
    }

    params
}

/// Geo id for a location, defaulting to the whole country
pub fn geo_id(location: Option<&str>) -> &'static str {
    match location {
        Some("서울") => "105509042",
        Some("경기") => "107178665",
        Some("부산") => "102246151",
        Some("대구") => "100805908",
        Some("인천") => "105169312",
        Some("대전") => "106279546",
        _ => KOREA_GEO_ID,
    }
}

/// `f_E` seniority code
pub fn experience_code(level: &str) -> Option<&'static str> {
    match level.trim() {
        "인턴" => Some("1"),
        "신입" => Some("2"),
        "주니어" => Some("3"),
        "중간" => Some("4"),
        "시니어" => Some("5"),
        "임원" => Some("6"),
        _ => None,
    }
}

/// Parse a guest search fragment
///
/// Cards without a title or a job id in their link are skipped. `now` anchors
/// relative dates such as "3일 전".
pub fn parse_search_results(html: &str, site_url: &Url, now: DateTime<Utc>) -> Vec<JobPosting> {
    let document = Html::parse_document(html);

    CARDS
        .all(document.root_element())
        .into_iter()
        .filter_map(|card| match parse_card(card, site_url, now) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::warn!(source = "linkedin", error = %e, "Failed to parse card");
                None
            }
        })
        .collect()
}

fn parse_card(
    card: ElementRef<'_>,
    site_url: &Url,
    now: DateTime<Utc>,
) -> Result<JobPosting, ParseError> {
    let title = TITLE.text(card).ok_or(ParseError::MissingField("title"))?;
    let href = LINK.attr(card, "href").unwrap_or_default();
    let id = match_id(&href, &ID_PATTERNS)
        .ok_or_else(|| ParseError::IdExtractionFailed(href.clone()))?;

    let source_url = if href.is_empty() {
        absolute_url(site_url, &format!("/jobs/view/{id}"))
    } else {
        strip_query(&href)
    };

    let logo = LOGO
        .attr(card, "data-delayed-url")
        .or_else(|| LOGO.attr(card, "src"));

    Ok(JobPosting::new(
        JobSource::LinkedIn,
        id,
        title,
        COMPANY.text(card).unwrap_or_default(),
        source_url,
    )
    .with_location(LOCATION.text(card))
    .with_posted_at(posted_at(card, now))
    .with_company_logo_url(logo))
}

/// `datetime` attribute first, relative text as fallback
fn posted_at(card: ElementRef<'_>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let element = POSTED.first(card)?;

    if let Some(value) = element.value().attr("datetime") {
        if let Ok(parsed) = parse_timestamp(value) {
            return Some(parsed);
        }
    }

    parse_relative_date(&element_text(element), now)
}

/// Parse a `/jobs/view/{id}` detail page
pub fn parse_detail(html: &str, source_id: &str, url: &str) -> Result<JobPosting, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = DETAIL_TITLE
        .text(root)
        .ok_or(ParseError::MissingField("title"))?;

    let items = CRITERIA_ITEMS.all(root);
    let criteria = label_value_pairs(&items, &CRITERIA_LABEL, &CRITERIA_VALUE);

    Ok(JobPosting::new(
        JobSource::LinkedIn,
        source_id,
        title,
        DETAIL_COMPANY.text(root).unwrap_or_default(),
        url,
    )
    .with_location(DETAIL_LOCATION.text(root))
    .with_description(DETAIL_DESCRIPTION.block_text(root))
    .with_experience_level(lookup(&criteria, &["경력 수준", "Seniority level"]))
    .with_employment_type(lookup(&criteria, &["고용 형태", "Employment type"]))
    .with_category(lookup(&criteria, &["직무", "Job function"]))
    .with_raw_data(json!({ "criteria": criteria })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn site() -> Url {
        Url::parse("https://www.linkedin.com").unwrap()
    }

    #[test]
    fn test_search_params_defaults() {
        let params = search_params(&SearchFilter::new("rust"), 3);
        assert!(params.contains(&("location", "대한민국".to_string())));
        assert!(params.contains(&("start", "50".to_string())));
        assert!(params.contains(&("geoId", KOREA_GEO_ID.to_string())));
        assert!(params.contains(&("f_TPR", "r604800".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "f_E"));
    }

    #[test]
    fn test_search_params_filters() {
        let filter = SearchFilter {
            keyword: "rust".to_string(),
            location: Some("서울".to_string()),
            experience_level: Some("시니어".to_string()),
        };
        let params = search_params(&filter, 1);
        assert!(params.contains(&("location", "서울".to_string())));
        assert!(params.contains(&("geoId", "105509042".to_string())));
        assert!(params.contains(&("f_E", "5".to_string())));
        assert!(params.contains(&("start", "0".to_string())));
    }

    #[test]
    fn test_unknown_location_uses_country_geo_id() {
        assert_eq!(geo_id(Some("제주")), KOREA_GEO_ID);
        assert_eq!(experience_code("CTO"), None);
    }

    #[test]
    fn test_parse_cards() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let html = r#"
            <li><div class="base-card job-search-card">
              <a class="base-card__full-link" href="https://kr.linkedin.com/jobs/view/backend-engineer-at-acme-3812345678?refId=abc&amp;trackingId=x"></a>
              <img class="artdeco-entity-image" data-delayed-url="https://media.licdn.com/logo.png">
              <h3 class="base-search-card__title"> Backend Engineer </h3>
              <h4 class="base-search-card__subtitle"><a>Acme Korea</a></h4>
              <span class="job-search-card__location">Seoul, South Korea</span>
              <time class="job-search-card__listdate" datetime="2026-10-14">2일 전</time>
            </div></li>
            <li><div class="base-card job-search-card">
              <a class="base-card__full-link" href="https://kr.linkedin.com/jobs/view/4000000001"></a>
              <h3 class="base-search-card__title">Data Engineer</h3>
              <h4 class="base-search-card__subtitle">Beta</h4>
              <time class="job-search-card__listdate--new">3 days ago</time>
            </div></li>
            <li><div class="base-card job-search-card">
              <a class="base-card__full-link" href="https://kr.linkedin.com/company/acme"></a>
              <h3 class="base-search-card__title">No id</h3>
            </div></li>
        "#;

        let postings = parse_search_results(html, &site(), now);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.source_id, "3812345678");
        assert_eq!(first.title, "Backend Engineer");
        assert_eq!(first.company_name, "Acme Korea");
        assert_eq!(
            first.source_url,
            "https://kr.linkedin.com/jobs/view/backend-engineer-at-acme-3812345678"
        );
        assert_eq!(first.location.as_deref(), Some("Seoul, South Korea"));
        assert_eq!(
            first.posted_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(
            first.company_logo_url.as_deref(),
            Some("https://media.licdn.com/logo.png")
        );

        let second = &postings[1];
        assert_eq!(second.source_id, "4000000001");
        assert_eq!(second.posted_at, Some(now - Duration::days(3)));
    }

    #[test]
    fn test_out_of_range_relative_date_keeps_card() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let html = r#"
            <li><div class="base-card job-search-card">
              <a class="base-card__full-link" href="https://kr.linkedin.com/jobs/view/4000000002"></a>
              <h3 class="base-search-card__title">Site Reliability Engineer</h3>
              <h4 class="base-search-card__subtitle">Gamma</h4>
              <time class="job-search-card__listdate">2 days ago</time>
            </div></li>
            <li><div class="base-card job-search-card">
              <a class="base-card__full-link" href="https://kr.linkedin.com/jobs/view/4000000003"></a>
              <h3 class="base-search-card__title">Frontend Engineer</h3>
              <h4 class="base-search-card__subtitle">Delta</h4>
              <time class="job-search-card__listdate">99999999999 months ago</time>
            </div></li>
        "#;

        let postings = parse_search_results(html, &site(), now);
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].posted_at, Some(now - Duration::days(2)));
        assert_eq!(postings[1].source_id, "4000000003");
        assert_eq!(postings[1].posted_at, None);
    }

    #[test]
    fn test_parse_detail() {
        let html = r#"
            <h1 class="top-card-layout__title">Platform Engineer</h1>
            <a class="topcard__org-name-link">Acme</a>
            <span class="topcard__flavor--bullet">Seongnam</span>
            <div class="show-more-less-html__markup">Build the platform</div>
            <ul>
              <li class="description__job-criteria-item">
                <h3 class="description__job-criteria-subheader">Seniority level</h3>
                <span class="description__job-criteria-text">Mid-Senior level</span>
              </li>
              <li class="description__job-criteria-item">
                <h3 class="description__job-criteria-subheader">Employment type</h3>
                <span class="description__job-criteria-text">Full-time</span>
              </li>
              <li class="description__job-criteria-item">
                <h3 class="description__job-criteria-subheader">Job function</h3>
                <span class="description__job-criteria-text">Engineering</span>
              </li>
            </ul>
        "#;
        let posting = parse_detail(html, "1", "https://www.linkedin.com/jobs/view/1").unwrap();

        assert_eq!(posting.title, "Platform Engineer");
        assert_eq!(posting.company_name, "Acme");
        assert_eq!(posting.location.as_deref(), Some("Seongnam"));
        assert_eq!(posting.description.as_deref(), Some("Build the platform"));
        assert_eq!(posting.experience_level.as_deref(), Some("Mid-Senior level"));
        assert_eq!(posting.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(posting.category.as_deref(), Some("Engineering"));
    }
}
