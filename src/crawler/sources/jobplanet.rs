//! JobPlanet (잡플래닛) adapter scraping the HTML job search

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use url::Url;

use crate::config::Config;
use crate::crawler::fetcher::FetchClient;
use crate::crawler::sources::{fetch_body, site_url, truncate_page};
use crate::crawler::JobCrawler;
use crate::models::{JobPosting, JobSource, SearchFilter};
use crate::parser::selectors::{parse_selector, selector_chain, SelectorChain};
use crate::parser::{absolute_url, element_text, extract_id, label_value_pairs, lookup};
use crate::utils::error::{CrawlerError, ParseError};

const SEARCH_PATH: &str = "/job";

lazy_static! {
    static ref ITEMS: SelectorChain =
        selector_chain!(".job-list-item", ".recruit-item", ".position-item");
    static ref TITLE_LINK: SelectorChain =
        selector_chain!(".position-title a", ".job-title a", "h3 a", "a");
    static ref COMPANY: SelectorChain =
        selector_chain!(".company-name", ".corp-name", ".company a");
    static ref LOCATION: SelectorChain = selector_chain!(".location", ".area");
    static ref CAREER: SelectorChain = selector_chain!(".career", ".experience");
    static ref SKILLS: SelectorChain = selector_chain!(".skill-tag", ".tag");
    static ref LOGO: SelectorChain = selector_chain!(".company-logo img", ".logo img");

    static ref DETAIL_TITLE: SelectorChain = selector_chain!(".position-title", "h1");
    static ref DETAIL_COMPANY: SelectorChain = selector_chain!(".company-name", ".corp-name");
    static ref DETAIL_DESCRIPTION: SelectorChain =
        selector_chain!(".job-description", ".description");
    static ref DETAIL_REQUIREMENTS: SelectorChain =
        selector_chain!(".requirements", ".qualification");
    static ref DETAIL_BENEFITS: SelectorChain = selector_chain!(".benefits", ".welfare");
    static ref INFO_ROWS: SelectorChain = selector_chain!(".info-table tr", ".detail-info li");
    static ref INFO_LABEL: Selector = parse_selector!("th, .label");
    static ref INFO_VALUE: Selector = parse_selector!("td, .value");
    static ref DETAIL_SKILLS: SelectorChain = selector_chain!(".skill-tag", ".tech-stack span");

    static ref ID_PATTERNS: Vec<Regex> = vec![Regex::new(r"/job/(\d+)").expect("valid regex")];
}

/// JobPlanet job crawler using HTML parsing
pub struct JobPlanetCrawler {
    fetcher: FetchClient,
    site_url: Url,
}

impl JobPlanetCrawler {
    /// Create the adapter from the `sources.jobplanet` configuration
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let fetcher = FetchClient::for_source(config, JobSource::JobPlanet)?;
        let site_url = site_url(&fetcher, JobSource::JobPlanet)?;
        Ok(Self { fetcher, site_url })
    }
}

#[async_trait]
impl JobCrawler for JobPlanetCrawler {
    fn source(&self) -> JobSource {
        JobSource::JobPlanet
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
            parse_search_results(&body, &self.site_url),
            limit,
        ))
    }

    async fn fetch_detail(&self, source_id: &str) -> Result<Option<JobPosting>, CrawlerError> {
        let path = format!("{SEARCH_PATH}/{source_id}");
        let Some(body) = fetch_body(&self.fetcher, self.source(), &path, &[]).await else {
            return Ok(None);
        };

        let url = absolute_url(&self.site_url, &path);
        match parse_detail(&body, source_id, &url) {
            Ok(posting) => Ok(Some(posting)),
            Err(e) => {
                tracing::warn!(source = "jobplanet", source_id, error = %e, "Unparseable detail page");
                Ok(None)
            }
        }
    }
}

/// Query parameters for one page of search results
pub fn search_params(filter: &SearchFilter, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", filter.keyword.clone()), ("page", page.to_string())];

    if let Some(slug) = filter.location.as_deref().and_then(location_slug) {
        params.push(("loc", slug.to_string()));
    }
    if let Some(value) = filter.experience_level.as_deref().and_then(career) {
        params.push(("career", value.to_string()));
    }

    params
}

/// English region slug for the `loc` parameter
pub fn location_slug(location: &str) -> Option<&'static str> {
    match location.trim() {
        "서울" => Some("seoul"),
        "경기" => Some("gyeonggi"),
        "인천" => Some("incheon"),
        "부산" => Some("busan"),
        "대구" => Some("daegu"),
        "대전" => Some("daejeon"),
        "광주" => Some("gwangju"),
        _ => None,
    }
}

/// `career` value: entry-level wins when both words appear
pub fn career(level: &str) -> Option<&'static str> {
    if level.contains("신입") {
        Some("entry")
    } else if level.contains("경력") {
        Some("experienced")
    } else {
        None
    }
}

/// Parse the search result page
pub fn parse_search_results(html: &str, site_url: &Url) -> Vec<JobPosting> {
    let document = Html::parse_document(html);

    ITEMS
        .all(document.root_element())
        .into_iter()
        .filter_map(|item| match parse_item(item, site_url) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::warn!(source = "jobplanet", error = %e, "Failed to parse item");
                None
            }
        })
        .collect()
}

fn parse_item(item: ElementRef<'_>, site_url: &Url) -> Result<JobPosting, ParseError> {
    let link = TITLE_LINK
        .first(item)
        .ok_or(ParseError::MissingField("title"))?;
    let title = element_text(link);
    if title.is_empty() {
        return Err(ParseError::MissingField("title"));
    }

    let href = link.value().attr("href").unwrap_or_default();
    let id = extract_id(href, &ID_PATTERNS)?;
    let logo = LOGO.attr(item, "src").map(|src| absolute_url(site_url, &src));

    Ok(JobPosting::new(
        JobSource::JobPlanet,
        id,
        title,
        COMPANY.text(item).unwrap_or_default(),
        absolute_url(site_url, href),
    )
    .with_location(LOCATION.text(item))
    .with_experience_level(CAREER.text(item))
    .with_skills(SKILLS.texts(item))
    .with_company_logo_url(logo))
}

/// Parse a `/job/{id}` detail page
pub fn parse_detail(html: &str, source_id: &str, url: &str) -> Result<JobPosting, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = DETAIL_TITLE
        .text(root)
        .ok_or(ParseError::MissingField("title"))?;

    let rows = INFO_ROWS.all(root);
    let info = label_value_pairs(&rows, &INFO_LABEL, &INFO_VALUE);

    Ok(JobPosting::new(
        JobSource::JobPlanet,
        source_id,
        title,
        DETAIL_COMPANY.text(root).unwrap_or_default(),
        url,
    )
    .with_location(lookup(&info, &["근무지역", "위치"]))
    .with_experience_level(lookup(&info, &["경력"]))
    .with_employment_type(lookup(&info, &["고용형태"]))
    .with_salary(lookup(&info, &["급여", "연봉"]))
    .with_description(DETAIL_DESCRIPTION.block_text(root))
    .with_requirements(DETAIL_REQUIREMENTS.block_text(root))
    .with_benefits(DETAIL_BENEFITS.block_text(root))
    .with_skills(DETAIL_SKILLS.texts(root))
    .with_raw_data(json!({ "info": info })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Url {
        Url::parse("https://www.jobplanet.co.kr").unwrap()
    }

    #[test]
    fn test_search_params() {
        let filter = SearchFilter {
            keyword: "데이터".to_string(),
            location: Some("경기".to_string()),
            experience_level: Some("경력 3년".to_string()),
        };
        assert_eq!(
            search_params(&filter, 4),
            vec![
                ("q", "데이터".to_string()),
                ("page", "4".to_string()),
                ("loc", "gyeonggi".to_string()),
                ("career", "experienced".to_string()),
            ]
        );
    }

    #[test]
    fn test_career_mapping() {
        assert_eq!(career("신입/경력"), Some("entry"));
        assert_eq!(career("경력무관"), Some("experienced"));
        assert_eq!(career("인턴"), None);
        assert_eq!(location_slug("제주"), None);
    }

    #[test]
    fn test_parse_items() {
        let html = r#"
            <ul>
              <li class="recruit-item">
                <h3><a href="/job/9001">플랫폼 엔지니어</a></h3>
                <span class="corp-name">잡플래닛</span>
                <span class="area">서울 강남구</span>
                <span class="experience">경력 2~5년</span>
                <span class="tag">Kubernetes</span><span class="tag">Go</span>
                <div class="logo"><img src="/logos/9001.png"></div>
              </li>
              <li class="recruit-item"><a href="/company/reviews">리뷰 보기</a></li>
            </ul>
        "#;

        let postings = parse_search_results(html, &site());
        assert_eq!(postings.len(), 1);

        let posting = &postings[0];
        assert_eq!(posting.source_id, "9001");
        assert_eq!(posting.title, "플랫폼 엔지니어");
        assert_eq!(posting.company_name, "잡플래닛");
        assert_eq!(posting.source_url, "https://www.jobplanet.co.kr/job/9001");
        assert_eq!(posting.location.as_deref(), Some("서울 강남구"));
        assert_eq!(posting.experience_level.as_deref(), Some("경력 2~5년"));
        assert_eq!(posting.skills, vec!["Kubernetes", "Go"]);
        assert_eq!(
            posting.company_logo_url.as_deref(),
            Some("https://www.jobplanet.co.kr/logos/9001.png")
        );
    }

    #[test]
    fn test_parse_detail_with_list_info() {
        let html = r#"
            <h1>ML 엔지니어</h1>
            <div class="company-name">플래닛AI</div>
            <div class="description">모델 서빙</div>
            <div class="qualification">Python 3년 이상</div>
            <div class="welfare">재택근무</div>
            <ul class="detail-info">
              <li><span class="label">위치</span><span class="value">판교</span></li>
              <li><span class="label">연봉</span><span class="value">6000만원</span></li>
            </ul>
            <div class="tech-stack"><span>PyTorch</span><span>Rust</span></div>
        "#;
        let posting = parse_detail(html, "42", "https://www.jobplanet.co.kr/job/42").unwrap();

        assert_eq!(posting.title, "ML 엔지니어");
        assert_eq!(posting.company_name, "플래닛AI");
        assert_eq!(posting.location.as_deref(), Some("판교"));
        assert_eq!(posting.salary.as_deref(), Some("6000만원"));
        assert_eq!(posting.requirements.as_deref(), Some("Python 3년 이상"));
        assert_eq!(posting.benefits.as_deref(), Some("재택근무"));
        assert_eq!(posting.skills, vec!["PyTorch", "Rust"]);
        assert_eq!(posting.employment_type, None);
    }
}
