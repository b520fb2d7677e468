//! JobKorea (잡코리아) adapter scraping the HTML search page

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::json;
use url::Url;

use crate::config::Config;
use crate::crawler::fetcher::FetchClient;
use crate::crawler::sources::{fetch_body, site_url, truncate_page};
use crate::crawler::JobCrawler;
use crate::models::{JobPosting, JobSource, SearchFilter};
use crate::parser::selectors::{parse_selector, selector_chain, SelectorChain};
use crate::parser::{absolute_url, extract_id, label_value_pairs, lookup};
use crate::utils::error::{CrawlerError, ParseError};

const SEARCH_PATH: &str = "/Search";

lazy_static! {
    static ref ITEMS: SelectorChain = selector_chain!(
        ".recruit-info .list-default .list-post",
        ".list-section .list-item",
        ".list-recruit .list-item",
    );
    static ref TITLE_LINK: SelectorChain =
        selector_chain!(".post-list-info .title a", ".info-title a", ".title a");
    static ref COMPANY: SelectorChain =
        selector_chain!(".post-list-corp .name a", ".corp-name a", ".company a");
    static ref LOCATION: SelectorChain =
        selector_chain!(".post-list-info .option span", ".info-local");
    static ref EXPERIENCE: SelectorChain = selector_chain!(".exp", ".career");
    static ref DEADLINE: SelectorChain = selector_chain!(".date", ".deadline");
    static ref EMPLOYMENT_TYPE: SelectorChain = selector_chain!(".option .type", ".employment-type");
    static ref SKILLS: SelectorChain = selector_chain!(".skill-tag", ".keyword-wrap .keyword");

    static ref DETAIL_TITLE: SelectorChain = selector_chain!(".tit", ".title");
    static ref DETAIL_COMPANY: SelectorChain = selector_chain!(".coName a", ".company-name");
    static ref DETAIL_DESCRIPTION: SelectorChain =
        selector_chain!(".tbContentReadDetail", ".job-detail");
    static ref CONDITION_ROWS: SelectorChain = selector_chain!(".tbList tbody tr");
    static ref ROW_LABEL: scraper::Selector = parse_selector!("th");
    static ref ROW_VALUE: scraper::Selector = parse_selector!("td");

    static ref ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"Oem_GI_ID=(\d+)").expect("valid regex"),
        Regex::new(r"/Recruit/GI_Read/(\d+)").expect("valid regex"),
    ];
}

/// JobKorea job crawler using HTML parsing
pub struct JobKoreaCrawler {
    fetcher: FetchClient,
    site_url: Url,
}

impl JobKoreaCrawler {
    /// Create the adapter from the `sources.jobkorea` configuration
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let fetcher = FetchClient::for_source(config, JobSource::JobKorea)?;
        let site_url = site_url(&fetcher, JobSource::JobKorea)?;
        Ok(Self { fetcher, site_url })
    }
}

#[async_trait]
impl JobCrawler for JobKoreaCrawler {
    fn source(&self) -> JobSource {
        JobSource::JobKorea
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
        let path = detail_path(source_id);
        let Some(body) = fetch_body(&self.fetcher, self.source(), &path, &[]).await else {
            return Ok(None);
        };

        let url = absolute_url(&self.site_url, &path);
        match parse_detail(&body, source_id, &url) {
            Ok(posting) => Ok(Some(posting)),
            Err(e) => {
                tracing::warn!(source = "jobkorea", source_id, error = %e, "Unparseable detail page");
                Ok(None)
            }
        }
    }
}

fn detail_path(source_id: &str) -> String {
    format!("/Recruit/GI_Read/{source_id}")
}

/// Query parameters for one page of search results
pub fn search_params(filter: &SearchFilter, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("stext", filter.keyword.clone()),
        ("tabType", "recruit".to_string()),
        ("Page_No", page.to_string()),
    ];

    if let Some(code) = filter.experience_level.as_deref().and_then(career_type) {
        params.push(("careerType", code.to_string()));
    }
    if let Some(code) = filter.location.as_deref().and_then(location_code) {
        params.push(("local", code.to_string()));
    }

    params
}

/// `careerType` code for an experience level
pub fn career_type(level: &str) -> Option<&'static str> {
    match level.trim() {
        "신입" => Some("1"),
        "경력" => Some("2"),
        "신입/경력" => Some("0"),
        _ => None,
    }
}

/// `local` region code for a location
pub fn location_code(location: &str) -> Option<&'static str> {
    match location.trim() {
        "서울" => Some("I000"),
        "경기" => Some("B000"),
        "인천" => Some("I010"),
        "부산" => Some("H000"),
        "대구" => Some("C000"),
        "대전" => Some("D000"),
        "광주" => Some("F000"),
        _ => None,
    }
}

/// Parse the search result page
///
/// Items without a title link or a derivable id are skipped.
pub fn parse_search_results(html: &str, site_url: &Url) -> Vec<JobPosting> {
    let document = Html::parse_document(html);

    ITEMS
        .all(document.root_element())
        .into_iter()
        .filter_map(|item| match parse_item(item, site_url) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::warn!(source = "jobkorea", error = %e, "Failed to parse item");
                None
            }
        })
        .collect()
}

fn parse_item(item: ElementRef<'_>, site_url: &Url) -> Result<JobPosting, ParseError> {
    let link = TITLE_LINK
        .first(item)
        .ok_or(ParseError::MissingField("title"))?;
    let title = crate::parser::element_text(link);
    if title.is_empty() {
        return Err(ParseError::MissingField("title"));
    }

    let href = link.value().attr("href").unwrap_or_default();
    let id = extract_id(href, &ID_PATTERNS)?;

    let deadline_text = DEADLINE.text(item);
    let raw = match &deadline_text {
        Some(text) => json!({ "deadline_text": text }),
        None => serde_json::Value::Null,
    };

    Ok(JobPosting::new(
        JobSource::JobKorea,
        id,
        title,
        COMPANY.text(item).unwrap_or_default(),
        absolute_url(site_url, href),
    )
    .with_location(LOCATION.text(item))
    .with_experience_level(EXPERIENCE.text(item))
    .with_employment_type(EMPLOYMENT_TYPE.text(item))
    .with_skills(SKILLS.texts(item))
    .with_raw_data(raw))
}

/// Parse a `/Recruit/GI_Read/{id}` detail page
pub fn parse_detail(html: &str, source_id: &str, url: &str) -> Result<JobPosting, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = DETAIL_TITLE
        .text(root)
        .ok_or(ParseError::MissingField("title"))?;

    let rows = CONDITION_ROWS.all(root);
    let conditions = label_value_pairs(&rows, &ROW_LABEL, &ROW_VALUE);

    Ok(JobPosting::new(
        JobSource::JobKorea,
        source_id,
        title,
        DETAIL_COMPANY.text(root).unwrap_or_default(),
        url,
    )
    .with_location(lookup(&conditions, &["근무지역"]))
    .with_experience_level(lookup(&conditions, &["경력"]))
    .with_employment_type(lookup(&conditions, &["고용형태"]))
    .with_salary(lookup(&conditions, &["급여"]))
    .with_description(DETAIL_DESCRIPTION.block_text(root))
    .with_raw_data(json!({ "conditions": conditions })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Url {
        Url::parse("https://www.jobkorea.co.kr").unwrap()
    }

    #[test]
    fn test_search_params() {
        let filter = SearchFilter {
            keyword: "rust".to_string(),
            location: Some("대전".to_string()),
            experience_level: Some("신입/경력".to_string()),
        };
        let params = search_params(&filter, 2);
        assert_eq!(
            params,
            vec![
                ("stext", "rust".to_string()),
                ("tabType", "recruit".to_string()),
                ("Page_No", "2".to_string()),
                ("careerType", "0".to_string()),
                ("local", "D000".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_filters_are_ignored() {
        let filter = SearchFilter {
            keyword: "rust".to_string(),
            location: Some("세종".to_string()),
            experience_level: Some("인턴".to_string()),
        };
        assert_eq!(search_params(&filter, 1).len(), 3);
    }

    #[test]
    fn test_fallback_item_selector() {
        let html = r#"
            <div class="list-section">
              <div class="list-item">
                <div class="info-title"><a href="/Recruit/GI_Read/48000001?rPageCode=SL">Rust 서버 개발자</a></div>
                <div class="corp-name"><a>(주)에이비씨</a></div>
                <span class="info-local">서울 강남구</span>
                <span class="career">경력 3년↑</span>
                <span class="deadline">~10/31(금)</span>
                <span class="employment-type">정규직</span>
                <div class="keyword-wrap"><span class="keyword">Rust</span><span class="keyword">AWS</span></div>
              </div>
              <div class="list-item"><span>링크 없음</span></div>
            </div>
        "#;

        let postings = parse_search_results(html, &site());
        assert_eq!(postings.len(), 1);

        let posting = &postings[0];
        assert_eq!(posting.source_id, "48000001");
        assert_eq!(posting.title, "Rust 서버 개발자");
        assert_eq!(posting.company_name, "(주)에이비씨");
        assert_eq!(
            posting.source_url,
            "https://www.jobkorea.co.kr/Recruit/GI_Read/48000001?rPageCode=SL"
        );
        assert_eq!(posting.location.as_deref(), Some("서울 강남구"));
        assert_eq!(posting.experience_level.as_deref(), Some("경력 3년↑"));
        assert_eq!(posting.employment_type.as_deref(), Some("정규직"));
        assert_eq!(posting.skills, vec!["Rust", "AWS"]);
        assert_eq!(posting.raw_data["deadline_text"], "~10/31(금)");
    }

    #[test]
    fn test_no_items() {
        assert!(parse_search_results("<html><body>검색결과 없음</body></html>", &site()).is_empty());
    }

    #[test]
    fn test_parse_detail() {
        let html = r#"
            <h3 class="tit">백엔드 개발자 (Rust)</h3>
            <div class="coName"><a>잡코리아랩스</a></div>
            <div class="tbContentReadDetail"><p>주요업무</p><p>API 설계</p></div>
            <table class="tbList"><tbody>
              <tr><th>근무지역</th><td>서울 구로구</td></tr>
              <tr><th>경력</th><td>경력 5년 이상</td></tr>
              <tr><th>고용형태</th><td>정규직</td></tr>
              <tr><th>급여</th><td>면접 후 결정</td></tr>
            </tbody></table>
        "#;
        let posting = parse_detail(html, "77", "https://www.jobkorea.co.kr/Recruit/GI_Read/77").unwrap();

        assert_eq!(posting.title, "백엔드 개발자 (Rust)");
        assert_eq!(posting.company_name, "잡코리아랩스");
        assert_eq!(posting.location.as_deref(), Some("서울 구로구"));
        assert_eq!(posting.experience_level.as_deref(), Some("경력 5년 이상"));
        assert_eq!(posting.salary.as_deref(), Some("면접 후 결정"));
        assert_eq!(posting.description.as_deref(), Some("주요업무\nAPI 설계"));
        assert_eq!(posting.raw_data["conditions"]["고용형태"], "정규직");
    }

    #[test]
    fn test_detail_without_title() {
        assert!(parse_detail("<p>삭제된 공고</p>", "1", "u").is_err());
    }
}
