//! Wanted (원티드) adapter backed by the public `/api/v4/jobs` JSON API

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::crawler::fetcher::FetchClient;
use crate::crawler::headers::HeaderProfile;
use crate::crawler::sources::{fetch_body, site_url};
use crate::crawler::JobCrawler;
use crate::models::{JobPosting, JobSource, SearchFilter};
use crate::parser::parse_timestamp;
use crate::utils::error::{CrawlerError, ParseError};

const SEARCH_PATH: &str = "/api/v4/jobs";

/// Wanted lists almost exclusively full-time positions
const EMPLOYMENT_TYPE: &str = "정규직";

/// Wanted job crawler using the public API
pub struct WantedCrawler {
    fetcher: FetchClient,
    site_url: Url,
}

impl WantedCrawler {
    /// Create the adapter from the `sources.wanted` configuration
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let fetcher =
            FetchClient::for_source(config, JobSource::Wanted)?.with_profile(HeaderProfile::Json);
        let site_url = site_url(&fetcher, JobSource::Wanted)?;
        Ok(Self { fetcher, site_url })
    }
}

#[async_trait]
impl JobCrawler for WantedCrawler {
    fn source(&self) -> JobSource {
        JobSource::Wanted
    }

    async fn search_page(
        &self,
        filter: &SearchFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<JobPosting>, CrawlerError> {
        let params = search_params(filter, page, limit);
        let Some(body) = fetch_body(&self.fetcher, self.source(), SEARCH_PATH, &params).await
        else {
            return Ok(Vec::new());
        };

        match parse_search_results(&body, &self.site_url) {
            Ok(postings) => Ok(postings),
            Err(e) => {
                tracing::warn!(source = "wanted", page, error = %e, "Unparseable search page");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_detail(&self, source_id: &str) -> Result<Option<JobPosting>, CrawlerError> {
        let path = format!("{SEARCH_PATH}/{source_id}");
        let Some(body) = fetch_body(&self.fetcher, self.source(), &path, &[]).await else {
            return Ok(None);
        };

        match parse_detail(&body, source_id, &self.site_url) {
            Ok(posting) => Ok(posting),
            Err(e) => {
                tracing::warn!(source = "wanted", source_id, error = %e, "Unparseable detail page");
                Ok(None)
            }
        }
    }
}

/// Query parameters for one page of search results
pub fn search_params(filter: &SearchFilter, page: u32, limit: u32) -> Vec<(&'static str, String)> {
    let offset = page.saturating_sub(1) * limit;
    let mut params = vec![
        ("country", "kr".to_string()),
        ("job_sort", "job.latest_order".to_string()),
        (
            "locations",
            location_code(filter.location.as_deref()).to_string(),
        ),
        (
            "years",
            experience_years(filter.experience_level.as_deref()).to_string(),
        ),
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
    ];

    if !filter.keyword.is_empty() {
        params.push(("search", filter.keyword.clone()));
    }

    params
}

/// Region slug used by the `locations` parameter
pub fn location_code(location: Option<&str>) -> &'static str {
    match location.map(str::trim) {
        Some("서울") => "seoul.all",
        Some("경기") => "gyeonggi.all",
        Some("인천") => "incheon.all",
        Some("부산") => "busan.all",
        Some("대구") => "daegu.all",
        Some("대전") => "daejeon.all",
        Some("광주") => "gwangju.all",
        _ => "all",
    }
}

/// Years of experience used by the `years` parameter, `-1` for any
pub fn experience_years(level: Option<&str>) -> i32 {
    let Some(level) = level.map(str::trim) else {
        return -1;
    };
    match level {
        "신입" => 0,
        "10년이상" => 10,
        other => other
            .strip_suffix('년')
            .and_then(|n| n.parse::<i32>().ok())
            .filter(|n| (1..=9).contains(n))
            .unwrap_or(-1),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobList {
    #[serde(deserialize_with = "null_as_default")]
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobEnvelope {
    job: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WantedJob {
    id: Option<Value>,
    position: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    company: Company,
    #[serde(deserialize_with = "null_as_default")]
    address: Address,
    #[serde(deserialize_with = "null_as_default")]
    category: Category,
    #[serde(deserialize_with = "null_as_default")]
    skill_tags: Vec<SkillTag>,
    #[serde(deserialize_with = "null_as_default")]
    years: Years,
    #[serde(deserialize_with = "null_as_default")]
    detail: Detail,
    due_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Company {
    name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    logo_img: LogoImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogoImage {
    origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Address {
    full_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Category {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SkillTag {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Years {
    #[serde(deserialize_with = "null_as_default")]
    min: i64,
    #[serde(deserialize_with = "null_as_default")]
    max: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Detail {
    intro: Option<String>,
    requirements: Option<String>,
    benefits: Option<String>,
}

/// Explicit `null` reads as the field's default, like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WantedJob {
    fn id(&self) -> Option<String> {
        match &self.id {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// Human-readable experience requirement from the `years` range
pub fn experience_text(min: i64, max: i64) -> String {
    match (min, max) {
        (0, 0) => "신입".to_string(),
        (0, max) => format!("신입~{max}년"),
        (min, 0 | -1) => format!("{min}년 이상"),
        (min, max) => format!("{min}~{max}년"),
    }
}

/// Parse a `/api/v4/jobs` response body
///
/// Items without an id or position are skipped.
pub fn parse_search_results(body: &str, site_url: &Url) -> Result<Vec<JobPosting>, ParseError> {
    let list: JobList = serde_json::from_str(body)?;

    Ok(list
        .data
        .into_iter()
        .filter_map(|item| match parse_item(item, site_url) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::warn!(source = "wanted", error = %e, "Skipping job item");
                None
            }
        })
        .collect())
}

/// Parse a `/api/v4/jobs/{id}` response body
///
/// Returns `Ok(None)` when the body carries no `job` object.
pub fn parse_detail(
    body: &str,
    source_id: &str,
    site_url: &Url,
) -> Result<Option<JobPosting>, ParseError> {
    let envelope: JobEnvelope = serde_json::from_str(body)?;
    let Some(raw) = envelope.job else {
        return Ok(None);
    };

    let job: WantedJob = serde_json::from_value(raw.clone())?;
    let deadline = job.due_time.as_deref().and_then(|t| parse_timestamp(t).ok());
    let id = job.id().unwrap_or_else(|| source_id.to_string());

    let posting = build_posting(&job, id, site_url)?
        .with_description(job.detail.intro.clone())
        .with_requirements(job.detail.requirements.clone())
        .with_benefits(job.detail.benefits.clone())
        .with_deadline(deadline)
        .with_raw_data(raw);

    Ok(Some(posting))
}

fn parse_item(item: Value, site_url: &Url) -> Result<JobPosting, ParseError> {
    let job: WantedJob = serde_json::from_value(item.clone())?;
    let id = job.id().ok_or(ParseError::MissingField("id"))?;
    Ok(build_posting(&job, id, site_url)?.with_raw_data(item))
}

fn build_posting(job: &WantedJob, id: String, site_url: &Url) -> Result<JobPosting, ParseError> {
    let title = job
        .position
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingField("position"))?;

    let source_url = site_url
        .join(&format!("/wd/{id}"))
        .map(String::from)
        .unwrap_or_else(|_| format!("https://www.wanted.co.kr/wd/{id}"));

    let skills = job
        .skill_tags
        .iter()
        .filter_map(|tag| tag.title.clone())
        .collect();

    Ok(JobPosting::new(
        JobSource::Wanted,
        id,
        title,
        job.company.name.clone().unwrap_or_default(),
        source_url,
    )
    .with_location(job.address.full_location.clone())
    .with_experience_level(Some(experience_text(job.years.min, job.years.max)))
    .with_employment_type(Some(EMPLOYMENT_TYPE.to_string()))
    .with_category(job.category.name.clone())
    .with_skills(skills)
    .with_company_logo_url(job.company.logo_img.origin.clone()))
}
