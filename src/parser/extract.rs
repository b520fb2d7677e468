//! Field extraction helpers shared by the HTML adapters

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::utils::error::ParseError;

/// Maximum length of the digits-only id fallback
const FALLBACK_ID_LEN: usize = 10;

static RELATIVE_DATE_PATTERNS: LazyLock<Vec<(Regex, RelativeUnit)>> = LazyLock::new(|| {
    [
        (r"(\d+)\s*분\s*전", RelativeUnit::Minutes),
        (r"(\d+)\s*시간\s*전", RelativeUnit::Hours),
        (r"(\d+)\s*일\s*전", RelativeUnit::Days),
        (r"(\d+)\s*주\s*전", RelativeUnit::Weeks),
        (r"(\d+)\s*개월\s*전", RelativeUnit::Months),
        (r"(\d+)\s*minute", RelativeUnit::Minutes),
        (r"(\d+)\s*hour", RelativeUnit::Hours),
        (r"(\d+)\s*day", RelativeUnit::Days),
        (r"(\d+)\s*week", RelativeUnit::Weeks),
        (r"(\d+)\s*month", RelativeUnit::Months),
    ]
    .into_iter()
    .map(|(pattern, unit)| (Regex::new(pattern).expect("valid regex"), unit))
    .collect()
});

#[derive(Debug, Clone, Copy)]
enum RelativeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl RelativeUnit {
    /// `None` when the amount does not fit in a `TimeDelta`
    fn duration(self, amount: i64) -> Option<TimeDelta> {
        match self {
            Self::Minutes => TimeDelta::try_minutes(amount),
            Self::Hours => TimeDelta::try_hours(amount),
            Self::Days => TimeDelta::try_days(amount),
            Self::Weeks => TimeDelta::try_weeks(amount),
            // A month counts as 30 days
            Self::Months => TimeDelta::try_days(amount.checked_mul(30)?),
        }
    }
}

/// Extract a posting id from a link
///
/// The patterns are tried in order and the first capture group wins. When
/// none match, the digits of the link (at most 10) are used instead.
///
/// # Examples
///
/// ```
/// use regex::Regex;
/// use jobpulse::parser::extract::extract_id;
///
/// let patterns = [Regex::new(r"/Recruit/GI_Read/(\d+)").unwrap()];
/// assert_eq!(extract_id("/Recruit/GI_Read/4567?rPageCode=SL", &patterns).unwrap(), "4567");
/// ```
pub fn extract_id(href: &str, patterns: &[Regex]) -> Result<String, ParseError> {
    if let Some(id) = match_id(href, patterns) {
        return Ok(id);
    }

    let digits: String = href
        .chars()
        .filter(char::is_ascii_digit)
        .take(FALLBACK_ID_LEN)
        .collect();

    if digits.is_empty() {
        Err(ParseError::IdExtractionFailed(href.to_string()))
    } else {
        Ok(digits)
    }
}

/// Extract a posting id using only the patterns, without a fallback
pub fn match_id(href: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Resolve a possibly relative link against the site base URL
pub fn absolute_url(base: &Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| format!("{}{}", base.as_str().trim_end_matches('/'), href))
}

/// Drop the query string and fragment of a URL
pub fn strip_query(href: &str) -> String {
    href.split(['?', '#']).next().unwrap_or(href).to_string()
}

/// Parse an RFC 3339 timestamp, also accepting a missing offset as UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(ParseError::InvalidDate(value.to_string()))
}

/// Parse relative posting dates such as "3일 전" or "2 weeks ago"
///
/// Amounts too large to represent yield `None`.
pub fn parse_relative_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.to_lowercase();
    let (re, unit) = RELATIVE_DATE_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(&text))?;
    let amount: i64 = re.captures(&text)?.get(1)?.as_str().parse().ok()?;
    now.checked_sub_signed(unit.duration(amount)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn jobkorea_patterns() -> Vec<Regex> {
        vec![
            Regex::new(r"Oem_GI_ID=(\d+)").unwrap(),
            Regex::new(r"/Recruit/GI_Read/(\d+)").unwrap(),
        ]
    }

    #[test]
    fn test_extract_id_pattern_order() {
        let patterns = jobkorea_patterns();
        assert_eq!(
            extract_id("/Recruit/GI_Read/48123456?Oem_GI_ID=99", &patterns).unwrap(),
            "99"
        );
        assert_eq!(
            extract_id("/Recruit/GI_Read/48123456", &patterns).unwrap(),
            "48123456"
        );
    }

    #[test]
    fn test_extract_id_digit_fallback() {
        let patterns = jobkorea_patterns();
        assert_eq!(
            extract_id("/Recruit/Other?a=12&b=345678901234", &patterns).unwrap(),
            "1234567890"
        );
        assert!(matches!(
            extract_id("/Recruit/Other", &patterns),
            Err(ParseError::IdExtractionFailed(_))
        ));
    }

    #[test]
    fn test_absolute_url() {
        let base = Url::parse("https://www.jobkorea.co.kr").unwrap();
        assert_eq!(
            absolute_url(&base, "/Recruit/GI_Read/1"),
            "https://www.jobkorea.co.kr/Recruit/GI_Read/1"
        );
        assert_eq!(absolute_url(&base, "https://x.kr/1"), "https://x.kr/1");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://kr.linkedin.com/jobs/view/123?refId=abc&trk=x"),
            "https://kr.linkedin.com/jobs/view/123"
        );
        assert_eq!(strip_query("https://a.b/c"), "https://a.b/c");
    }

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2026-03-31T23:59:59+09:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 31, 14, 59, 59).unwrap());
        assert!(parse_timestamp("2026-03-31").is_ok());
        assert!(parse_timestamp("2026-03-31T10:00:00").is_ok());
        assert!(parse_timestamp("다음주").is_err());
    }

    #[test]
    fn test_parse_relative_date() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(
            parse_relative_date("3일 전", now),
            Some(now - Duration::days(3))
        );
        assert_eq!(
            parse_relative_date("2 Weeks ago", now),
            Some(now - Duration::weeks(2))
        );
        assert_eq!(
            parse_relative_date("1개월 전", now),
            Some(now - Duration::days(30))
        );
        assert_eq!(
            parse_relative_date("5 hours ago", now),
            Some(now - Duration::hours(5))
        );
        assert_eq!(parse_relative_date("방금", now), None);
    }

    #[test]
    fn test_parse_relative_date_out_of_range() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(parse_relative_date("99999999999 months ago", now), None);
        assert_eq!(parse_relative_date("9999999999999 weeks ago", now), None);
        assert_eq!(parse_relative_date("99999999999999999999 days ago", now), None);
        assert_eq!(parse_relative_date("400000000개월 전", now), None);
    }
}
