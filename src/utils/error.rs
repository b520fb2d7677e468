//! Error types for the jobpulse crawlers
//!
//! This module defines the error types raised while fetching, parsing and
//! crawling a single listing source.

use thiserror::Error;

use crate::models::JobSource;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport error (connect, reset, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-retriable HTTP status (4xx other than 429)
    #[error("HTTP status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether retrying the same request could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout)
    }
}

/// Errors that can occur while extracting postings from a payload
#[derive(Error, Debug)]
pub enum ParseError {
    /// A required field was missing from a listing item
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// No source id could be derived for an item
    #[error("Failed to extract posting id from {0}")]
    IdExtractionFailed(String),

    /// JSON payload did not have the expected shape
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Invalid date value
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Adapter-level crawler errors
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// No adapter is registered for the source
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Adapter could not be configured
    #[error("Invalid crawler configuration for {job_source}: {reason}")]
    Config {
        job_source: JobSource,
        reason: String,
    },

    /// Source refused or failed the whole crawl
    #[error("Source {0} unavailable: {1}")]
    Unavailable(JobSource, String),
}

impl CrawlerError {
    /// Whether the crawl could succeed on a later attempt
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Unavailable(..) => true,
            Self::Parse(_) | Self::UnknownSource(_) | Self::Config { .. } => false,
        }
    }
}
