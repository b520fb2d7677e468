//! Unified error handling for the jobpulse crate
//!
//! Domain-specific errors live next to the code that raises them
//! ([`crate::utils::error`]); this module folds them into a single [`Error`]
//! used at the public entry points (search, detail lookup, background runs).
//!
//! # Architecture
//!
//! - [`JobPulseErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::utils::error::{CrawlerError, FetchError, ParseError};

/// Common trait for all jobpulse error types
pub trait JobPulseErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Caller input errors (empty keyword, unknown source)
    Input,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get Korean description for the category
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Network => "네트워크 오류",
            Self::Parsing => "파싱 오류",
            Self::Input => "입력 오류",
            Self::Config => "설정 오류",
            Self::Other => "기타 오류",
        }
    }
}

/// Unified error type for the jobpulse crate
#[derive(Error, Debug)]
pub enum Error {
    /// Crawler-related errors (adapter construction, unknown source)
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Rejected caller input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl JobPulseErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Crawler(e) => e.is_recoverable(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(_) => false,
            Self::InvalidQuery(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Crawler(CrawlerError::UnknownSource(_)) => ErrorCategory::Input,
            Self::Crawler(CrawlerError::Config { .. }) => ErrorCategory::Config,
            Self::Crawler(CrawlerError::Parse(_)) => ErrorCategory::Parsing,
            Self::Crawler(_) | Self::Fetch(_) => ErrorCategory::Network,
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::InvalidQuery(_) => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
