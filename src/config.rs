use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::query_cache::QueryOptions;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Cache policy for the list and detail queries.
    pub query: QueryOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            query: QueryOptions::default(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file from the working directory if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("BLOG_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);

        let request_timeout = parse_var(&lookup, "BLOG_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let query = QueryOptions {
            stale_time: parse_var(&lookup, "BLOG_STALE_TIME_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.query.stale_time),
            gc_time: parse_var(&lookup, "BLOG_GC_TIME_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.query.gc_time),
            retry: parse_var(&lookup, "BLOG_QUERY_RETRY")?.unwrap_or(defaults.query.retry),
            retry_delay: parse_var(&lookup, "BLOG_RETRY_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.query.retry_delay),
        };

        Ok(Self {
            api_base_url,
            request_timeout,
            query,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        _ => Ok(None),
    }
}
