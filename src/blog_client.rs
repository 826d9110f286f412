use chrono::{SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BlogError, Result};
use crate::models::{Article, CreateArticleInput};

/// The four operations the REST backend offers for articles.
///
/// No retries happen at this layer; the query cache owns retry policy.
pub trait ArticleApi: Send + Sync {
    fn list_articles(&self) -> Result<Vec<Article>>;

    fn get_article(&self, id: &str) -> Result<Article>;

    /// Stamps the publish date and creates the article.
    fn create_article(&self, input: &CreateArticleInput) -> Result<Article>;

    fn delete_article(&self, id: &str) -> Result<()>;
}

// Request body for POST /blogs: the author's fields plus the publish date
#[derive(Serialize)]
struct NewArticleRequest<'a> {
    #[serde(flatten)]
    input: &'a CreateArticleInput,
    date: String,
}

pub struct BlogClient {
    client: Client,
    base_url: String,
}

impl BlogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("blog_reader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlogError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address of an article on the backend, used for share links.
    pub fn article_url(&self, id: &str) -> String {
        format!("{}/blogs/{}", self.base_url, urlencoding::encode(id))
    }

    fn collection_url(&self) -> String {
        format!("{}/blogs", self.base_url)
    }

    // Classify a non-success response; reads the body for context
    fn status_error(response: Response, what: &str, id: Option<&str>) -> BlogError {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        let detail = if body.trim().is_empty() {
            format!("{} failed with status {}", what, status)
        } else {
            format!("{} failed with status {}: {}", what, status, body.trim())
        };

        match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => BlogError::NotFound(id.to_string()),
            _ => BlogError::Transport(detail),
        }
    }
}

impl ArticleApi for BlogClient {
    fn list_articles(&self) -> Result<Vec<Article>> {
        let response = self.client.get(self.collection_url()).send()?;
        if !response.status().is_success() {
            return Err(Self::status_error(response, "listing articles", None));
        }

        let articles: Vec<Article> = response.json()?;
        debug!(count = articles.len(), "loaded articles");
        Ok(articles)
    }

    fn get_article(&self, id: &str) -> Result<Article> {
        let response = self.client.get(self.article_url(id)).send()?;
        if !response.status().is_success() {
            return Err(Self::status_error(response, "loading article", Some(id)));
        }

        Ok(response.json()?)
    }

    fn create_article(&self, input: &CreateArticleInput) -> Result<Article> {
        input.validate()?;

        let request = NewArticleRequest {
            input,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self
            .client
            .post(self.collection_url())
            .json(&request)
            .send()?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().unwrap_or_default();
            return Err(BlogError::Validation(format!(
                "backend rejected article ({}): {}",
                status,
                body.trim()
            )));
        }
        if !status.is_success() {
            return Err(Self::status_error(response, "creating article", None));
        }

        let article: Article = response.json()?;
        info!(id = %article.id, title = %article.title, "created article");
        Ok(article)
    }

    fn delete_article(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.article_url(id)).send()?;
        if !response.status().is_success() {
            return Err(Self::status_error(response, "deleting article", Some(id)));
        }

        info!(%id, "deleted article");
        Ok(())
    }
}
