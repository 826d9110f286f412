//! Article queries and writes on top of the query cache.
//!
//! The store owns the list subscription, follows the selected article with a
//! detail subscription, and runs creates and deletes in the background. When
//! a write finishes, [`BlogStore::poll`] applies its cache effects and reports
//! a [`StoreEvent`] so the caller can move the view along.

use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::blog_client::ArticleApi;
use crate::error::{BlogError, Result};
use crate::models::{Article, CreateArticleInput};
use crate::mutation::Mutation;
use crate::query_cache::{CacheEffect, QueryCache, QueryOptions, QueryState, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlogQueryKey {
    Articles,
    Article(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogData {
    Articles(Vec<Article>),
    Article(Article),
}

impl BlogData {
    pub fn as_articles(&self) -> Option<&[Article]> {
        match self {
            BlogData::Articles(articles) => Some(articles),
            BlogData::Article(_) => None,
        }
    }

    pub fn as_article(&self) -> Option<&Article> {
        match self {
            BlogData::Article(article) => Some(article),
            BlogData::Articles(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created(Article),
    CreateFailed(BlogError),
    Deleted(String),
    DeleteFailed { id: String, error: BlogError },
}

pub struct BlogStore {
    api: Arc<dyn ArticleApi>,
    cache: QueryCache<BlogQueryKey, BlogData>,
    notifier: Option<Rc<dyn Fn()>>,
    list: Option<Subscription<BlogQueryKey>>,
    detail: Option<Subscription<BlogQueryKey>>,
    create: Mutation<Article>,
    delete: Mutation<String>,
    deleting: Option<String>,
}

impl BlogStore {
    pub fn new(api: Arc<dyn ArticleApi>, options: QueryOptions) -> Self {
        Self {
            api,
            cache: QueryCache::new(options),
            notifier: None,
            list: None,
            detail: None,
            create: Mutation::new(),
            delete: Mutation::new(),
            deleting: None,
        }
    }

    /// Called whenever an observed query changes; the UI uses it to repaint.
    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.notifier = Some(Rc::new(notifier));
        self
    }

    pub fn cache(&self) -> &QueryCache<BlogQueryKey, BlogData> {
        &self.cache
    }

    fn subscribe(&mut self, key: BlogQueryKey) -> Subscription<BlogQueryKey> {
        let api = self.api.clone();
        let fetch_key = key.clone();
        let fetch = move || match &fetch_key {
            BlogQueryKey::Articles => api.list_articles().map(BlogData::Articles),
            BlogQueryKey::Article(id) => api.get_article(id).map(BlogData::Article),
        };

        let notifier = self.notifier.clone();
        let log_key = key.clone();
        let listener = move |state: &QueryState<BlogData>| {
            debug!(key = ?log_key, status = ?state.status, fetching = state.is_fetching, "query changed");
            if let Some(notify) = &notifier {
                notify();
            }
        };

        let options = self.cache.defaults();
        self.cache.subscribe_with(key, options, fetch, listener)
    }

    /// Keeps the article list subscribed.
    pub fn watch_articles(&mut self) {
        if self.list.is_none() {
            self.list = Some(self.subscribe(BlogQueryKey::Articles));
        }
    }

    /// Points the detail subscription at `id`, dropping the previous one.
    /// With no id there is no detail query at all.
    pub fn watch_article(&mut self, id: Option<&str>) {
        let wanted = id.map(|id| BlogQueryKey::Article(id.to_string()));
        let current = self.detail.as_ref().map(|subscription| subscription.key());
        if current == wanted.as_ref() {
            return;
        }

        if let Some(previous) = self.detail.take() {
            self.cache.unsubscribe(&previous);
        }
        if let Some(key) = wanted {
            self.detail = Some(self.subscribe(key));
        }
    }

    /// Forces the list to be fetched again.
    pub fn refresh_articles(&mut self) {
        self.cache.invalidate(&BlogQueryKey::Articles);
    }

    pub fn articles(&self) -> QueryState<BlogData> {
        self.cache.state(&BlogQueryKey::Articles)
    }

    pub fn article(&self, id: &str) -> QueryState<BlogData> {
        self.cache.state(&BlogQueryKey::Article(id.to_string()))
    }

    /// Validates `input` and starts publishing it. Invalid input is rejected
    /// here without any request being made. Returns `Ok(false)`, leaving
    /// `input` unsent, while another create is running.
    pub fn create_article(&mut self, input: CreateArticleInput) -> Result<bool> {
        input.validate()?;

        let api = self.api.clone();
        let started = self.create.start(move || api.create_article(&input));
        if !started {
            debug!("create already in progress");
        }
        Ok(started)
    }

    /// Starts deleting `id`. Returns false while another delete is running.
    pub fn delete_article(&mut self, id: &str) -> bool {
        let api = self.api.clone();
        let target = id.to_string();
        let started = self
            .delete
            .start(move || api.delete_article(&target).map(|()| target));
        if started {
            self.deleting = Some(id.to_string());
        }
        started
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.delete.is_pending()
    }

    pub fn create_error(&self) -> Option<&BlogError> {
        self.create.error()
    }

    pub fn delete_error(&self) -> Option<&BlogError> {
        self.delete.error()
    }

    pub fn clear_create_error(&mut self) {
        if !self.create.is_pending() {
            self.create.reset();
        }
    }

    /// True while a query or a write is outstanding.
    pub fn is_busy(&self) -> bool {
        self.cache.is_fetching() || self.create.is_pending() || self.delete.is_pending()
    }

    /// Applies finished fetches and writes. Returns one event per finished write.
    pub fn poll(&mut self) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        self.cache.poll();

        if let Some(result) = self.create.poll() {
            match result {
                Ok(article) => {
                    self.cache
                        .apply_effects([CacheEffect::Invalidate(BlogQueryKey::Articles)]);
                    events.push(StoreEvent::Created(article));
                }
                Err(error) => {
                    warn!(%error, "create failed");
                    events.push(StoreEvent::CreateFailed(error));
                }
            }
        }

        if let Some(result) = self.delete.poll() {
            let target = self.deleting.take().unwrap_or_default();
            match result {
                Ok(id) => {
                    self.cache.apply_effects([
                        CacheEffect::Remove(BlogQueryKey::Article(id.clone())),
                        CacheEffect::Invalidate(BlogQueryKey::Articles),
                    ]);
                    // A removed key can still be watched; resubscribe on next watch
                    if self.detail.as_ref().map(|s| s.key())
                        == Some(&BlogQueryKey::Article(id.clone()))
                    {
                        self.detail = None;
                    }
                    events.push(StoreEvent::Deleted(id));
                }
                Err(error) => {
                    warn!(id = %target, %error, "delete failed");
                    events.push(StoreEvent::DeleteFailed { id: target, error });
                }
            }
        }

        events
    }

    /// Polls until nothing is outstanding or `timeout` elapses, collecting
    /// the events produced along the way.
    pub fn settle(&mut self, timeout: Duration) -> Vec<StoreEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll();
        while self.is_busy() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.cache
                .poll_blocking((deadline - now).min(Duration::from_millis(10)));
            events.extend(self.poll());
        }
        events
    }
}
