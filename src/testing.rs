//! In-memory [`ArticleApi`] used by the store tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::blog_client::ArticleApi;
use crate::error::{BlogError, Result};
use crate::models::{Article, CreateArticleInput};

#[derive(Default)]
pub struct InMemoryApi {
    articles: Mutex<Vec<Article>>,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_deletes: AtomicBool,
    create_gate: Mutex<Option<Receiver<()>>>,
}

impl InMemoryApi {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        let api = Self::default();
        api.next_id.store(articles.len() + 1, Ordering::SeqCst);
        *api.articles.lock().unwrap() = articles;
        api
    }

    /// Makes the next create block until a value is sent on the returned
    /// sender.
    pub fn hold_creates(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.create_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn article(id: &str, title: &str, category: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        categories: vec![category.to_string()],
        description: format!("About {}", title),
        date: "2024-01-05T10:00:00.000Z".to_string(),
        cover_image: String::new(),
        content: format!("{}\n\nBody of the article.", title),
    }
}

impl ArticleApi for InMemoryApi {
    fn list_articles(&self) -> Result<Vec<Article>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles.lock().unwrap().clone())
    }

    fn get_article(&self, id: &str) -> Result<Article> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|article| article.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(id.to_string()))
    }

    fn create_article(&self, input: &CreateArticleInput) -> Result<Article> {
        input.validate()?;
        if let Some(gate) = self.create_gate.lock().unwrap().take() {
            let _ = gate.recv();
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let created = Article {
            id,
            title: input.title.clone(),
            categories: input.categories.clone(),
            description: input.description.clone(),
            date: "2024-03-01T12:00:00.000Z".to_string(),
            cover_image: input.cover_image.clone(),
            content: input.content.clone(),
        };
        self.articles.lock().unwrap().push(created.clone());
        Ok(created)
    }

    fn delete_article(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlogError::Transport("backend unavailable".to_string()));
        }

        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|article| article.id != id);
        if articles.len() == before {
            return Err(BlogError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
