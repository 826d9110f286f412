//! Blog reader core: REST client, query cache, and view state for the
//! desktop front end in `main.rs`.

pub mod blog_client;
pub mod blog_store;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod query_cache;
pub mod view_state;

#[cfg(test)]
pub(crate) mod testing;

pub use blog_client::{ArticleApi, BlogClient};
pub use blog_store::{BlogData, BlogQueryKey, BlogStore, StoreEvent};
pub use config::AppConfig;
pub use error::{BlogError, Result};
pub use models::{Article, CreateArticleInput};
pub use view_state::{Panel, ViewController, ViewState};
