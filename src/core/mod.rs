pub mod cache;
pub mod dispatcher;
pub mod feed;
pub mod server;
pub mod tags;
pub mod webhook;

pub use cache::{CacheInvalidator, DryRun, Generation, MemoryCache};
pub use dispatcher::{Dispatcher, Invalidation};
pub use feed::{ArticleSource, FeedGenerator, JsonArticleSource};
pub use server::{AppState, Server};
pub use tags::TagTable;
