pub mod config;
pub mod types;

pub use config::{Config, Env};
pub use types::{CacheTag, ChangeNotification, EntityType, FeedArticle, Localization};
