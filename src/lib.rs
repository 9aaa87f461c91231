pub mod cli;
pub mod core;
pub mod error;
pub mod i18n;
pub mod models;

// Re-export commonly used types and traits
pub use crate::core::{CacheInvalidator, Dispatcher, MemoryCache, TagTable};
pub use crate::error::{InvalidationError, RevalidateError, ValidationError};
pub use crate::models::{CacheTag, ChangeNotification, Config, EntityType, Localization};
