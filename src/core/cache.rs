use chrono::{DateTime, Utc};
use colored::Colorize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::InvalidationError;
use crate::models::CacheTag;

/// 缓存失效后端
///
/// 两个操作都是幂等的；返回错误时调用方不重试。
pub trait CacheInvalidator: Send + Sync {
    /// 使单个站点路径的缓存失效
    fn invalidate_path(&self, path: &str) -> Result<(), InvalidationError>;

    /// 使带有该标签的所有缓存失效
    fn invalidate_tag(&self, tag: CacheTag) -> Result<(), InvalidationError>;
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CachedPage {
    /// 响应内容
    pub body: String,
    /// Content-Type
    pub content_type: &'static str,
    /// 关联的缓存标签
    pub tags: HashSet<CacheTag>,
    /// 写入时间
    pub stored_at: DateTime<Utc>,
}

/// 失效代数快照
///
/// 在读取数据源之前取得，写入缓存时与当前代数比较；期间发生过失效则不写入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    path: u64,
    tags: Vec<(CacheTag, u64)>,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, CachedPage>,
    path_generations: HashMap<String, u64>,
    tag_generations: HashMap<CacheTag, u64>,
}

impl Store {
    fn generation(&self, path: &str, tags: &[CacheTag]) -> Generation {
        Generation {
            path: self.path_generations.get(path).copied().unwrap_or(0),
            tags: tags
                .iter()
                .map(|tag| (*tag, self.tag_generations.get(tag).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

/// 进程内缓存
#[derive(Debug, Default)]
pub struct MemoryCache {
    store: RwLock<Store>,
}

fn page(body: String, content_type: &'static str, tags: &[CacheTag]) -> CachedPage {
    CachedPage {
        body,
        content_type,
        tags: tags.iter().copied().collect(),
        stored_at: Utc::now(),
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入缓存
    pub fn insert(
        &self,
        path: &str,
        body: String,
        content_type: &'static str,
        tags: &[CacheTag],
    ) -> Result<(), InvalidationError> {
        let mut store = self.store.write().map_err(|e| InvalidationError::Path {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        store.entries.insert(path.to_string(), page(body, content_type, tags));
        Ok(())
    }

    /// 当前的失效代数
    pub fn generation(&self, path: &str, tags: &[CacheTag]) -> Result<Generation, InvalidationError> {
        let store = self.store.read().map_err(|e| InvalidationError::Path {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(store.generation(path, tags))
    }

    /// 仅当 `seen` 之后没有发生失效时写入，返回是否写入
    pub fn insert_if_current(
        &self,
        path: &str,
        body: String,
        content_type: &'static str,
        tags: &[CacheTag],
        seen: &Generation,
    ) -> Result<bool, InvalidationError> {
        let mut store = self.store.write().map_err(|e| InvalidationError::Path {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if store.generation(path, tags) != *seen {
            debug!("Skipped caching {}, invalidated while building", path);
            return Ok(false);
        }
        store.entries.insert(path.to_string(), page(body, content_type, tags));
        Ok(true)
    }

    /// 读取缓存；锁中毒时视为未命中
    pub fn get(&self, path: &str) -> Option<CachedPage> {
        self.store.read().ok()?.entries.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheInvalidator for MemoryCache {
    fn invalidate_path(&self, path: &str) -> Result<(), InvalidationError> {
        let mut store = self.store.write().map_err(|e| InvalidationError::Path {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        *store.path_generations.entry(path.to_string()).or_insert(0) += 1;
        if store.entries.remove(path).is_some() {
            debug!("Evicted cached path {}", path);
        }
        Ok(())
    }

    fn invalidate_tag(&self, tag: CacheTag) -> Result<(), InvalidationError> {
        let mut store = self.store.write().map_err(|e| InvalidationError::Tag {
            tag: tag.to_string(),
            message: e.to_string(),
        })?;
        *store.tag_generations.entry(tag).or_insert(0) += 1;
        let before = store.entries.len();
        store.entries.retain(|_, page| !page.tags.contains(&tag));
        debug!("Evicted {} cached entries tagged {}", before - store.entries.len(), tag);
        Ok(())
    }
}

/// 只打印、不执行的失效后端，用于命令行预演
#[derive(Debug, Default)]
pub struct DryRun {
    actions: Mutex<Vec<String>>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的操作
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, action: String) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }
}

impl CacheInvalidator for DryRun {
    fn invalidate_path(&self, path: &str) -> Result<(), InvalidationError> {
        println!("  {} {}", "path".bright_green(), path);
        self.record(format!("path {}", path));
        Ok(())
    }

    fn invalidate_tag(&self, tag: CacheTag) -> Result<(), InvalidationError> {
        println!("  {} {}", "tag ".bright_cyan(), tag);
        self.record(format!("tag {}", tag));
        Ok(())
    }
}
