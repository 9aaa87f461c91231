use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CMS 中的内容模型类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityType {
    Article,
    Navigation,
    Footer,
    Page,
    Homepage,
    Category,
    Author,
    Singleton,
    GlobalTranslations,
}

impl EntityType {
    /// 所有内容类型
    pub const ALL: [EntityType; 9] = [
        EntityType::Article,
        EntityType::Navigation,
        EntityType::Footer,
        EntityType::Page,
        EntityType::Homepage,
        EntityType::Category,
        EntityType::Author,
        EntityType::Singleton,
        EntityType::GlobalTranslations,
    ];

    /// CMS 中的 `__typename`
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Article => "Article",
            EntityType::Navigation => "Navigation",
            EntityType::Footer => "Footer",
            EntityType::Page => "Page",
            EntityType::Homepage => "Homepage",
            EntityType::Category => "Category",
            EntityType::Author => "Author",
            EntityType::Singleton => "Singleton",
            EntityType::GlobalTranslations => "GlobalTranslations",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文章的一个语言版本
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Localization {
    /// CMS 语言代码（可能带地区，例如 en_US）
    pub locale: String,
    /// 该语言下的文章别名
    pub slug: String,
}

/// 一次内容变更通知
///
/// 按 `__typename` 区分；文章变更携带 id 与所有语言版本，其余类型只有类型本身，
/// 多余的字段会被忽略。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "__typename")]
pub enum ChangeNotification {
    Article {
        id: String,
        localizations: Vec<Localization>,
    },
    Navigation,
    Footer,
    Page,
    Homepage,
    Category,
    Author,
    Singleton,
    GlobalTranslations,
}

impl ChangeNotification {
    /// 由不携带额外数据的类型构造通知；文章需要 id 与语言版本，返回 None
    #[cfg(test)]
    pub(crate) fn bare(entity_type: EntityType) -> Option<Self> {
        let notification = match entity_type {
            EntityType::Article => return None,
            EntityType::Navigation => ChangeNotification::Navigation,
            EntityType::Footer => ChangeNotification::Footer,
            EntityType::Page => ChangeNotification::Page,
            EntityType::Homepage => ChangeNotification::Homepage,
            EntityType::Category => ChangeNotification::Category,
            EntityType::Author => ChangeNotification::Author,
            EntityType::Singleton => ChangeNotification::Singleton,
            EntityType::GlobalTranslations => ChangeNotification::GlobalTranslations,
        };
        Some(notification)
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            ChangeNotification::Article { .. } => EntityType::Article,
            ChangeNotification::Navigation => EntityType::Navigation,
            ChangeNotification::Footer => EntityType::Footer,
            ChangeNotification::Page => EntityType::Page,
            ChangeNotification::Homepage => EntityType::Homepage,
            ChangeNotification::Category => EntityType::Category,
            ChangeNotification::Author => EntityType::Author,
            ChangeNotification::Singleton => EntityType::Singleton,
            ChangeNotification::GlobalTranslations => EntityType::GlobalTranslations,
        }
    }
}

/// 缓存标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheTag {
    Article,
    Navigation,
    Page,
    Homepage,
    Category,
    Translations,
}

impl CacheTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Article => "ARTICLE",
            CacheTag::Navigation => "NAVIGATION",
            CacheTag::Page => "PAGE",
            CacheTag::Homepage => "HOMEPAGE",
            CacheTag::Category => "CATEGORY",
            CacheTag::Translations => "TRANSLATIONS",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSS 订阅中使用的文章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedArticle {
    /// 文章语言（站点标准写法）
    pub locale: String,
    /// 文章标题
    pub title: String,
    /// 文章别名
    pub slug: String,
    /// 更新时间
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// 作者名
    #[serde(default)]
    pub author: Option<String>,
    /// 封面图片
    #[serde(default)]
    pub image_url: Option<String>,
}
