use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use rss::extension::atom::{AtomExtension, Link};
use rss::{Channel, Enclosure, Guid, Image, Item};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::models::{Config, FeedArticle};

/// 文章数据来源
pub trait ArticleSource: Send + Sync {
    /// 按更新时间倒序返回某语言下最近的文章
    fn recent_articles(&self, locale: &str, first: usize) -> Result<Vec<FeedArticle>>;
}

/// 从 JSON 文件读取文章；每次调用都重新读取
pub struct JsonArticleSource {
    path: PathBuf,
}

impl JsonArticleSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ArticleSource for JsonArticleSource {
    fn recent_articles(&self, locale: &str, first: usize) -> Result<Vec<FeedArticle>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("读取文章数据失败: {}", self.path.display()))?;
        let articles: Vec<FeedArticle> = serde_json::from_str(&content)
            .with_context(|| format!("解析文章数据失败: {}", self.path.display()))?;

        let mut articles: Vec<FeedArticle> = articles
            .into_iter()
            .filter(|a| a.locale == locale)
            .collect();
        articles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        articles.truncate(first);
        debug!("Loaded {} {} articles from {}", articles.len(), locale, self.path.display());
        Ok(articles)
    }
}

/// RSS 生成器
#[derive(Debug, Clone)]
pub struct FeedGenerator {
    site_url: String,
    title: String,
    description: String,
    /// 订阅中最多包含的文章数
    pub limit: usize,
}

impl FeedGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            site_url: config.site_url().trim_end_matches('/').to_string(),
            title: config.title.clone(),
            description: config.description.clone().unwrap_or_default(),
            limit: config.feed.limit,
        }
    }

    /// 某语言的订阅地址
    pub fn feed_path(locale: &str) -> String {
        format!("/api/{}", locale)
    }

    /// 生成 RSS 2.0 文档
    pub fn rss(&self, locale: &str, articles: &[FeedArticle]) -> String {
        let copyright = format!("All rights reserved {}", Utc::now().year());

        let mut image = Image::default();
        image.set_url(format!("{}/logo.png", self.site_url));
        image.set_title(self.title.clone());
        image.set_link(self.site_url.clone());

        let mut channel = Channel::default();
        channel.set_title(self.title.clone());
        channel.set_link(self.site_url.clone());
        channel.set_description(self.description.clone());
        channel.set_language(Some(locale.to_string()));
        channel.set_copyright(Some(copyright.clone()));
        channel.set_generator(Some(env!("CARGO_PKG_NAME").to_string()));
        channel.set_image(Some(image));
        channel.set_atom_ext(Some(self.atom_links(locale)));

        let items: Vec<Item> = articles
            .iter()
            .take(self.limit)
            .map(|article| self.item(locale, article))
            .collect();
        channel.set_items(items);

        channel.to_string()
    }

    /// 订阅自身地址与站点图标
    fn atom_links(&self, locale: &str) -> AtomExtension {
        let mut self_link = Link::default();
        self_link.set_href(format!("{}{}", self.site_url, Self::feed_path(locale)));
        self_link.set_rel("self");
        self_link.set_mime_type(Some("application/rss+xml".to_string()));

        let mut icon = Link::default();
        icon.set_href(format!("{}/favicon.ico", self.site_url));
        icon.set_rel("icon");

        let mut ext = AtomExtension::default();
        ext.set_links(vec![self_link, icon]);
        ext
    }

    fn item(&self, locale: &str, article: &FeedArticle) -> Item {
        let link = format!("{}/{}/article/{}", self.site_url, locale, article.slug);
        let date = article.updated_at.unwrap_or_else(Utc::now);

        let mut item = Item::default();
        item.set_title(article.title.clone());
        item.set_link(link.clone());
        item.set_guid(Guid {
            value: link,
            permalink: true,
        });
        item.set_description(article.title.clone());
        item.set_pub_date(date.to_rfc2822());
        item.set_author(article.author.clone().unwrap_or_else(|| "Anonymous".to_string()));
        if let Some(url) = &article.image_url {
            item.set_enclosure(Enclosure {
                url: url.clone(),
                length: "0".to_string(),
                mime_type: "image/jpeg".to_string(),
            });
        }
        item
    }
}
