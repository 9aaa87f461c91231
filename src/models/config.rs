use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::i18n::I18n;

/// 站点地址的最终默认值
const FALLBACK_SITE_HOST: &str = "localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub i18n: I18n,
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// 订阅中最多包含的文章数
    pub limit: usize,
    /// 文章数据文件（JSON），相对站点目录
    pub articles: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Articles | RSS Feed".to_string(),
            description: Some("Welcome to this Articles!".to_string()),
            url: None,
            i18n: I18n::default(),
            server: ServerConfig::default(),
            feed: FeedConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            articles: "articles.json".to_string(),
        }
    }
}

/// 运行环境变量
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub site_url: Option<String>,
    pub vercel_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub skip_validation: bool,
}

impl Env {
    /// 读取进程环境变量
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            site_url: non_empty("SITE_URL"),
            vercel_url: non_empty("VERCEL_URL"),
            webhook_secret: non_empty("WEBHOOK_SECRET"),
            skip_validation: lookup("SKIP_ENV_VALIDATION").as_deref() == Some("true"),
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 加载站点目录下的 `_config.yml`，叠加环境变量并校验
    pub fn load(base_dir: &Path, env: &Env) -> Result<Self> {
        let config_path = base_dir.join("_config.yml");
        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };
        config.apply_env(env)?;
        config.i18n.validate()?;
        Ok(config)
    }

    /// 用环境变量覆盖文件中的值
    pub fn apply_env(&mut self, env: &Env) -> Result<()> {
        let raw = env
            .site_url
            .clone()
            .or_else(|| env.vercel_url.clone())
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| FALLBACK_SITE_HOST.to_string());
        self.url = Some(normalize_site_url(&raw)?);

        // 空白密钥视为未设置
        self.webhook.secret = env
            .webhook_secret
            .clone()
            .or_else(|| self.webhook.secret.take())
            .filter(|secret| !secret.trim().is_empty());
        if self.webhook.secret.is_none() && !env.skip_validation {
            bail!("缺少环境变量 WEBHOOK_SECRET");
        }
        Ok(())
    }

    /// 站点根地址（不带结尾斜杠）
    pub fn site_url(&self) -> &str {
        self.url.as_deref().unwrap_or(FALLBACK_SITE_HOST)
    }
}

/// 补全 https 前缀并去掉结尾斜杠
fn normalize_site_url(raw: &str) -> Result<String> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let parsed = Url::parse(&with_scheme)
        .with_context(|| format!("站点地址无效: {}", raw))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> Env {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Env::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_site_url_fallbacks() {
        let mut config = Config::default();
        config
            .apply_env(&env_of(&[("WEBHOOK_SECRET", "s")]))
            .unwrap();
        assert_eq!(config.site_url(), "https://localhost:3000");

        let mut config = Config::default();
        config
            .apply_env(&env_of(&[("WEBHOOK_SECRET", "s"), ("VERCEL_URL", "news.vercel.app")]))
            .unwrap();
        assert_eq!(config.site_url(), "https://news.vercel.app");

        let mut config = Config::default();
        config
            .apply_env(&env_of(&[
                ("WEBHOOK_SECRET", "s"),
                ("VERCEL_URL", "news.vercel.app"),
                ("SITE_URL", "http://example.com/"),
            ]))
            .unwrap();
        assert_eq!(config.site_url(), "http://example.com");
    }

    #[test]
    fn test_missing_secret() {
        let mut config = Config::default();
        assert!(config.apply_env(&env_of(&[])).is_err());

        let mut config = Config::default();
        config
            .apply_env(&env_of(&[("SKIP_ENV_VALIDATION", "true")]))
            .unwrap();
        assert!(config.webhook.secret.is_none());
    }

    #[test]
    fn test_blank_file_secret_is_missing() {
        let mut config = Config::default();
        config.webhook.secret = Some("  ".to_string());
        assert!(config.apply_env(&env_of(&[])).is_err());

        let mut config = Config::default();
        config.webhook.secret = Some(String::new());
        config
            .apply_env(&env_of(&[("SKIP_ENV_VALIDATION", "true")]))
            .unwrap();
        assert!(config.webhook.secret.is_none());

        let mut config = Config::default();
        config.webhook.secret = Some(String::new());
        config
            .apply_env(&env_of(&[("WEBHOOK_SECRET", "from-env")]))
            .unwrap();
        assert_eq!(config.webhook.secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_load_rejects_empty_secret_in_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "webhook:\n  secret: \"\"\n").unwrap();
        assert!(Config::load(dir.path(), &Env::default()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: News\nurl: news.example.com\ni18n:\n  default_locale: en\n  locales: [en, pl]\nwebhook:\n  secret: abc\n",
        )
        .unwrap();

        let config = Config::load(dir.path(), &Env::default()).unwrap();
        assert_eq!(config.title, "News");
        assert_eq!(config.site_url(), "https://news.example.com");
        assert_eq!(config.i18n.locales, vec!["en", "pl"]);
        assert_eq!(config.webhook.secret.as_deref(), Some("abc"));
        assert_eq!(config.feed.limit, 100);
    }
}
