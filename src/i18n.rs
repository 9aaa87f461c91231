use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// 站点语言配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18n {
    /// 默认语言，访问无语言前缀的路径时使用
    pub default_locale: String,
    /// 支持的语言列表
    pub locales: Vec<String>,
}

impl Default for I18n {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            locales: vec!["en".to_string()],
        }
    }
}

impl I18n {
    pub fn is_default(&self, locale: &str) -> bool {
        self.default_locale == locale
    }

    pub fn is_supported(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// 检查默认语言在支持列表中
    pub fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            bail!("i18n.locales 不能为空");
        }
        if !self.is_supported(&self.default_locale) {
            bail!(
                "默认语言 {} 不在支持的语言列表中: {:?}",
                self.default_locale,
                self.locales
            );
        }
        Ok(())
    }
}

/// 将 CMS 语言代码转换为站点标准写法
///
/// `en_US`、`en-US` 都会变成 `en`；不带地区的代码只做小写处理。
pub fn standardize_locale(cms_locale: &str) -> String {
    cms_locale
        .split(|c| c == '_' || c == '-')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
