use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::cache::CacheInvalidator;
use crate::core::tags::TagTable;
use crate::error::RevalidateError;
use crate::i18n::{standardize_locale, I18n};
use crate::models::{CacheTag, ChangeNotification};

/// 一次缓存失效操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Path(String),
    Tag(CacheTag),
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invalidation::Path(path) => write!(f, "path {}", path),
            Invalidation::Tag(tag) => write!(f, "tag {}", tag),
        }
    }
}

/// 重新验证分发器：把内容变更通知转换为路径与标签失效
#[derive(Clone)]
pub struct Dispatcher {
    tags: Arc<TagTable>,
    i18n: Arc<I18n>,
    backend: Arc<dyn CacheInvalidator>,
}

impl Dispatcher {
    pub fn new(tags: Arc<TagTable>, i18n: Arc<I18n>, backend: Arc<dyn CacheInvalidator>) -> Self {
        Self { tags, i18n, backend }
    }

    /// 计算需要执行的失效操作，按执行顺序排列
    ///
    /// 文章的每个语言版本先失效默认路径（若为默认语言），再失效带语言前缀的路径；
    /// 最后是该类型对应的标签。不做去重。
    pub fn plan(&self, notification: &ChangeNotification) -> Vec<Invalidation> {
        let mut plan = Vec::new();

        if let ChangeNotification::Article { localizations, .. } = notification {
            for localization in localizations {
                let locale = standardize_locale(&localization.locale);
                if !self.i18n.is_supported(&locale) {
                    warn!(
                        "Article locale {} ({}) is not a supported site locale",
                        locale, localization.locale
                    );
                }
                if self.i18n.is_default(&locale) {
                    plan.push(Invalidation::Path(format!("/article/{}", localization.slug)));
                }
                plan.push(Invalidation::Path(format!(
                    "/{}/article/{}",
                    locale, localization.slug
                )));
            }
        }

        plan.extend(
            self.tags
                .tags_for(notification.entity_type())
                .iter()
                .copied()
                .map(Invalidation::Tag),
        );
        plan
    }

    /// 执行失效并原样返回通知；任一操作失败立即返回
    pub fn dispatch(
        &self,
        notification: ChangeNotification,
    ) -> Result<ChangeNotification, RevalidateError> {
        let plan = self.plan(&notification);
        for invalidation in &plan {
            debug!("Revalidating {}", invalidation);
            match invalidation {
                Invalidation::Path(path) => self.backend.invalidate_path(path)?,
                Invalidation::Tag(tag) => self.backend.invalidate_tag(*tag)?,
            }
        }
        info!(
            "Revalidated {} ({} invalidations)",
            notification.entity_type(),
            plan.len()
        );
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidationError;
    use crate::models::{EntityType, Localization};
    use std::sync::Mutex;

    /// 记录所有调用的后端；可设置在第 n 次调用时失败
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Invalidation>>,
        fail_at: Option<usize>,
    }

    impl Recorder {
        fn failing_at(n: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at: Some(n),
            }
        }

        fn calls(&self) -> Vec<Invalidation> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, invalidation: Invalidation) -> Result<(), InvalidationError> {
            let mut calls = self.calls.lock().unwrap();
            if self.fail_at == Some(calls.len()) {
                return Err(InvalidationError::Path {
                    path: invalidation.to_string(),
                    message: "backend unavailable".to_string(),
                });
            }
            calls.push(invalidation);
            Ok(())
        }
    }

    impl CacheInvalidator for Recorder {
        fn invalidate_path(&self, path: &str) -> Result<(), InvalidationError> {
            self.record(Invalidation::Path(path.to_string()))
        }

        fn invalidate_tag(&self, tag: CacheTag) -> Result<(), InvalidationError> {
            self.record(Invalidation::Tag(tag))
        }
    }

    fn dispatcher(recorder: Arc<Recorder>) -> Dispatcher {
        let i18n = I18n {
            default_locale: "en".to_string(),
            locales: vec!["en".to_string(), "fr".to_string(), "pl".to_string()],
        };
        Dispatcher::new(Arc::new(TagTable::standard()), Arc::new(i18n), recorder)
    }

    fn article(localizations: &[(&str, &str)]) -> ChangeNotification {
        ChangeNotification::Article {
            id: "ckx1".to_string(),
            localizations: localizations
                .iter()
                .map(|(locale, slug)| Localization {
                    locale: locale.to_string(),
                    slug: slug.to_string(),
                })
                .collect(),
        }
    }

    fn path(p: &str) -> Invalidation {
        Invalidation::Path(p.to_string())
    }

    #[test]
    fn test_bare_types_only_invalidate_tags() {
        let table = TagTable::standard();
        for entity_type in EntityType::ALL {
            let Some(notification) = ChangeNotification::bare(entity_type) else {
                continue;
            };
            let recorder = Arc::new(Recorder::default());
            dispatcher(recorder.clone()).dispatch(notification).unwrap();

            let expected: Vec<Invalidation> = table
                .tags_for(entity_type)
                .iter()
                .copied()
                .map(Invalidation::Tag)
                .collect();
            assert_eq!(recorder.calls(), expected, "{}", entity_type);
        }
    }

    #[test]
    fn test_default_locale_article() {
        let recorder = Arc::new(Recorder::default());
        dispatcher(recorder.clone())
            .dispatch(article(&[("en-US", "hello")]))
            .unwrap();
        assert_eq!(
            recorder.calls(),
            vec![
                path("/article/hello"),
                path("/en/article/hello"),
                Invalidation::Tag(CacheTag::Article),
            ]
        );
    }

    #[test]
    fn test_non_default_locale_article() {
        let recorder = Arc::new(Recorder::default());
        dispatcher(recorder.clone())
            .dispatch(article(&[("fr-FR", "bonjour")]))
            .unwrap();
        assert_eq!(
            recorder.calls(),
            vec![path("/fr/article/bonjour"), Invalidation::Tag(CacheTag::Article)]
        );
    }

    #[test]
    fn test_path_count_for_many_localizations() {
        let recorder = Arc::new(Recorder::default());
        let localizations = [
            ("en_US", "hello"),
            ("fr_FR", "bonjour"),
            ("pl_PL", "czesc"),
            ("en_GB", "hello-uk"),
        ];
        dispatcher(recorder.clone())
            .dispatch(article(&localizations))
            .unwrap();

        let paths = recorder
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Invalidation::Path(_)))
            .count();
        // 4 个语言版本，其中 2 个为默认语言
        assert_eq!(paths, 4 + 2);
    }

    #[test]
    fn test_duplicate_standard_locales_are_kept() {
        let recorder = Arc::new(Recorder::default());
        dispatcher(recorder.clone())
            .dispatch(article(&[("fr_FR", "same"), ("fr_CA", "same")]))
            .unwrap();
        assert_eq!(
            recorder.calls(),
            vec![
                path("/fr/article/same"),
                path("/fr/article/same"),
                Invalidation::Tag(CacheTag::Article),
            ]
        );
    }

    #[test]
    fn test_empty_localizations_still_invalidate_tag() {
        let recorder = Arc::new(Recorder::default());
        dispatcher(recorder.clone()).dispatch(article(&[])).unwrap();
        assert_eq!(recorder.calls(), vec![Invalidation::Tag(CacheTag::Article)]);
    }

    #[test]
    fn test_dispatch_is_idempotent_and_returns_input() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher(recorder.clone());
        let notification = article(&[("en_US", "hello"), ("pl_PL", "czesc")]);

        let first = dispatcher.dispatch(notification.clone()).unwrap();
        assert_eq!(first, notification);
        let once = recorder.calls();

        let second = dispatcher.dispatch(notification.clone()).unwrap();
        assert_eq!(second, notification);
        let calls = recorder.calls();
        assert_eq!(&calls[..once.len()], &calls[once.len()..]);
    }

    #[test]
    fn test_backend_failure_stops_dispatch() {
        let recorder = Arc::new(Recorder::failing_at(1));
        let result = dispatcher(recorder.clone())
            .dispatch(article(&[("en_US", "hello"), ("fr_FR", "bonjour")]));

        assert!(matches!(result, Err(RevalidateError::Backend(_))));
        assert_eq!(recorder.calls(), vec![path("/article/hello")]);
    }
}
