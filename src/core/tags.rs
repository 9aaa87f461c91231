use std::collections::HashMap;

use crate::models::{CacheTag, EntityType};

/// 内容类型到缓存标签的映射，启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct TagTable {
    entries: HashMap<EntityType, Vec<CacheTag>>,
}

impl TagTable {
    /// 站点使用的标准映射
    pub fn standard() -> Self {
        let entries = EntityType::ALL
            .iter()
            .map(|&entity_type| {
                let tags = match entity_type {
                    EntityType::Article | EntityType::Author => vec![CacheTag::Article],
                    EntityType::Navigation | EntityType::Footer => vec![CacheTag::Navigation],
                    EntityType::Page => vec![CacheTag::Page],
                    EntityType::Homepage => vec![CacheTag::Homepage],
                    EntityType::Category => vec![CacheTag::Category],
                    EntityType::Singleton | EntityType::GlobalTranslations => {
                        vec![CacheTag::Translations]
                    }
                };
                (entity_type, tags)
            })
            .collect();
        Self { entries }
    }

    pub fn tags_for(&self, entity_type: EntityType) -> &[CacheTag] {
        self.entries
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::standard()
    }
}
