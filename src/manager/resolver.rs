//! 集合定位：模型名（可带租户）到物理数据库与集合

use crate::adapter::CollectionTarget;
use crate::model::ModelMeta;

/// 集合定位器
pub trait CollectionResolver: Send + Sync {
    /// 租户对应的数据库名
    fn database_name(&self, tenant: Option<&str>) -> String;

    /// 模型对应的物理位置
    fn resolve(&self, meta: &ModelMeta, tenant: Option<&str>) -> CollectionTarget {
        CollectionTarget::new(self.database_name(tenant), meta.collection_name.clone())
    }
}

/// 单数据库，忽略租户
#[derive(Debug, Clone)]
pub struct SingleDatabaseResolver {
    database: String,
}

impl SingleDatabaseResolver {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }
}

impl CollectionResolver for SingleDatabaseResolver {
    fn database_name(&self, _tenant: Option<&str>) -> String {
        self.database.clone()
    }
}

/// 每个租户一个数据库：`<prefix>_<tenant>`，无租户时使用 `<prefix>`
#[derive(Debug, Clone)]
pub struct TenantDatabaseResolver {
    prefix: String,
}

impl TenantDatabaseResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl CollectionResolver for TenantDatabaseResolver {
    fn database_name(&self, tenant: Option<&str>) -> String {
        match tenant {
            Some(tenant) if !tenant.is_empty() => format!("{}_{}", self.prefix, tenant),
            _ => self.prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_database_names() {
        let meta = ModelMeta::new("Article").collection("articles");
        let resolver = TenantDatabaseResolver::new("cms");
        assert_eq!(resolver.resolve(&meta, Some("acme")), CollectionTarget::new("cms_acme", "articles"));
        assert_eq!(resolver.resolve(&meta, None).database, "cms");
        assert_eq!(SingleDatabaseResolver::new("app").resolve(&meta, Some("acme")).database, "app");
    }
}
