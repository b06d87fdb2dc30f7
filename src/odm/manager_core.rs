//! # 文档映射器核心实现

use crate::adapter::{CollectionTarget, DocumentStore, RawDocument, ID_FIELD};
use crate::config::OdmConfig;
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::hooks::{HookContext, IdentityProvider, StaticIdentity};
use crate::manager::{CollectionResolver, ModelRegistry, SingleDatabaseResolver};
use crate::model::{relation_result_field, ModelDefinition, ModelMeta};
use crate::types::DataValue;
use mongodb::bson::oid::ObjectId;
use rat_logger::{debug, info, warn};
use std::sync::Arc;

/// 全文检索默认返回条数
pub const DEFAULT_SEARCH_LIMIT: u64 = 500;

/// 文档映射器
///
/// 所有操作都显式接收模型名，集合位置由 CollectionResolver 决定。
/// 克隆开销很小，可在任务之间共享。
#[derive(Clone)]
pub struct DocumentMapper {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) registry: Arc<ModelRegistry>,
    pub(crate) resolver: Arc<dyn CollectionResolver>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) tenant: Option<String>,
    pub(crate) search_limit: u64,
}

impl std::fmt::Debug for DocumentMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentMapper")
            .field("models", &self.registry.model_names())
            .field("tenant", &self.tenant)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

impl DocumentMapper {
    /// 创建新的文档映射器，默认匿名身份
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ModelRegistry>,
        resolver: Arc<dyn CollectionResolver>,
    ) -> Self {
        info!("创建文档映射器");
        Self {
            store,
            registry,
            resolver,
            identity: Arc::new(StaticIdentity::anonymous()),
            tenant: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// 按配置创建：单数据库部署，检索上限取自配置
    pub fn from_config(store: Arc<dyn DocumentStore>, registry: Arc<ModelRegistry>, config: &OdmConfig) -> Self {
        Self::new(
            store,
            registry,
            Arc::new(SingleDatabaseResolver::new(config.mongodb.database.clone())),
        )
        .with_search_limit(config.search_limit)
    }

    /// 设置操作者身份来源
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_search_limit(mut self, search_limit: u64) -> Self {
        self.search_limit = search_limit;
        self
    }

    /// 返回绑定到租户的映射器，之后的调用都经过该租户的数据库
    pub fn for_tenant(&self, tenant: impl Into<String>) -> Self {
        let mut mapper = self.clone();
        let tenant = tenant.into();
        debug!("切换租户: {}", tenant);
        mapper.tenant = Some(tenant);
        mapper
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// 查找模型定义
    pub fn model(&self, model_name: &str) -> OdmResult<Arc<ModelDefinition>> {
        self.registry.describe(model_name)
    }

    /// 模型的物理位置
    pub fn target(&self, meta: &ModelMeta) -> CollectionTarget {
        self.resolver.resolve(meta, self.tenant.as_deref())
    }

    /// 当前租户的数据库名
    pub fn database_name(&self) -> String {
        self.resolver.database_name(self.tenant.as_deref())
    }

    pub(crate) fn hook_context(&self) -> HookContext {
        HookContext::from_provider(self.identity.as_ref())
    }

    /// 绑定到模型的空白文档
    pub fn instantiate(&self, model_name: &str) -> OdmResult<Document> {
        Ok(Document::new(self.model(model_name)?))
    }

    /// 把存储返回的原始文档还原为 Document
    ///
    /// `_id` 成为标识；`local_<name>` 数组按目标模型还原为关联结果
    pub fn hydrate(&self, model: &Arc<ModelDefinition>, mut raw: RawDocument) -> OdmResult<Document> {
        let id = match raw.remove(ID_FIELD) {
            Some(DataValue::ObjectId(id)) => Some(id),
            Some(other) => {
                warn!("集合 {} 中的文档标识不是ObjectId: {}", model.meta.collection_name, other);
                None
            }
            None => None,
        };

        let mut related = Vec::new();
        for relation in &model.meta.relations {
            let Some(value) = raw.remove(&relation_result_field(&relation.name)) else {
                continue;
            };
            let target_model = self.model(&relation.target_model)?;
            let items = match value {
                DataValue::Array(items) => items,
                DataValue::Null => Vec::new(),
                single => vec![single],
            };
            let mut documents = Vec::with_capacity(items.len());
            for item in items {
                documents.push(self.hydrate(&target_model, item.expect_object()?)?);
            }
            related.push((relation.name.clone(), documents));
        }

        let mut document = Document::from_parts(model.clone(), id, raw);
        for (name, documents) in related {
            document.attach_relation(&name, documents);
        }
        Ok(document)
    }
}

/// 调用方提供的标识：能解析为ObjectId时使用ObjectId，否则按原字符串查询
pub(crate) fn id_value(id: &str) -> DataValue {
    ObjectId::parse_str(id)
        .map(DataValue::ObjectId)
        .unwrap_or_else(|_| DataValue::String(id.to_string()))
}

/// 需要已保存文档的操作在文档没有标识时的错误
pub(crate) fn require_id(document: &Document) -> OdmResult<ObjectId> {
    document.id().ok_or_else(|| OdmError::Validation {
        field: ID_FIELD.to_string(),
        message: format!("模型 {} 的文档尚未保存", document.model_name()),
    })
}
