//! 存储适配器模块
//!
//! 定义文档存储驱动的统一接口。过滤条件、更新操作与聚合管道都以
//! 带类型的值传入，由各实现翻译为自己的查询语言。

use crate::error::OdmResult;
use crate::model::IndexDefinition;
use crate::types::*;
use async_trait::async_trait;
use futures::stream::BoxStream;
use ::mongodb::bson::oid::ObjectId;
use std::collections::HashMap;

pub mod memory;
pub mod mongodb;

pub use self::memory::MemoryStore;
pub use self::mongodb::MongoStore;

pub use crate::document::ID_FIELD;

/// 存储层的原始文档
pub type RawDocument = HashMap<String, DataValue>;

/// 惰性文档序列，由驱动按需拉取
pub type DocumentStream = BoxStream<'static, OdmResult<RawDocument>>;

/// 物理位置：数据库名 + 集合名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionTarget {
    pub database: String,
    pub collection: String,
}

impl CollectionTarget {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// 同一数据库下的另一个集合
    pub fn sibling(&self, collection: impl Into<String>) -> Self {
        Self::new(self.database.clone(), collection)
    }
}

impl std::fmt::Display for CollectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// 更新结果：匹配数与修改数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// 文档存储驱动trait
///
/// 每次调用对单个文档是原子的；跨调用没有事务保证
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 插入文档，返回其标识（文档未携带 `_id` 时由驱动生成）
    async fn insert_one(&self, target: &CollectionTarget, document: RawDocument) -> OdmResult<ObjectId>;

    /// 查找第一个匹配的文档
    async fn find_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
    ) -> OdmResult<Option<RawDocument>>;

    /// 查找文档，返回惰性序列
    async fn find(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        options: &QueryOptions,
    ) -> OdmResult<DocumentStream>;

    /// 对第一个匹配的文档执行更新操作
    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        update: &[UpdateOperation],
    ) -> OdmResult<UpdateOutcome>;

    /// 整体替换第一个匹配的文档，保留其 `_id`
    async fn replace_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        replacement: RawDocument,
    ) -> OdmResult<UpdateOutcome>;

    /// 删除第一个匹配的文档，返回删除数量
    async fn delete_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<u64>;

    /// 执行聚合管道
    async fn aggregate(&self, target: &CollectionTarget, pipeline: &[PipelineStage]) -> OdmResult<DocumentStream>;

    /// 创建索引，返回索引名
    async fn create_index(&self, target: &CollectionTarget, index: &IndexDefinition) -> OdmResult<String>;

    /// 删除整个数据库
    async fn drop_database(&self, database: &str) -> OdmResult<()>;
}

/// 按标识过滤
pub fn id_filter(id: impl Into<DataValue>) -> Vec<QueryConditionGroup> {
    vec![QueryConditionGroup::Single(QueryCondition::eq(ID_FIELD, id))]
}

/// 默认索引名：`field_1_other_1`
pub fn default_index_name(index: &IndexDefinition) -> String {
    index
        .name
        .clone()
        .unwrap_or_else(|| index.fields.iter().map(|field| format!("{}_1", field)).collect::<Vec<_>>().join("_"))
}
