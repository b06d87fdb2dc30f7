//! MongoDB适配器核心模块
//!
//! 通过 `mongodb` 驱动实现 DocumentStore

use crate::adapter::mongodb::query_builder::{
    build_filter_document, build_pipeline, build_sort_document, build_update_document,
};
use crate::adapter::mongodb::utils::{data_map_to_document, document_to_raw};
use crate::adapter::{
    default_index_name, CollectionTarget, DocumentStore, DocumentStream, RawDocument, UpdateOutcome,
};
use crate::config::MongoConfig;
use crate::error::{OdmError, OdmResult};
use crate::model::IndexDefinition;
use crate::types::*;
use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use rat_logger::{debug, info};

/// MongoDB存储
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// 按配置连接
    pub async fn connect(config: &MongoConfig) -> OdmResult<Self> {
        let uri = config.build_uri();
        let client = Client::with_uri_str(&uri)
            .await
            .map_err(|e| crate::odm_error!(driver, format!("MongoDB连接失败: {}", e)))?;
        info!("MongoDB客户端已创建: {}:{}", config.host, config.port);
        Ok(Self { client })
    }

    /// 使用已有客户端
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn collection(&self, target: &CollectionTarget) -> Collection<Document> {
        self.client
            .database(&target.database)
            .collection::<Document>(&target.collection)
    }
}

fn into_stream(cursor: mongodb::Cursor<Document>) -> DocumentStream {
    cursor
        .map(|result| result.map(|document| document_to_raw(&document)).map_err(OdmError::from))
        .boxed()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, target: &CollectionTarget, document: RawDocument) -> OdmResult<ObjectId> {
        let doc = data_map_to_document(&document);
        debug!("执行MongoDB插入到集合 {}: {:?}", target, doc);
        let result = self.collection(target).insert_one(doc, None).await?;
        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid),
            other => Err(crate::odm_error!(
                driver,
                format!("MongoDB返回了非ObjectId类型的标识: {}", other)
            )),
        }
    }

    async fn find_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<Option<RawDocument>> {
        let query = build_filter_document(filter)?;
        let found = self.collection(target).find_one(query, None).await?;
        Ok(found.map(|document| document_to_raw(&document)))
    }

    async fn find(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        options: &QueryOptions,
    ) -> OdmResult<DocumentStream> {
        let query = build_filter_document(filter)?;
        let mut find_options = FindOptions::default();
        if !options.sort.is_empty() {
            find_options.sort = Some(build_sort_document(&options.sort));
        }
        if let Some(pagination) = &options.pagination {
            if pagination.limit > 0 {
                find_options.limit = Some(pagination.limit as i64);
            }
            find_options.skip = Some(pagination.skip);
        }
        debug!("执行MongoDB查询 {}: {:?}", target, query);
        let cursor = self.collection(target).find(query, find_options).await?;
        Ok(into_stream(cursor))
    }

    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        update: &[UpdateOperation],
    ) -> OdmResult<UpdateOutcome> {
        let query = build_filter_document(filter)?;
        let update_doc = build_update_document(update);
        debug!("执行MongoDB更新 {}: {:?} -> {:?}", target, query, update_doc);
        let result = self.collection(target).update_one(query, update_doc, None).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn replace_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        replacement: RawDocument,
    ) -> OdmResult<UpdateOutcome> {
        let query = build_filter_document(filter)?;
        let replacement = data_map_to_document(&replacement);
        let result = self.collection(target).replace_one(query, replacement, None).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<u64> {
        let query = build_filter_document(filter)?;
        let result = self.collection(target).delete_one(query, None).await?;
        Ok(result.deleted_count)
    }

    async fn aggregate(&self, target: &CollectionTarget, pipeline: &[PipelineStage]) -> OdmResult<DocumentStream> {
        let stages = build_pipeline(pipeline)?;
        let cursor = self.collection(target).aggregate(stages, None).await?;
        Ok(into_stream(cursor))
    }

    async fn create_index(&self, target: &CollectionTarget, index: &IndexDefinition) -> OdmResult<String> {
        let mut keys = Document::new();
        for field in &index.fields {
            keys.insert(field, 1);
        }
        let mut index_options = IndexOptions::default();
        index_options.name = Some(default_index_name(index));
        index_options.unique = Some(index.unique);

        let index_model = IndexModel::builder()
            .keys(keys)
            .options(index_options)
            .build();
        let result = self.collection(target).create_index(index_model, None).await?;
        debug!("创建MongoDB索引 {}: {}", target, result.index_name);
        Ok(result.index_name)
    }

    async fn drop_database(&self, database: &str) -> OdmResult<()> {
        self.client.database(database).drop(None).await?;
        info!("已删除MongoDB数据库: {}", database);
        Ok(())
    }
}
