//! # 惰性文档序列
//!
//! 游标只保存查询描述，每次 `stream()` 都重新向驱动发起查询，
//! 因而可以重复遍历；结果由驱动按需拉取。

use crate::adapter::CollectionTarget;
use crate::document::Document;
use crate::error::OdmResult;
use crate::model::ModelDefinition;
use crate::odm::DocumentMapper;
use crate::types::*;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum CursorQuery {
    Find {
        filter: Vec<QueryConditionGroup>,
        options: QueryOptions,
    },
    Aggregate(Vec<PipelineStage>),
}

/// 可重启的文档游标
#[derive(Debug, Clone)]
pub struct DocumentCursor {
    mapper: DocumentMapper,
    model: Arc<ModelDefinition>,
    target: CollectionTarget,
    query: CursorQuery,
}

impl DocumentCursor {
    pub(crate) fn find(
        mapper: DocumentMapper,
        model: Arc<ModelDefinition>,
        filter: Vec<QueryConditionGroup>,
        options: QueryOptions,
    ) -> Self {
        let target = mapper.target(&model.meta);
        Self {
            mapper,
            model,
            target,
            query: CursorQuery::Find { filter, options },
        }
    }

    pub(crate) fn aggregate(mapper: DocumentMapper, model: Arc<ModelDefinition>, pipeline: Vec<PipelineStage>) -> Self {
        let target = mapper.target(&model.meta);
        Self {
            mapper,
            model,
            target,
            query: CursorQuery::Aggregate(pipeline),
        }
    }

    pub fn target(&self) -> &CollectionTarget {
        &self.target
    }

    /// 聚合游标的管道，普通查询返回 None
    pub fn pipeline(&self) -> Option<&[PipelineStage]> {
        match &self.query {
            CursorQuery::Aggregate(pipeline) => Some(pipeline),
            CursorQuery::Find { .. } => None,
        }
    }

    /// 执行查询并返回文档流
    pub async fn stream(&self) -> OdmResult<BoxStream<'static, OdmResult<Document>>> {
        let raw = match &self.query {
            CursorQuery::Find { filter, options } => self.mapper.store.find(&self.target, filter, options).await?,
            CursorQuery::Aggregate(pipeline) => self.mapper.store.aggregate(&self.target, pipeline).await?,
        };
        let mapper = self.mapper.clone();
        let model = self.model.clone();
        Ok(raw
            .map(move |result| result.and_then(|document| mapper.hydrate(&model, document)))
            .boxed())
    }

    /// 读取全部结果
    pub async fn collect(&self) -> OdmResult<Vec<Document>> {
        self.stream().await?.try_collect().await
    }

    /// 读取第一个结果
    pub async fn first(&self) -> OdmResult<Option<Document>> {
        let mut stream = self.stream().await?;
        stream.next().await.transpose()
    }
}
