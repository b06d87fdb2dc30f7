//! 关联解析
//!
//! 模型声明的每个关联都翻译为一个 lookup 阶段：以目标集合的 `_id`
//! 连接本地字段，结果数组挂在 `local_<name>` 下。关联结果总是数组，
//! 每次查询都重新计算。

use crate::adapter::ID_FIELD;
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::model::ModelMeta;
use crate::odm::{DocumentCursor, DocumentMapper};
use crate::types::*;
use rat_logger::debug;

/// 读取字段的结果
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// 普通字段（已应用访问器）
    Value(DataValue),
    /// 关联结果
    Related(Vec<Document>),
    /// 既不是字段也不是关联
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// 普通字段值，关联或缺失时返回 None
    pub fn into_value(self) -> Option<DataValue> {
        match self {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// 关联解析器
pub struct RelationResolver<'a> {
    mapper: &'a DocumentMapper,
}

impl<'a> RelationResolver<'a> {
    pub fn new(mapper: &'a DocumentMapper) -> Self {
        Self { mapper }
    }

    /// 构建关联查询管道
    ///
    /// 过滤条件非空时先加 match 阶段，随后每个关联一个 lookup 阶段；
    /// 排序与分页只在选项要求时追加
    pub fn build_pipeline(
        &self,
        meta: &ModelMeta,
        filter: &[QueryConditionGroup],
        options: &QueryOptions,
    ) -> OdmResult<Vec<PipelineStage>> {
        let mut pipeline = Vec::with_capacity(meta.relations.len() + 4);
        if !filter.is_empty() {
            pipeline.push(PipelineStage::Match(filter.to_vec()));
        }
        for relation in &meta.relations {
            let target = self.mapper.model(&relation.target_model)?;
            pipeline.push(PipelineStage::Lookup {
                from: target.meta.collection_name.clone(),
                local_field: relation.local_field.clone(),
                foreign_field: ID_FIELD.to_string(),
                as_field: relation.result_field(),
            });
        }
        if !options.sort.is_empty() {
            pipeline.push(PipelineStage::Sort(options.sort.clone()));
        }
        if let Some(pagination) = &options.pagination {
            if pagination.skip > 0 {
                pipeline.push(PipelineStage::Skip(pagination.skip));
            }
            if pagination.limit > 0 {
                pipeline.push(PipelineStage::Limit(pagination.limit));
            }
        }
        Ok(pipeline)
    }

    /// 查询并解析关联；模型没有关联时等同于普通查询
    pub fn resolve(
        &self,
        model_name: &str,
        filter: Vec<QueryConditionGroup>,
        options: QueryOptions,
    ) -> OdmResult<DocumentCursor> {
        let model = self.mapper.model(model_name)?;
        if !model.meta.has_relations() {
            return self.mapper.find(model_name, filter, options);
        }
        let pipeline = self.build_pipeline(&model.meta, &filter, &options)?;
        debug!("关联查询管道: {} 共 {} 个阶段", model_name, pipeline.len());
        Ok(DocumentCursor::aggregate(self.mapper.clone(), model, pipeline))
    }

    /// 加载单个关联并挂到文档上
    ///
    /// 本地字段为空时结果为空数组；本地字段为数组时匹配其中任一标识
    pub async fn load(&self, document: &mut Document, name: &str) -> OdmResult<Vec<Document>> {
        let relation = document
            .meta()
            .find_relation(name)
            .cloned()
            .ok_or_else(|| OdmError::Validation {
                field: name.to_string(),
                message: format!("模型 {} 没有声明关联 {}", document.model_name(), name),
            })?;

        let related = match document.fields().get(&relation.local_field) {
            None | Some(DataValue::Null) => Vec::new(),
            Some(value) => {
                let condition = match value {
                    DataValue::Array(ids) => QueryCondition::new(ID_FIELD, QueryOperator::In, ids.clone()),
                    single => QueryCondition::eq(ID_FIELD, single.clone()),
                };
                self.mapper
                    .find(&relation.target_model, vec![condition.into()], QueryOptions::new())?
                    .collect()
                    .await?
            }
        };
        debug!("加载关联: {}.{} 共 {} 条", document.model_name(), name, related.len());
        document.attach_relation(name, related.clone());
        Ok(related)
    }
}

impl DocumentMapper {
    /// 加载文档的某个关联，结果挂在 `local_<name>` 下
    pub async fn load_relation(&self, document: &mut Document, name: &str) -> OdmResult<Vec<Document>> {
        RelationResolver::new(self).load(document, name).await
    }

    /// 读取字段：普通字段优先，其次是已加载的关联，
    /// 再次是声明过但尚未加载的关联（此时会触发加载）
    pub async fn get_field(&self, document: &mut Document, name: &str) -> OdmResult<FieldValue> {
        if let Some(value) = document.get(name) {
            return Ok(FieldValue::Value(value));
        }
        if let Some(related) = document.related(name) {
            return Ok(FieldValue::Related(related.to_vec()));
        }
        if document.meta().find_relation(name).is_some() {
            return Ok(FieldValue::Related(self.load_relation(document, name).await?));
        }
        Ok(FieldValue::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryStore;
    use crate::manager::{ModelRegistry, SingleDatabaseResolver};
    use crate::model::{id_field, string_field, ModelDefinition, RelationDefinition};
    use std::sync::Arc;

    fn mapper() -> DocumentMapper {
        let registry = Arc::new(ModelRegistry::new());
        registry.register(ModelDefinition::new(
            ModelMeta::new("users").collection("Users").field("name", string_field()),
        ));
        registry.register(ModelDefinition::new(
            ModelMeta::new("articles")
                .field("status", string_field())
                .field("author", id_field())
                .relation(RelationDefinition::new("author", "author", "users")),
        ));
        DocumentMapper::new(
            Arc::new(MemoryStore::new()),
            registry,
            Arc::new(SingleDatabaseResolver::new("app")),
        )
    }

    #[test]
    fn test_pipeline_has_match_then_lookup() {
        let mapper = mapper();
        let model = mapper.model("articles").unwrap();
        let filter = vec![QueryCondition::eq("status", "published").into()];

        let pipeline = RelationResolver::new(&mapper)
            .build_pipeline(&model.meta, &filter, &QueryOptions::new())
            .unwrap();

        assert_eq!(
            pipeline,
            vec![
                PipelineStage::Match(filter),
                PipelineStage::Lookup {
                    from: "Users".to_string(),
                    local_field: "author".to_string(),
                    foreign_field: "_id".to_string(),
                    as_field: "local_author".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_pipeline_skips_empty_match_and_appends_paging() {
        let mapper = mapper();
        let model = mapper.model("articles").unwrap();
        let options = QueryOptions::new()
            .with_sort(vec![SortConfig::desc("status")])
            .paginate(10, 20);

        let pipeline = RelationResolver::new(&mapper)
            .build_pipeline(&model.meta, &[], &options)
            .unwrap();

        assert!(matches!(pipeline[0], PipelineStage::Lookup { .. }));
        assert_eq!(pipeline[1], PipelineStage::Sort(vec![SortConfig::desc("status")]));
        assert_eq!(pipeline[2], PipelineStage::Skip(20));
        assert_eq!(pipeline[3], PipelineStage::Limit(10));
    }

    #[test]
    fn test_resolve_without_relations_is_plain_find() {
        let mapper = mapper();
        let cursor = RelationResolver::new(&mapper)
            .resolve("users", Vec::new(), QueryOptions::new())
            .unwrap();
        assert!(cursor.pipeline().is_none());
    }

    #[tokio::test]
    async fn test_get_field_loads_relation_lazily() {
        let mapper = mapper();
        let mut fields = std::collections::HashMap::new();
        fields.insert("name".to_string(), DataValue::from("ada"));
        let user = mapper.create("users", fields).await.unwrap();

        let mut article = mapper.instantiate("articles").unwrap();
        article.set("author", user.id().unwrap().to_hex()).unwrap();

        // 普通字段优先于同名关联
        assert!(matches!(
            mapper.get_field(&mut article, "author").await.unwrap(),
            FieldValue::Value(DataValue::ObjectId(_))
        ));
        assert!(mapper.get_field(&mut article, "nothing").await.unwrap().is_missing());

        let related = mapper.load_relation(&mut article, "author").await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].get("name"), Some(DataValue::from("ada")));
        assert_eq!(article.related("author").map(|docs| docs.len()), Some(1));
    }

    #[tokio::test]
    async fn test_get_field_falls_back_to_relation() {
        let registry = Arc::new(ModelRegistry::new());
        registry.register(ModelDefinition::new(ModelMeta::new("users").field("name", string_field())));
        registry.register(ModelDefinition::new(
            ModelMeta::new("posts")
                .field("writer_id", id_field())
                .relation(RelationDefinition::new("writer", "writer_id", "users")),
        ));
        let mapper = DocumentMapper::new(
            Arc::new(MemoryStore::new()),
            registry,
            Arc::new(SingleDatabaseResolver::new("app")),
        );

        let mut post = mapper.instantiate("posts").unwrap();
        let FieldValue::Related(writers) = mapper.get_field(&mut post, "writer").await.unwrap() else {
            panic!("关联应被解析");
        };
        assert!(writers.is_empty());
        assert_eq!(post.related("writer").map(|docs| docs.len()), Some(0));
    }
}
