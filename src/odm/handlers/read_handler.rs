//! # 读取、查询与全文检索

use crate::adapter::{id_filter, ID_FIELD};
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::model::ModelMeta;
use crate::odm::manager_core::id_value;
use crate::odm::{DocumentCursor, DocumentMapper};
use crate::relation::RelationResolver;
use crate::types::*;
use rat_logger::debug;

/// 全文检索查询描述（只构建，不执行）
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextQuery {
    pub filter: Vec<QueryConditionGroup>,
    pub options: QueryOptions,
}

/// 构建全文检索查询
///
/// 对模型声明的每个检索字段做大小写不敏感的匹配，以 OR 组合，
/// 附带模型声明的排序与条数上限。检索文本按字面匹配。
pub fn build_full_text_query(meta: &ModelMeta, search: &str, limit: u64) -> OdmResult<FullTextQuery> {
    if meta.search_fields.is_empty() {
        return Err(OdmError::Validation {
            field: "search_fields".to_string(),
            message: format!("模型 {} 没有声明全文检索字段", meta.model_name),
        });
    }
    let pattern = regex::escape(search);
    let conditions = meta
        .search_fields
        .iter()
        .map(|field| QueryCondition::regex_ci(field.clone(), pattern.clone()).into())
        .collect();
    Ok(FullTextQuery {
        filter: vec![QueryConditionGroup::or(conditions)],
        options: QueryOptions::new()
            .with_sort(meta.sort_order.clone())
            .paginate(limit, 0),
    })
}

impl DocumentMapper {
    /// 按标识读取，不存在时返回 NotFound（包含标识与集合名）
    pub async fn get_by_id(&self, model_name: &str, id: &str) -> OdmResult<Document> {
        let model = self.model(model_name)?;
        let target = self.target(&model.meta);
        debug!("根据ID查找文档: {} id={}", target, id);
        match self.store.find_one(&target, &id_filter(id_value(id))).await? {
            Some(raw) => self.hydrate(&model, raw),
            None => Err(OdmError::NotFound {
                id: id.to_string(),
                collection: target.collection,
            }),
        }
    }

    /// 查询文档，返回可重启的惰性游标
    pub fn find(
        &self,
        model_name: &str,
        filter: Vec<QueryConditionGroup>,
        options: QueryOptions,
    ) -> OdmResult<DocumentCursor> {
        let model = self.model(model_name)?;
        Ok(DocumentCursor::find(self.clone(), model, filter, options))
    }

    /// 构建模型的全文检索查询，`limit` 缺省时使用映射器的检索上限
    pub fn full_text_query(&self, model_name: &str, search: &str, limit: Option<u64>) -> OdmResult<FullTextQuery> {
        let model = self.model(model_name)?;
        build_full_text_query(&model.meta, search, limit.unwrap_or(self.search_limit))
    }

    /// 执行全文检索
    pub fn search(&self, model_name: &str, search: &str) -> OdmResult<DocumentCursor> {
        let query = self.full_text_query(model_name, search, None)?;
        self.find(model_name, query.filter, query.options)
    }

    /// 带关联解析的查询
    pub fn find_with_relations(
        &self,
        model_name: &str,
        filter: Vec<QueryConditionGroup>,
        options: QueryOptions,
    ) -> OdmResult<DocumentCursor> {
        RelationResolver::new(self).resolve(model_name, filter, options)
    }

    /// 按标识读取并解析全部关联
    pub async fn get_entry_with_relations(&self, model_name: &str, id: &str) -> OdmResult<Document> {
        let filter = vec![QueryCondition::eq(ID_FIELD, id_value(id)).into()];
        let cursor = self.find_with_relations(model_name, filter, QueryOptions::new())?;
        match cursor.first().await? {
            Some(document) => Ok(document),
            None => Err(OdmError::NotFound {
                id: id.to_string(),
                collection: cursor.target().collection.clone(),
            }),
        }
    }
}
