//! MongoDB查询构建器模块
//!
//! 把带类型的过滤条件、更新操作与管道阶段翻译为 BSON 文档。
//! 全部是纯函数，线上的文档形状无需服务器即可测试。

use crate::adapter::mongodb::utils::data_value_to_bson;
use crate::error::{OdmError, OdmResult};
use crate::types::*;
use mongodb::bson::{Bson, Document, doc};
use rat_logger::debug;

/// 构建过滤文档，多个条件组合用 `$and` 连接
pub fn build_filter_document(filter: &[QueryConditionGroup]) -> OdmResult<Document> {
    let mut group_docs = Vec::new();
    for group in filter {
        let group_doc = build_group_document(group)?;
        if !group_doc.is_empty() {
            group_docs.push(group_doc);
        }
    }

    let query_doc = match group_docs.len() {
        0 => Document::new(),
        1 => group_docs.remove(0),
        _ => doc! { "$and": group_docs },
    };
    debug!("[MongoDB] 完成查询文档构建: {:?}", query_doc);
    Ok(query_doc)
}

fn build_group_document(group: &QueryConditionGroup) -> OdmResult<Document> {
    match group {
        QueryConditionGroup::Single(condition) => build_condition_document(condition),
        QueryConditionGroup::Group { operator, conditions } => {
            let mut condition_docs = Vec::new();
            for condition in conditions {
                let condition_doc = build_group_document(condition)?;
                if !condition_doc.is_empty() {
                    condition_docs.push(condition_doc);
                }
            }
            if condition_docs.is_empty() {
                return Ok(Document::new());
            }
            if condition_docs.len() == 1 {
                return Ok(condition_docs.remove(0));
            }
            let operator_key = match operator {
                LogicalOperator::And => "$and",
                LogicalOperator::Or => "$or",
            };
            Ok(doc! { operator_key: condition_docs })
        }
    }
}

fn build_condition_document(condition: &QueryCondition) -> OdmResult<Document> {
    let field_name = condition.field.as_str();
    let bson_value = data_value_to_bson(&condition.value);

    let condition_doc = match condition.operator {
        QueryOperator::Eq => doc! { field_name: bson_value },
        QueryOperator::Ne => doc! { field_name: { "$ne": bson_value } },
        QueryOperator::Gt => doc! { field_name: { "$gt": bson_value } },
        QueryOperator::Gte => doc! { field_name: { "$gte": bson_value } },
        QueryOperator::Lt => doc! { field_name: { "$lt": bson_value } },
        QueryOperator::Lte => doc! { field_name: { "$lte": bson_value } },
        QueryOperator::In | QueryOperator::NotIn => {
            let Bson::Array(items) = bson_value else {
                return Err(OdmError::Validation {
                    field: condition.field.clone(),
                    message: "In/NotIn操作符需要数组值".to_string(),
                });
            };
            let operator_key = if condition.operator == QueryOperator::In { "$in" } else { "$nin" };
            doc! { field_name: { operator_key: items } }
        }
        QueryOperator::Regex => {
            let Bson::String(pattern) = bson_value else {
                return Err(OdmError::Validation {
                    field: condition.field.clone(),
                    message: "Regex操作符只支持字符串类型".to_string(),
                });
            };
            if condition.case_insensitive {
                doc! { field_name: { "$regex": pattern, "$options": "i" } }
            } else {
                doc! { field_name: { "$regex": pattern } }
            }
        }
        QueryOperator::Exists => {
            let wanted = !matches!(condition.value, DataValue::Bool(false) | DataValue::Null);
            doc! { field_name: { "$exists": wanted } }
        }
    };
    Ok(condition_doc)
}

/// 构建更新文档：`$set`、`$unset`、`$inc`
pub fn build_update_document(update: &[UpdateOperation]) -> Document {
    let mut set_doc = Document::new();
    let mut unset_doc = Document::new();
    let mut inc_doc = Document::new();

    for operation in update {
        match operation.operation {
            UpdateOperator::Set => {
                set_doc.insert(&operation.field, data_value_to_bson(&operation.value));
            }
            UpdateOperator::Unset => {
                unset_doc.insert(&operation.field, "");
            }
            UpdateOperator::Increment => {
                inc_doc.insert(&operation.field, data_value_to_bson(&operation.value));
            }
        }
    }

    let mut update_doc = Document::new();
    if !set_doc.is_empty() {
        update_doc.insert("$set", set_doc);
    }
    if !unset_doc.is_empty() {
        update_doc.insert("$unset", unset_doc);
    }
    if !inc_doc.is_empty() {
        update_doc.insert("$inc", inc_doc);
    }
    update_doc
}

/// 构建排序文档，升序为 1，降序为 -1
pub fn build_sort_document(sort: &[SortConfig]) -> Document {
    let mut sort_doc = Document::new();
    for sort_config in sort {
        let direction = match sort_config.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        sort_doc.insert(&sort_config.field, direction);
    }
    sort_doc
}

/// 构建聚合管道
pub fn build_pipeline(pipeline: &[PipelineStage]) -> OdmResult<Vec<Document>> {
    let mut stages = Vec::with_capacity(pipeline.len());
    for stage in pipeline {
        let stage_doc = match stage {
            PipelineStage::Match(filter) => doc! { "$match": build_filter_document(filter)? },
            PipelineStage::Lookup { from, local_field, foreign_field, as_field } => doc! {
                "$lookup": {
                    "from": from,
                    "localField": local_field,
                    "foreignField": foreign_field,
                    "as": as_field,
                }
            },
            PipelineStage::Sort(sort) => doc! { "$sort": build_sort_document(sort) },
            PipelineStage::Skip(skip) => doc! { "$skip": *skip as i64 },
            PipelineStage::Limit(limit) => doc! { "$limit": *limit as i64 },
        };
        stages.push(stage_doc);
    }
    debug!("[MongoDB] 构建聚合管道: {:?}", stages);
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_with_or_of_regex() {
        let filter = vec![
            QueryCondition::eq("status", "published").into(),
            QueryConditionGroup::or(vec![
                QueryCondition::regex_ci("title", "rust").into(),
                QueryCondition::regex_ci("body", "rust").into(),
            ]),
        ];
        let document = build_filter_document(&filter).unwrap();
        assert_eq!(
            document,
            doc! { "$and": [
                { "status": "published" },
                { "$or": [
                    { "title": { "$regex": "rust", "$options": "i" } },
                    { "body": { "$regex": "rust", "$options": "i" } },
                ] },
            ] }
        );
    }

    #[test]
    fn test_empty_filter_is_empty_document() {
        assert!(build_filter_document(&[]).unwrap().is_empty());
        assert!(build_filter_document(&[QueryConditionGroup::or(vec![])]).unwrap().is_empty());
    }

    #[test]
    fn test_update_groups_operators() {
        let update = vec![
            UpdateOperation::set("title", "x"),
            UpdateOperation::unset("meta.draft"),
            UpdateOperation::increment("views", 1),
        ];
        assert_eq!(
            build_update_document(&update),
            doc! {
                "$set": { "title": "x" },
                "$unset": { "meta.draft": "" },
                "$inc": { "views": 1_i64 },
            }
        );
    }

    #[test]
    fn test_relation_pipeline_shape() {
        let pipeline = vec![
            PipelineStage::Match(vec![QueryCondition::eq("status", "published").into()]),
            PipelineStage::Lookup {
                from: "users".to_string(),
                local_field: "author".to_string(),
                foreign_field: "_id".to_string(),
                as_field: "local_author".to_string(),
            },
        ];
        assert_eq!(
            build_pipeline(&pipeline).unwrap(),
            vec![
                doc! { "$match": { "status": "published" } },
                doc! { "$lookup": {
                    "from": "users",
                    "localField": "author",
                    "foreignField": "_id",
                    "as": "local_author",
                } },
            ]
        );
    }

    #[test]
    fn test_in_requires_array() {
        let filter = vec![QueryCondition::new("tag", QueryOperator::In, "x").into()];
        assert!(matches!(build_filter_document(&filter), Err(OdmError::Validation { .. })));
    }
}
