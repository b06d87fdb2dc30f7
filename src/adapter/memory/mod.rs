//! 进程内文档存储
//!
//! 与 MongoDB 适配器遵守同一契约：条件过滤、正则、排序分页、
//! `$set`/`$unset`/`$inc`、`$lookup` 与唯一索引。每次调用在一个
//! 临界区内完成，对单个文档是原子的。

pub mod matcher;

use crate::adapter::{
    default_index_name, CollectionTarget, DocumentStore, DocumentStream, RawDocument, UpdateOutcome,
    ID_FIELD,
};
use crate::document::path;
use crate::error::{OdmError, OdmResult};
use crate::model::IndexDefinition;
use crate::types::*;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mongodb::bson::oid::ObjectId;
use parking_lot::Mutex;
use rat_logger::debug;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<RawDocument>,
    indexes: Vec<IndexDefinition>,
}

impl MemoryCollection {
    fn position(&self, filter: &[QueryConditionGroup]) -> OdmResult<Option<usize>> {
        for (index, document) in self.documents.iter().enumerate() {
            if matcher::matches(document, filter)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// 检查 `candidate` 放在位置 `skip` 上时是否违反唯一约束
    fn check_unique(&self, target: &CollectionTarget, candidate: &RawDocument, skip: Option<usize>) -> OdmResult<()> {
        let id_index = IndexDefinition::new(vec![ID_FIELD.to_string()]).unique();
        let unique_indexes = std::iter::once(&id_index).chain(self.indexes.iter().filter(|index| index.unique));
        for index in unique_indexes {
            let key = index_key(candidate, index);
            let duplicate = self
                .documents
                .iter()
                .enumerate()
                .any(|(position, other)| Some(position) != skip && index_key(other, index) == key);
            if duplicate {
                return Err(duplicate_key_error(target, index, &key));
            }
        }
        Ok(())
    }
}

fn index_key(document: &RawDocument, index: &IndexDefinition) -> Vec<DataValue> {
    index
        .fields
        .iter()
        .map(|field| path::lookup(document, field).cloned().unwrap_or(DataValue::Null))
        .collect()
}

fn duplicate_key_error(target: &CollectionTarget, index: &IndexDefinition, key: &[DataValue]) -> OdmError {
    crate::odm_error!(
        driver,
        format!(
            "E11000 duplicate key error collection: {} index: {} dup key: {:?}",
            target,
            default_index_name(index),
            key
        )
    )
}

/// 内存文档存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: Mutex<HashMap<String, HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 集合中的文档数量
    pub fn count(&self, target: &CollectionTarget) -> usize {
        self.databases
            .lock()
            .get(&target.database)
            .and_then(|collections| collections.get(&target.collection))
            .map(|collection| collection.documents.len())
            .unwrap_or(0)
    }

    /// 已存在的数据库名
    pub fn database_names(&self) -> Vec<String> {
        self.databases.lock().keys().cloned().collect()
    }

    fn read<T>(&self, target: &CollectionTarget, f: impl FnOnce(Option<&MemoryCollection>) -> OdmResult<T>) -> OdmResult<T> {
        let databases = self.databases.lock();
        let collection = databases
            .get(&target.database)
            .and_then(|collections| collections.get(&target.collection));
        f(collection)
    }

    fn write<T>(&self, target: &CollectionTarget, f: impl FnOnce(&mut MemoryCollection) -> OdmResult<T>) -> OdmResult<T> {
        let mut databases = self.databases.lock();
        let collection = databases
            .entry(target.database.clone())
            .or_default()
            .entry(target.collection.clone())
            .or_default();
        f(collection)
    }
}

fn paginate(documents: Vec<RawDocument>, skip: u64, limit: u64) -> Vec<RawDocument> {
    let skipped = documents.into_iter().skip(skip as usize);
    // limit 为 0 表示不限制
    if limit == 0 {
        skipped.collect()
    } else {
        skipped.take(limit as usize).collect()
    }
}

fn into_stream(documents: Vec<RawDocument>) -> DocumentStream {
    stream::iter(documents.into_iter().map(Ok)).boxed()
}

fn apply_update(document: &mut RawDocument, update: &[UpdateOperation]) -> OdmResult<()> {
    for operation in update {
        match operation.operation {
            UpdateOperator::Set => {
                if !path::assign(document, &operation.field, operation.value.clone()) {
                    return Err(crate::odm_error!(
                        driver,
                        format!("无法在路径 '{}' 上设置值", operation.field)
                    ));
                }
            }
            UpdateOperator::Unset => {
                path::remove(document, &operation.field);
            }
            UpdateOperator::Increment => {
                let current = path::lookup(document, &operation.field).cloned();
                let next = increment_value(&operation.field, current, &operation.value)?;
                if !path::assign(document, &operation.field, next) {
                    return Err(crate::odm_error!(
                        driver,
                        format!("无法在路径 '{}' 上执行 $inc", operation.field)
                    ));
                }
            }
        }
    }
    Ok(())
}

fn increment_value(field: &str, current: Option<DataValue>, amount: &DataValue) -> OdmResult<DataValue> {
    let non_numeric = |what: &DataValue| {
        crate::odm_error!(
            driver,
            format!("Cannot apply $inc to a value of non-numeric type: 字段 '{}' 为 {}", field, what.type_name())
        )
    };
    match (current, amount) {
        (None, DataValue::Int(_) | DataValue::Float(_)) => Ok(amount.clone()),
        (Some(DataValue::Int(a)), DataValue::Int(b)) => a
            .checked_add(*b)
            .map(DataValue::Int)
            .ok_or_else(|| crate::odm_error!(driver, format!("字段 '{}' 的 $inc 结果溢出", field))),
        (Some(DataValue::Int(a)), DataValue::Float(b)) => Ok(DataValue::Float(a as f64 + b)),
        (Some(DataValue::Float(a)), DataValue::Int(b)) => Ok(DataValue::Float(a + *b as f64)),
        (Some(DataValue::Float(a)), DataValue::Float(b)) => Ok(DataValue::Float(a + b)),
        (Some(other), DataValue::Int(_) | DataValue::Float(_)) => Err(non_numeric(&other)),
        (_, other) => Err(non_numeric(other)),
    }
}

fn lookup_stage(
    databases: &HashMap<String, HashMap<String, MemoryCollection>>,
    target: &CollectionTarget,
    documents: &mut [RawDocument],
    from: &str,
    local_field: &str,
    foreign_field: &str,
    as_field: &str,
) {
    let foreign: &[RawDocument] = databases
        .get(&target.database)
        .and_then(|collections| collections.get(from))
        .map(|collection| collection.documents.as_slice())
        .unwrap_or(&[]);

    for document in documents.iter_mut() {
        let local = path::lookup(document, local_field).cloned().unwrap_or(DataValue::Null);
        let joined: Vec<DataValue> = foreign
            .iter()
            .filter(|candidate| {
                let foreign_value = path::lookup(candidate, foreign_field);
                match &local {
                    DataValue::Array(items) => items.iter().any(|item| matcher::equals_any(foreign_value, item)),
                    value => matcher::equals_any(foreign_value, value),
                }
            })
            .map(|candidate| DataValue::Object(candidate.clone()))
            .collect();
        path::assign(document, as_field, DataValue::Array(joined));
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, target: &CollectionTarget, mut document: RawDocument) -> OdmResult<ObjectId> {
        let id = match document.get(ID_FIELD) {
            Some(DataValue::ObjectId(id)) => *id,
            Some(other) => {
                return Err(crate::odm_error!(
                    driver,
                    format!("_id 必须是标识类型，收到: {}", other.type_name())
                ));
            }
            None => {
                let id = ObjectId::new();
                document.insert(ID_FIELD.to_string(), DataValue::ObjectId(id));
                id
            }
        };
        self.write(target, |collection| {
            collection.check_unique(target, &document, None)?;
            collection.documents.push(document);
            Ok(())
        })?;
        debug!("内存存储插入文档: {} id={}", target, id);
        Ok(id)
    }

    async fn find_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<Option<RawDocument>> {
        self.read(target, |collection| {
            let Some(collection) = collection else {
                return Ok(None);
            };
            Ok(collection.position(filter)?.map(|index| collection.documents[index].clone()))
        })
    }

    async fn find(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        options: &QueryOptions,
    ) -> OdmResult<DocumentStream> {
        let mut documents = self.read(target, |collection| {
            let mut found = Vec::new();
            for document in collection.map(|c| c.documents.as_slice()).unwrap_or(&[]) {
                if matcher::matches(document, filter)? {
                    found.push(document.clone());
                }
            }
            Ok(found)
        })?;
        matcher::sort_documents(&mut documents, &options.sort);
        let documents = match &options.pagination {
            Some(pagination) => paginate(documents, pagination.skip, pagination.limit),
            None => documents,
        };
        debug!("内存存储查询: {} 命中 {} 条", target, documents.len());
        Ok(into_stream(documents))
    }

    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        update: &[UpdateOperation],
    ) -> OdmResult<UpdateOutcome> {
        self.write(target, |collection| {
            let Some(position) = collection.position(filter)? else {
                return Ok(UpdateOutcome::default());
            };
            let mut updated = collection.documents[position].clone();
            apply_update(&mut updated, update)?;
            let modified = updated != collection.documents[position];
            if modified {
                collection.check_unique(target, &updated, Some(position))?;
                collection.documents[position] = updated;
            }
            Ok(UpdateOutcome {
                matched: 1,
                modified: modified as u64,
            })
        })
    }

    async fn replace_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        mut replacement: RawDocument,
    ) -> OdmResult<UpdateOutcome> {
        self.write(target, |collection| {
            let Some(position) = collection.position(filter)? else {
                return Ok(UpdateOutcome::default());
            };
            let existing_id = collection.documents[position].get(ID_FIELD).cloned();
            let new_id = replacement.get(ID_FIELD).cloned();
            match (new_id, existing_id) {
                (Some(new_id), Some(old_id)) if new_id != old_id => {
                    return Err(crate::odm_error!(
                        driver,
                        "替换文档不能修改不可变字段 _id"
                    ));
                }
                (None, Some(old_id)) => {
                    replacement.insert(ID_FIELD.to_string(), old_id);
                }
                _ => {}
            }
            let modified = replacement != collection.documents[position];
            if modified {
                collection.check_unique(target, &replacement, Some(position))?;
                collection.documents[position] = replacement;
            }
            Ok(UpdateOutcome {
                matched: 1,
                modified: modified as u64,
            })
        })
    }

    async fn delete_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<u64> {
        self.write(target, |collection| match collection.position(filter)? {
            Some(position) => {
                collection.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        })
    }

    async fn aggregate(&self, target: &CollectionTarget, pipeline: &[PipelineStage]) -> OdmResult<DocumentStream> {
        let databases = self.databases.lock();
        let mut documents: Vec<RawDocument> = databases
            .get(&target.database)
            .and_then(|collections| collections.get(&target.collection))
            .map(|collection| collection.documents.clone())
            .unwrap_or_default();

        for stage in pipeline {
            match stage {
                PipelineStage::Match(filter) => {
                    let mut kept = Vec::with_capacity(documents.len());
                    for document in documents {
                        if matcher::matches(&document, filter)? {
                            kept.push(document);
                        }
                    }
                    documents = kept;
                }
                PipelineStage::Lookup { from, local_field, foreign_field, as_field } => {
                    lookup_stage(&databases, target, &mut documents, from, local_field, foreign_field, as_field);
                }
                PipelineStage::Sort(sort) => matcher::sort_documents(&mut documents, sort),
                PipelineStage::Skip(skip) => documents = paginate(documents, *skip, 0),
                PipelineStage::Limit(limit) => documents = paginate(documents, 0, *limit),
            }
        }
        debug!("内存存储聚合: {} 阶段数={} 结果={}", target, pipeline.len(), documents.len());
        Ok(into_stream(documents))
    }

    async fn create_index(&self, target: &CollectionTarget, index: &IndexDefinition) -> OdmResult<String> {
        let name = default_index_name(index);
        self.write(target, |collection| {
            if index.unique {
                for (position, document) in collection.documents.iter().enumerate() {
                    let key = index_key(document, index);
                    let clash = collection.documents[position + 1..]
                        .iter()
                        .any(|other| index_key(other, index) == key);
                    if clash {
                        return Err(duplicate_key_error(target, index, &key));
                    }
                }
            }
            collection.indexes.retain(|existing| default_index_name(existing) != name);
            collection.indexes.push(index.clone());
            Ok(())
        })?;
        debug!("内存存储创建索引: {} {}", target, name);
        Ok(name)
    }

    async fn drop_database(&self, database: &str) -> OdmResult<()> {
        self.databases.lock().remove(database);
        debug!("内存存储删除数据库: {}", database);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::id_filter;
    use futures::TryStreamExt;

    fn target() -> CollectionTarget {
        CollectionTarget::new("app", "articles")
    }

    fn raw(pairs: &[(&str, DataValue)]) -> RawDocument {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn test_increment_creates_and_adds() {
        let store = MemoryStore::new();
        let id = store.insert_one(&target(), raw(&[("title", "a".into())])).await.unwrap();

        store
            .update_one(&target(), &id_filter(id), &[UpdateOperation::increment("views", 2)])
            .await
            .unwrap();
        let outcome = store
            .update_one(&target(), &id_filter(id), &[UpdateOperation::decrement("views", 1)])
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });
        let found = store.find_one(&target(), &id_filter(id)).await.unwrap().unwrap();
        assert_eq!(found.get("views"), Some(&DataValue::Int(1)));
    }

    #[tokio::test]
    async fn test_increment_rejects_strings() {
        let store = MemoryStore::new();
        let id = store.insert_one(&target(), raw(&[("views", "many".into())])).await.unwrap();
        let result = store
            .update_one(&target(), &id_filter(id), &[UpdateOperation::increment("views", 1)])
            .await;
        assert!(matches!(result, Err(OdmError::Driver { .. })));
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let store = MemoryStore::new();
        let index = IndexDefinition::new(vec!["slug".to_string()]).unique();
        store.create_index(&target(), &index).await.unwrap();
        store.insert_one(&target(), raw(&[("slug", "x".into())])).await.unwrap();

        let err = store.insert_one(&target(), raw(&[("slug", "x".into())])).await.unwrap_err();
        assert!(err.to_string().contains("E11000"));
        assert_eq!(store.count(&target()), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_identifier() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(&target(), raw(&[("title", "a".into()), ("extra", 1.into())]))
            .await
            .unwrap();
        store
            .replace_one(&target(), &id_filter(id), raw(&[("title", "b".into())]))
            .await
            .unwrap();

        let found = store.find_one(&target(), &id_filter(id)).await.unwrap().unwrap();
        assert_eq!(found.get(ID_FIELD), Some(&DataValue::ObjectId(id)));
        assert_eq!(found.get("extra"), None);
    }

    #[tokio::test]
    async fn test_find_sorts_and_paginates() {
        let store = MemoryStore::new();
        for n in [3, 1, 2, 5, 4] {
            store.insert_one(&target(), raw(&[("n", n.into())])).await.unwrap();
        }
        let options = QueryOptions::new().with_sort(vec![SortConfig::desc("n")]).paginate(2, 1);
        let docs: Vec<RawDocument> = store.find(&target(), &[], &options).await.unwrap().try_collect().await.unwrap();
        let values: Vec<_> = docs.iter().map(|d| d.get("n").cloned()).collect();
        assert_eq!(values, vec![Some(DataValue::Int(4)), Some(DataValue::Int(3))]);
    }

    #[tokio::test]
    async fn test_lookup_joins_sibling_collection() {
        let store = MemoryStore::new();
        let users = target().sibling("users");
        let author = store.insert_one(&users, raw(&[("name", "ann".into())])).await.unwrap();
        store
            .insert_one(&target(), raw(&[("author", DataValue::ObjectId(author))]))
            .await
            .unwrap();

        let pipeline = vec![PipelineStage::Lookup {
            from: "users".to_string(),
            local_field: "author".to_string(),
            foreign_field: ID_FIELD.to_string(),
            as_field: "local_author".to_string(),
        }];
        let docs: Vec<RawDocument> = store.aggregate(&target(), &pipeline).await.unwrap().try_collect().await.unwrap();
        match docs[0].get("local_author") {
            Some(DataValue::Array(joined)) => assert_eq!(joined.len(), 1),
            other => panic!("关联结果应为数组: {:?}", other),
        }
    }
}
