//! 文档属性存储
//!
//! 一个文档持有字段值、自上次保存以来的变更字段、存储分配的标识
//! 以及解析得到的关联结果。文档独占自己的状态，不与其它文档共享。

pub mod path;

use crate::error::{OdmError, OdmResult};
use crate::model::{relation_result_field, ModelDefinition, ModelMeta};
use crate::types::DataValue;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;

/// 存储中的标识字段名
pub const ID_FIELD: &str = "_id";

#[derive(Clone)]
pub struct Document {
    model: Arc<ModelDefinition>,
    id: Option<ObjectId>,
    fields: HashMap<String, DataValue>,
    changed_fields: Vec<String>,
    relations: HashMap<String, Vec<Document>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("model", &self.model.meta.model_name)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("changed_fields", &self.changed_fields)
            .field("relations", &self.relations)
            .finish()
    }
}

impl Document {
    /// 绑定到模型的空白文档
    pub fn new(model: Arc<ModelDefinition>) -> Self {
        Self {
            model,
            id: None,
            fields: HashMap::new(),
            changed_fields: Vec::new(),
            relations: HashMap::new(),
        }
    }

    /// 由已加载的数据构建文档，不记录变更
    pub fn from_parts(
        model: Arc<ModelDefinition>,
        id: Option<ObjectId>,
        fields: HashMap<String, DataValue>,
    ) -> Self {
        Self {
            model,
            id,
            fields,
            changed_fields: Vec::new(),
            relations: HashMap::new(),
        }
    }

    pub fn model(&self) -> &Arc<ModelDefinition> {
        &self.model
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.model.meta
    }

    pub fn model_name(&self) -> &str {
        &self.model.meta.model_name
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// 标识只能设置一次
    pub fn adopt_id(&mut self, id: ObjectId) -> OdmResult<()> {
        match self.id {
            Some(existing) if existing != id => Err(OdmError::Validation {
                field: ID_FIELD.to_string(),
                message: format!("文档标识 {} 已分配，不能改为 {}", existing, id),
            }),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    pub fn fields(&self) -> &HashMap<String, DataValue> {
        &self.fields
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// 读取字段，应用访问器
    pub fn get(&self, name: &str) -> Option<DataValue> {
        self.fields
            .get(name)
            .map(|value| self.model.handlers.access(name, value))
    }

    /// 写入字段：修改器或类型转换之后保存，不记录变更
    pub fn set(&mut self, name: &str, value: impl Into<DataValue>) -> OdmResult<()> {
        let stored = self.model.transform(name, value.into())?;
        self.fields.insert(name.to_string(), stored);
        Ok(())
    }

    /// 按点号路径读取原始值
    pub fn get_path(&self, dotted: &str) -> Option<&DataValue> {
        path::lookup(&self.fields, dotted)
    }

    /// 从内存中删除路径指向的叶子，路径不存在时返回 false 且不修改状态
    pub fn remove_path(&mut self, dotted: &str) -> bool {
        path::remove(&mut self.fields, dotted)
    }

    /// 与当前值比较，不同时记录字段名（只记一次）并提交新值
    ///
    /// 返回是否发生了变化
    pub fn mark_changed(&mut self, name: &str, value: impl Into<DataValue>) -> OdmResult<bool> {
        let stored = self.model.transform(name, value.into())?;
        if self.fields.get(name) == Some(&stored) {
            return Ok(false);
        }
        if !self.changed_fields.iter().any(|field| field == name) {
            self.changed_fields.push(name.to_string());
        }
        self.fields.insert(name.to_string(), stored);
        Ok(true)
    }

    pub fn changed_fields(&self) -> &[String] {
        &self.changed_fields
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changed_fields.iter().any(|field| field == name)
    }

    pub fn clear_changed(&mut self) {
        self.changed_fields.clear();
    }

    /// 已解析的关联结果，按关联名查找
    pub fn related(&self, name: &str) -> Option<&[Document]> {
        self.relations
            .get(&relation_result_field(name))
            .map(Vec::as_slice)
    }

    /// 全部关联结果，键为 `local_<name>`
    pub fn relations(&self) -> &HashMap<String, Vec<Document>> {
        &self.relations
    }

    /// 挂载关联结果，覆盖同名的旧结果
    pub fn attach_relation(&mut self, name: &str, documents: Vec<Document>) {
        self.relations.insert(relation_result_field(name), documents);
    }

    /// 存储布局：字段加上 `_id`（如有）
    pub fn to_raw(&self) -> HashMap<String, DataValue> {
        let mut raw = self.fields.clone();
        if let Some(id) = self.id {
            raw.insert(ID_FIELD.to_string(), DataValue::ObjectId(id));
        }
        raw
    }
}
