//! 字段类型定义模块
//!
//! 定义模型描述符：字段类型、默认值、关联、全文检索字段、排序与索引

use crate::types::{DataValue, SortConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 字段类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// 存储标识类型
    Id,
    /// 整数类型
    Integer,
    /// 浮点数类型
    Float,
    /// 布尔类型
    Boolean,
    /// 字符串类型
    String,
    /// 数组类型
    Array,
    /// 对象类型
    Object,
    /// 日期时间类型
    DateTime,
    /// 未声明具体类型，值原样保留
    Mixed,
}

/// 字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 字段类型
    pub field_type: FieldType,
    /// 默认值
    pub default: Option<DataValue>,
    /// 字段描述
    pub description: Option<String>,
}

impl FieldDefinition {
    /// 创建新的字段定义
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default: None,
            description: None,
        }
    }

    /// 设置默认值
    pub fn default_value(mut self, value: impl Into<DataValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 设置字段描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 关联定义
///
/// 本地字段保存目标模型文档的标识，解析结果挂在 `local_<name>` 下
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// 关联名称
    pub name: String,
    /// 本地字段
    pub local_field: String,
    /// 目标模型名称
    pub target_model: String,
}

impl RelationDefinition {
    pub fn new(
        name: impl Into<String>,
        local_field: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_field: local_field.into(),
            target_model: target_model.into(),
        }
    }

    /// 关联结果字段名
    pub fn result_field(&self) -> String {
        relation_result_field(&self.name)
    }
}

/// 关联结果字段名：`local_<name>`
pub fn relation_result_field(name: &str) -> String {
    format!("local_{}", name)
}

/// 索引定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// 索引字段
    pub fields: Vec<String>,
    /// 是否唯一索引
    pub unique: bool,
    /// 索引名称
    pub name: Option<String>,
}

impl IndexDefinition {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            unique: false,
            name: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// 模型元数据（模型描述符）
///
/// 注册后在进程生命周期内只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// 模型名称
    pub model_name: String,
    /// 集合名
    pub collection_name: String,
    /// 字段定义
    pub fields: HashMap<String, FieldDefinition>,
    /// 关联定义
    pub relations: Vec<RelationDefinition>,
    /// 全文检索字段
    pub search_fields: Vec<String>,
    /// 默认排序
    pub sort_order: Vec<SortConfig>,
    /// 索引定义
    pub indexes: Vec<IndexDefinition>,
    /// 模型描述
    pub description: Option<String>,
}

impl ModelMeta {
    /// 创建模型元数据，集合名默认与模型名相同
    pub fn new(model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        Self {
            collection_name: model_name.clone(),
            model_name,
            fields: HashMap::new(),
            relations: Vec::new(),
            search_fields: Vec::new(),
            sort_order: Vec::new(),
            indexes: Vec::new(),
            description: None,
        }
    }

    pub fn collection(mut self, collection_name: impl Into<String>) -> Self {
        self.collection_name = collection_name.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    pub fn relation(mut self, relation: RelationDefinition) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn sort_order(mut self, sort: Vec<SortConfig>) -> Self {
        self.sort_order = sort;
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 获取字段声明类型，未声明返回 None
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name).map(|definition| &definition.field_type)
    }

    /// 按名称查找关联
    pub fn find_relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}
