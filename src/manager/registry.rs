//! 模型注册表：模型描述符提供者

use crate::error::{OdmError, OdmResult};
use crate::model::ModelDefinition;
use dashmap::DashMap;
use rat_logger::debug;
use std::sync::Arc;

/// 模型注册表
///
/// 注册在并发使用之前完成，之后只读
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册模型定义，同名模型会被替换
    pub fn register(&self, definition: ModelDefinition) -> Arc<ModelDefinition> {
        let name = definition.meta.model_name.clone();
        if self.models.contains_key(&name) {
            debug!("模型已存在，将更新元数据: {}", name);
        }
        let definition = Arc::new(definition);
        self.models.insert(name.clone(), definition.clone());
        debug!(
            "注册模型: 名称={}, 集合={}, 字段数量={}, 关联数量={}",
            name,
            definition.meta.collection_name,
            definition.meta.fields.len(),
            definition.meta.relations.len()
        );
        definition
    }

    /// 获取模型定义
    pub fn describe(&self, model_name: &str) -> OdmResult<Arc<ModelDefinition>> {
        self.models
            .get(model_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| OdmError::ModelNotRegistered {
                model: model_name.to_string(),
            })
    }

    /// 检查模型是否已注册
    pub fn contains(&self, model_name: &str) -> bool {
        self.models.contains_key(model_name)
    }

    /// 已注册的模型名称
    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|entry| entry.key().clone()).collect()
    }
}
