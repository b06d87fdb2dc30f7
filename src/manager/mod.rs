//! 模型注册与集合定位
//!
//! 提供进程级的模型注册表与物理集合解析策略

mod registry;
mod resolver;

pub use registry::ModelRegistry;
pub use resolver::{CollectionResolver, SingleDatabaseResolver, TenantDatabaseResolver};

use crate::model::ModelDefinition;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// 全局模型注册表实例
pub static GLOBAL_MODEL_REGISTRY: Lazy<Arc<ModelRegistry>> =
    Lazy::new(|| Arc::new(ModelRegistry::new()));

/// 获取全局模型注册表
pub fn global_registry() -> Arc<ModelRegistry> {
    GLOBAL_MODEL_REGISTRY.clone()
}

/// 便捷函数 - 向全局注册表注册模型
pub fn register_model(definition: ModelDefinition) -> Arc<ModelDefinition> {
    GLOBAL_MODEL_REGISTRY.register(definition)
}
