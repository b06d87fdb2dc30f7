//! rat_docmap - MongoDB 文档对象映射库
//!
//! 以模型描述符驱动字段类型转换、变更跟踪、生命周期钩子、
//! 批量赋值保护、关联解析与全文检索查询构建；
//! 存储驱动通过 DocumentStore trait 接入，内置 MongoDB 与内存实现

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod model;
pub mod document;
pub mod hooks;
pub mod adapter;
pub mod manager;
pub mod odm;
pub mod relation;
pub mod serializer;
pub mod config;

// 重新导出常用类型和函数
pub use error::{OdmError, OdmResult};
pub use types::*;
pub use model::{
    cast, FieldDefinition, FieldType, IndexDefinition, ModelDefinition, ModelMeta, RelationDefinition,
    array_field, boolean_field, datetime_field, float_field, id_field, integer_field, list_field,
    mixed_field, object_field, string_field,
};
pub use document::Document;
pub use hooks::{HookContext, HookKind, HookRegistry, IdentityProvider, StaticIdentity};
pub use adapter::{CollectionTarget, DocumentStore, MemoryStore, MongoStore, UpdateOutcome};
pub use manager::{
    global_registry, register_model, CollectionResolver, ModelRegistry, SingleDatabaseResolver,
    TenantDatabaseResolver,
};
pub use odm::{DocumentCursor, DocumentMapper, FullTextQuery, DEFAULT_SEARCH_LIMIT};
pub use relation::{FieldValue, RelationResolver};
pub use serializer::{serialize, serialize_to_json_string, SerializeOptions};
pub use config::{
    init_logging, LogLevel, LoggingConfig, LoggingConfigBuilder, MongoConfig, MongoConfigBuilder, OdmConfig,
    OdmConfigBuilder,
};

// 日志系统导入
use rat_logger::info;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// 初始化rat_docmap库
///
/// 日志系统由调用者负责初始化（见 [`init_logging`]）
pub fn init() {
    info!("{} 初始化完成", get_info());
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
