//! MongoDB适配器模块
//!
//! - adapter.rs: DocumentStore trait实现
//! - utils.rs: BSON数据转换工具函数
//! - query_builder.rs: 过滤、更新、管道文档的纯构建函数

pub mod adapter;
pub mod utils;
pub mod query_builder;

// 重新导出核心类型
pub use adapter::MongoStore;
pub use query_builder::{build_filter_document, build_pipeline, build_sort_document, build_update_document};
