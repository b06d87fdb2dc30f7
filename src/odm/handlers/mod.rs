//! # 文档映射器操作
//!
//! 按操作类型分离，每个文件都是 DocumentMapper 的一个 impl 块

pub mod create_handler;
pub mod read_handler;
pub mod update_handler;
pub mod delete_handler;
pub mod maintenance_handler;

pub use read_handler::{build_full_text_query, FullTextQuery};
