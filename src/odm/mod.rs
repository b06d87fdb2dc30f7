//! # 文档映射层
//!
//! DocumentMapper 提供面向模型名的增删改查、全文检索与关联解析，
//! 具体操作按职责分布在 handlers 下

pub mod manager_core;
pub mod cursor;
pub mod handlers;

pub use manager_core::{DocumentMapper, DEFAULT_SEARCH_LIMIT};
pub use cursor::DocumentCursor;
pub use handlers::{build_full_text_query, FullTextQuery};
