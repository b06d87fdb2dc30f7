//! 通用类型定义
//!
//! 数据值、查询条件、更新操作与聚合管道阶段

pub mod data_value;
pub mod query;
pub mod update_operations;
pub mod pipeline;

pub use data_value::{DataValue, json_object_to_data_map, json_value_to_data_value};
pub use query::{QueryCondition, QueryOperator, LogicalOperator, QueryConditionGroup, SortConfig, SortDirection, PaginationConfig, QueryOptions};
pub use update_operations::{UpdateOperator, UpdateOperation};
pub use pipeline::PipelineStage;
