use serde::{Deserialize, Serialize};

use crate::types::query::{QueryConditionGroup, SortConfig};

/// 聚合管道阶段
///
/// 仅覆盖关联解析需要的阶段：过滤、关联、排序与分页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// $match
    Match(Vec<QueryConditionGroup>),
    /// $lookup，结果总是数组
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// $sort
    Sort(Vec<SortConfig>),
    /// $skip
    Skip(u64),
    /// $limit
    Limit(u64),
}
