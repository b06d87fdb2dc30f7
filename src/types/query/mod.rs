use crate::types::data_value::DataValue;
use serde::{Deserialize, Serialize};

/// 查询条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    /// 字段名（支持点号路径）
    pub field: String,
    /// 操作符
    pub operator: QueryOperator,
    /// 值
    pub value: DataValue,
    /// 是否大小写不敏感（仅对正则操作符有效）
    #[serde(default)]
    pub case_insensitive: bool,
}

impl QueryCondition {
    /// 创建新的查询条件
    pub fn new(field: impl Into<String>, operator: QueryOperator, value: impl Into<DataValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            case_insensitive: false,
        }
    }

    /// 等值条件
    pub fn eq(field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        Self::new(field, QueryOperator::Eq, value)
    }

    /// 大小写不敏感的正则匹配
    pub fn regex_ci(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: QueryOperator::Regex,
            value: DataValue::String(pattern.into()),
            case_insensitive: true,
        }
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// AND 逻辑
    And,
    /// OR 逻辑
    Or,
}

/// 查询条件组合
///
/// 过滤器是条件组合的切片，切片中的各项按 AND 组合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryConditionGroup {
    /// 单个条件
    Single(QueryCondition),
    /// 条件组合
    Group {
        /// 逻辑操作符
        operator: LogicalOperator,
        /// 子条件列表
        conditions: Vec<QueryConditionGroup>,
    },
}

impl QueryConditionGroup {
    /// OR 组合
    pub fn or(conditions: Vec<QueryConditionGroup>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            conditions,
        }
    }

    /// AND 组合
    pub fn and(conditions: Vec<QueryConditionGroup>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            conditions,
        }
    }
}

impl From<QueryCondition> for QueryConditionGroup {
    fn from(condition: QueryCondition) -> Self {
        QueryConditionGroup::Single(condition)
    }
}

/// 查询操作符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryOperator {
    /// 等于
    Eq,
    /// 不等于
    Ne,
    /// 大于
    Gt,
    /// 大于等于
    Gte,
    /// 小于
    Lt,
    /// 小于等于
    Lte,
    /// 在列表中
    In,
    /// 不在列表中
    NotIn,
    /// 正则表达式匹配
    Regex,
    /// 字段存在（值为 Bool(false) 时表示不存在）
    Exists,
}

/// 排序配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// 字段名
    pub field: String,
    /// 排序方向
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortDirection {
    /// 升序
    Asc,
    /// 降序
    Desc,
}

/// 分页配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// 跳过的记录数
    pub skip: u64,
    /// 限制返回的记录数
    pub limit: u64,
}

/// 查询选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// 排序配置（多键，按顺序生效）
    pub sort: Vec<SortConfig>,
    /// 分页配置
    pub pagination: Option<PaginationConfig>,
}

impl QueryOptions {
    /// 创建新的查询选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置排序
    pub fn with_sort(mut self, sort: Vec<SortConfig>) -> Self {
        self.sort = sort;
        self
    }

    /// 设置分页
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// 按 limit/skip 设置分页
    pub fn paginate(self, limit: u64, skip: u64) -> Self {
        self.with_pagination(PaginationConfig { skip, limit })
    }
}
