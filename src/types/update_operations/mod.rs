use serde::{Deserialize, Serialize};
use crate::types::data_value::DataValue;

/// 更新操作符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateOperator {
    /// 直接设置值（$set）
    Set,
    /// 删除字段（$unset），值被忽略
    Unset,
    /// 原子性增加（$inc），负值即为减少
    Increment,
}

/// 更新操作定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOperation {
    /// 要更新的字段名（支持点号路径）
    pub field: String,
    /// 更新操作类型
    pub operation: UpdateOperator,
    /// 更新的值
    pub value: DataValue,
}

impl UpdateOperation {
    /// 创建一个设置操作
    pub fn set(field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        Self {
            field: field.into(),
            operation: UpdateOperator::Set,
            value: value.into(),
        }
    }

    /// 创建一个删除字段操作
    pub fn unset(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operation: UpdateOperator::Unset,
            value: DataValue::String(String::new()),
        }
    }

    /// 创建一个增加操作
    pub fn increment(field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        Self {
            field: field.into(),
            operation: UpdateOperator::Increment,
            value: value.into(),
        }
    }

    /// 创建一个减少操作，转换为负数增量
    pub fn decrement(field: impl Into<String>, amount: i64) -> Self {
        Self::increment(field, DataValue::Int(amount.saturating_neg()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_is_negative_increment() {
        let op = UpdateOperation::decrement("views", 3);
        assert_eq!(op.operation, UpdateOperator::Increment);
        assert_eq!(op.value, DataValue::Int(-3));
    }
}
