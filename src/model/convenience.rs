//! 模型便捷函数模块
//!
//! 提供创建各种字段类型的便捷函数

use crate::model::field_types::{FieldDefinition, FieldType};

/// 便捷函数：创建标识字段（引用其它文档）
pub fn id_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Id)
}

/// 便捷函数：创建整数字段
pub fn integer_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Integer)
}

/// 便捷函数：创建浮点数字段
pub fn float_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Float)
}

/// 便捷函数：创建布尔字段
pub fn boolean_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Boolean)
}

/// 便捷函数：创建字符串字段
pub fn string_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::String)
}

/// 便捷函数：创建数组字段
/// 在 MongoDB 中使用原生数组
pub fn array_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Array)
}

/// 便捷函数：创建列表字段（array_field 的别名）
pub fn list_field() -> FieldDefinition {
    array_field()
}

/// 便捷函数：创建对象字段
pub fn object_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Object)
}

/// 便捷函数：创建日期时间字段
pub fn datetime_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::DateTime)
}

/// 便捷函数：创建不做类型转换的字段
pub fn mixed_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Mixed)
}
