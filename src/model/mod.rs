//! 模型定义模块
//!
//! 模型描述符、字段类型转换与按字段处理器

pub mod field_types;
pub mod convenience;
pub mod caster;
pub mod handlers;

pub use field_types::{
    FieldDefinition, FieldType, IndexDefinition, ModelMeta, RelationDefinition,
    relation_result_field,
};
pub use convenience::*;
pub use caster::cast;
pub use handlers::{Accessor, FieldHandlers, ModelDefinition, Mutator};
