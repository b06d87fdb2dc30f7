//! 按字段注册的访问器与修改器，以及完整的模型定义

use crate::error::OdmResult;
use crate::hooks::{HookContext, HookKind, HookRegistry};
use crate::document::Document;
use crate::model::caster;
use crate::model::field_types::ModelMeta;
use crate::types::DataValue;
use std::collections::HashMap;
use std::sync::Arc;

/// 读取时对存储值做变换
pub type Accessor = Arc<dyn Fn(&DataValue) -> DataValue + Send + Sync>;
/// 写入时计算存储值，替代默认的类型转换
pub type Mutator = Arc<dyn Fn(DataValue) -> OdmResult<DataValue> + Send + Sync>;

/// 字段处理器注册表
#[derive(Clone, Default)]
pub struct FieldHandlers {
    accessors: HashMap<String, Accessor>,
    mutators: HashMap<String, Mutator>,
}

impl std::fmt::Debug for FieldHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldHandlers")
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .field("mutators", &self.mutators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FieldHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_accessor<F>(&mut self, field: impl Into<String>, accessor: F)
    where
        F: Fn(&DataValue) -> DataValue + Send + Sync + 'static,
    {
        self.accessors.insert(field.into(), Arc::new(accessor));
    }

    pub fn set_mutator<F>(&mut self, field: impl Into<String>, mutator: F)
    where
        F: Fn(DataValue) -> OdmResult<DataValue> + Send + Sync + 'static,
    {
        self.mutators.insert(field.into(), Arc::new(mutator));
    }

    /// 应用访问器，未注册时返回原值
    pub fn access(&self, field: &str, value: &DataValue) -> DataValue {
        match self.accessors.get(field) {
            Some(accessor) => accessor(value),
            None => value.clone(),
        }
    }

    pub fn mutator(&self, field: &str) -> Option<&Mutator> {
        self.mutators.get(field)
    }
}

/// 模型定义：描述符 + 字段处理器 + 钩子
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub meta: ModelMeta,
    pub handlers: FieldHandlers,
    pub hooks: HookRegistry,
}

impl ModelDefinition {
    /// 创建模型定义，安装默认审计钩子
    pub fn new(meta: ModelMeta) -> Self {
        Self {
            meta,
            handlers: FieldHandlers::new(),
            hooks: HookRegistry::with_audit_defaults(),
        }
    }

    /// 不带任何钩子的模型定义
    pub fn bare(meta: ModelMeta) -> Self {
        Self {
            meta,
            handlers: FieldHandlers::new(),
            hooks: HookRegistry::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// 追加钩子
    pub fn on<F>(mut self, kind: HookKind, hook: F) -> Self
    where
        F: Fn(&mut Document, &HookContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.on(kind, hook);
        self
    }

    pub fn accessor<F>(mut self, field: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&DataValue) -> DataValue + Send + Sync + 'static,
    {
        self.handlers.set_accessor(field, accessor);
        self
    }

    pub fn mutator<F>(mut self, field: impl Into<String>, mutator: F) -> Self
    where
        F: Fn(DataValue) -> OdmResult<DataValue> + Send + Sync + 'static,
    {
        self.handlers.set_mutator(field, mutator);
        self
    }

    pub fn name(&self) -> &str {
        &self.meta.model_name
    }

    /// 计算字段的存储值：有修改器走修改器，否则按声明类型转换
    pub fn transform(&self, field: &str, value: DataValue) -> OdmResult<DataValue> {
        match self.handlers.mutator(field) {
            Some(mutator) => mutator(value),
            None => Ok(caster::cast_optional(self.meta.field_type(field), value)),
        }
    }
}
