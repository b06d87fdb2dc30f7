//! 生命周期钩子
//!
//! 每个变更操作在固定位置调用具名钩子。钩子同步执行，
//! 可以修改文档字段，修改对随后的驱动调用可见；
//! 钩子失败时操作在驱动调用之前中止。

pub mod identity;

pub use identity::{IdentityProvider, StaticIdentity};

use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::types::DataValue;
use chrono::{DateTime, Utc};
use rat_logger::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// 钩子位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::BeforeCreate => "beforeCreate",
            HookKind::AfterCreate => "afterCreate",
            HookKind::BeforeUpdate => "beforeUpdate",
            HookKind::AfterUpdate => "afterUpdate",
            HookKind::BeforeSave => "beforeSave",
            HookKind::AfterSave => "afterSave",
            HookKind::BeforeDelete => "beforeDelete",
            HookKind::AfterDelete => "afterDelete",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 钩子调用上下文：操作者身份与操作时间
#[derive(Debug, Clone)]
pub struct HookContext {
    pub actor: Option<String>,
    pub now: DateTime<Utc>,
}

impl HookContext {
    pub fn new(actor: Option<String>) -> Self {
        Self::at(actor, Utc::now())
    }

    /// 指定时间，便于测试
    pub fn at(actor: Option<String>, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    pub fn from_provider(provider: &dyn IdentityProvider) -> Self {
        Self::new(provider.current_username())
    }
}

/// 钩子函数
pub type Hook = Arc<dyn Fn(&mut Document, &HookContext) -> anyhow::Result<()> + Send + Sync>;

/// 审计字段名
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const TIMESTAMP_ENTRY_CREATED: &str = "timestamp_entry_created";
pub const TIMESTAMP_ENTRY_LAST_MODIFIED: &str = "timestamp_entry_last_modified";
pub const ENTRY_CREATED_BY: &str = "entry_created_by";
pub const ENTRY_LAST_MODIFIED_BY: &str = "entry_last_modified_by";

/// 钩子注册表，同一位置的钩子按注册顺序执行
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookKind, Vec<Hook>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&'static str, usize> = self
            .hooks
            .iter()
            .map(|(kind, hooks)| (kind.as_str(), hooks.len()))
            .collect();
        f.debug_struct("HookRegistry").field("hooks", &counts).finish()
    }
}

impl HookRegistry {
    /// 空注册表，所有钩子都是空操作
    pub fn new() -> Self {
        Self::default()
    }

    /// 带默认审计钩子的注册表
    ///
    /// - beforeCreate: `created_at`、`timestamp_entry_created`，有操作者时写 `entry_created_by`
    /// - beforeUpdate: `updated_at`，有操作者时写 `entry_last_modified_by`
    /// - beforeSave: `timestamp_entry_last_modified`，有操作者时写 `entry_last_modified_by`
    pub fn with_audit_defaults() -> Self {
        let mut registry = Self::new();
        registry.on(HookKind::BeforeCreate, |doc, ctx| {
            doc.mark_changed(CREATED_AT, DataValue::DateTime(ctx.now))?;
            doc.mark_changed(TIMESTAMP_ENTRY_CREATED, DataValue::DateTime(ctx.now))?;
            if let Some(actor) = &ctx.actor {
                doc.mark_changed(ENTRY_CREATED_BY, DataValue::String(actor.clone()))?;
            }
            Ok(())
        });
        registry.on(HookKind::BeforeUpdate, |doc, ctx| {
            doc.mark_changed(UPDATED_AT, DataValue::DateTime(ctx.now))?;
            if let Some(actor) = &ctx.actor {
                doc.mark_changed(ENTRY_LAST_MODIFIED_BY, DataValue::String(actor.clone()))?;
            }
            Ok(())
        });
        registry.on(HookKind::BeforeSave, |doc, ctx| {
            doc.mark_changed(TIMESTAMP_ENTRY_LAST_MODIFIED, DataValue::DateTime(ctx.now))?;
            if let Some(actor) = &ctx.actor {
                doc.mark_changed(ENTRY_LAST_MODIFIED_BY, DataValue::String(actor.clone()))?;
            }
            Ok(())
        });
        registry
    }

    /// 注册钩子
    pub fn on<F>(&mut self, kind: HookKind, hook: F) -> &mut Self
    where
        F: Fn(&mut Document, &HookContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.entry(kind).or_default().push(Arc::new(hook));
        self
    }

    /// 移除某个位置的全部钩子
    pub fn clear(&mut self, kind: HookKind) -> &mut Self {
        self.hooks.remove(&kind);
        self
    }

    pub fn count(&self, kind: HookKind) -> usize {
        self.hooks.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// 依次执行某个位置的钩子，第一个失败即中止
    pub fn run(&self, kind: HookKind, doc: &mut Document, ctx: &HookContext) -> OdmResult<()> {
        let Some(hooks) = self.hooks.get(&kind) else {
            return Ok(());
        };
        debug!("执行钩子: {} (模型={}, 数量={})", kind, doc.model_name(), hooks.len());
        for hook in hooks {
            hook(&mut *doc, ctx).map_err(|source| OdmError::Hook {
                hook: kind.as_str().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}
