//! # 更新处理

use crate::adapter::{id_filter, UpdateOutcome, ID_FIELD};
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::hooks::{HookContext, HookKind};
use crate::odm::manager_core::{id_value, require_id};
use crate::odm::DocumentMapper;
use crate::types::*;
use rat_logger::{debug, info};
use std::collections::HashMap;

impl DocumentMapper {
    /// 批量赋值
    ///
    /// 只处理模型声明的字段：输入中存在的字段经类型转换后记录变更，
    /// 文档与输入中都缺少的字段写入声明的默认值；未声明的字段被忽略
    pub fn assign(&self, document: &mut Document, data: &HashMap<String, DataValue>) -> OdmResult<()> {
        let model = document.model().clone();
        for (name, definition) in &model.meta.fields {
            if name == ID_FIELD {
                continue;
            }
            match data.get(name) {
                Some(value) => {
                    if !document.contains(name) {
                        if let Some(default) = &definition.default {
                            document.set(name, default.clone())?;
                        }
                    }
                    document.mark_changed(name, value.clone())?;
                }
                None => {
                    if let (false, Some(default)) = (document.contains(name), &definition.default) {
                        document.mark_changed(name, default.clone())?;
                    }
                }
            }
        }
        let ignored = data
            .keys()
            .filter(|key| !model.meta.fields.contains_key(key.as_str()))
            .count();
        if ignored > 0 {
            debug!("批量赋值忽略了 {} 个未声明字段: {}", ignored, model.name());
        }
        Ok(())
    }

    /// 赋值后保存
    pub async fn update(&self, document: &mut Document, data: &HashMap<String, DataValue>) -> OdmResult<()> {
        self.assign(document, data)?;
        self.save(document).await
    }

    /// 按标识整体替换文档
    ///
    /// 字段按模型声明转换，标识字段被剥离；没有匹配的文档时不报错，
    /// 由调用方检查返回的匹配数
    pub async fn replace_by_id(
        &self,
        model_name: &str,
        id: &str,
        fields: HashMap<String, DataValue>,
    ) -> OdmResult<UpdateOutcome> {
        let model = self.model(model_name)?;
        let target = self.target(&model.meta);
        let mut replacement = HashMap::with_capacity(fields.len());
        for (name, value) in fields {
            if name == ID_FIELD || name == "id" {
                continue;
            }
            let stored = model.transform(&name, value)?;
            replacement.insert(name, stored);
        }
        let outcome = self
            .store
            .replace_one(&target, &id_filter(id_value(id)), replacement)
            .await?;
        debug!("替换文档: {} id={} matched={} modified={}", target, id, outcome.matched, outcome.modified);
        Ok(outcome)
    }

    /// 原子增加数值字段，直接交给驱动执行
    pub async fn increment_by_id(
        &self,
        model_name: &str,
        id: &str,
        field: &str,
        amount: i64,
    ) -> OdmResult<UpdateOutcome> {
        self.apply_by_id(model_name, id, UpdateOperation::increment(field, amount)).await
    }

    /// 原子减少数值字段
    pub async fn decrement_by_id(
        &self,
        model_name: &str,
        id: &str,
        field: &str,
        amount: i64,
    ) -> OdmResult<UpdateOutcome> {
        self.apply_by_id(model_name, id, UpdateOperation::decrement(field, amount)).await
    }

    /// 对已保存的文档执行原子增量，并同步内存中的值
    ///
    /// 内存中的值不是数值时在驱动调用之前失败
    pub async fn increment(&self, document: &mut Document, field: &str, amount: i64) -> OdmResult<UpdateOutcome> {
        let id = require_id(document)?;
        let next = match document.fields().get(field).cloned().unwrap_or(DataValue::Int(0)) {
            DataValue::Int(value) => DataValue::Int(value.saturating_add(amount)),
            DataValue::Float(value) => DataValue::Float(value + amount as f64),
            other => {
                return Err(OdmError::Validation {
                    field: field.to_string(),
                    message: format!("字段不是数值类型: {}", other.type_name()),
                });
            }
        };
        let outcome = self
            .apply_by_id(document.model_name(), &id.to_hex(), UpdateOperation::increment(field, amount))
            .await?;
        document.set(field, next)?;
        Ok(outcome)
    }

    /// 对已保存的文档执行原子减量
    pub async fn decrement(&self, document: &mut Document, field: &str, amount: i64) -> OdmResult<UpdateOutcome> {
        self.increment(document, field, amount.saturating_neg()).await
    }

    /// 删除点号路径指向的字段
    ///
    /// 路径不存在时返回 false 且不做任何修改；文档已保存时先向驱动
    /// 发出只作用于该路径的删除指令，成功后再修改内存
    pub async fn unset_field(&self, document: &mut Document, path: &str) -> OdmResult<bool> {
        if document.get_path(path).is_none() {
            return Ok(false);
        }
        if let Some(id) = document.id() {
            let target = self.target(document.meta());
            self.store
                .update_one(&target, &id_filter(id), &[UpdateOperation::unset(path)])
                .await?;
            debug!("删除字段: {} id={} path={}", target, id, path);
        }
        Ok(document.remove_path(path))
    }

    /// 更新已保存文档：beforeUpdate → `$set` 全部字段 → afterUpdate
    pub(crate) async fn update_document(&self, document: &mut Document, ctx: &HookContext) -> OdmResult<()> {
        let id = require_id(document)?;
        let model = document.model().clone();
        let target = self.target(&model.meta);

        model.hooks.run(HookKind::BeforeUpdate, document, ctx)?;

        let operations: Vec<UpdateOperation> = document
            .fields()
            .iter()
            .map(|(name, value)| UpdateOperation::set(name.clone(), value.clone()))
            .collect();
        let outcome = self.store.update_one(&target, &id_filter(id), &operations).await?;
        if outcome.matched == 0 {
            return Err(OdmError::NotFound {
                id: id.to_hex(),
                collection: target.collection,
            });
        }
        info!("更新文档: {} id={}", target, id);

        model.hooks.run(HookKind::AfterUpdate, document, ctx)
    }

    async fn apply_by_id(&self, model_name: &str, id: &str, operation: UpdateOperation) -> OdmResult<UpdateOutcome> {
        let model = self.model(model_name)?;
        let target = self.target(&model.meta);
        debug!("原子更新: {} id={} field={}", target, id, operation.field);
        self.store
            .update_one(&target, &id_filter(id_value(id)), &[operation])
            .await
    }
}
