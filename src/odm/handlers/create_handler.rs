//! # 创建与保存

use crate::adapter::ID_FIELD;
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::hooks::{HookContext, HookKind};
use crate::model::{cast, FieldType};
use crate::odm::DocumentMapper;
use crate::types::DataValue;
use mongodb::bson::oid::ObjectId;
use rat_logger::{debug, info};
use std::collections::HashMap;

impl DocumentMapper {
    /// 创建文档
    ///
    /// 全部字段经过修改器或类型转换写入，随后执行
    /// beforeCreate → 插入 → 记录标识 → afterCreate
    pub async fn create(&self, model_name: &str, fields: HashMap<String, DataValue>) -> OdmResult<Document> {
        let mut document = self.instantiate(model_name)?;
        for (name, value) in fields {
            if name == ID_FIELD || name == "id" {
                continue;
            }
            document.mark_changed(&name, value)?;
        }
        let ctx = self.hook_context();
        self.insert_document(&mut document, &ctx).await?;
        Ok(document)
    }

    /// 通用保存：有标识时更新，否则创建，外层包裹 beforeSave/afterSave
    ///
    /// 变更字段在保存开始时清空
    pub async fn save(&self, document: &mut Document) -> OdmResult<()> {
        let ctx = self.hook_context();
        let model = document.model().clone();
        document.clear_changed();
        model.hooks.run(HookKind::BeforeSave, document, &ctx)?;
        if document.id().is_some() {
            self.update_document(document, &ctx).await?;
        } else {
            self.insert_document(document, &ctx).await?;
        }
        model.hooks.run(HookKind::AfterSave, document, &ctx)
    }

    /// 按输入数据新增或更新
    ///
    /// `id` 能转换为标识且文档存在时加载该文档，否则新建；
    /// 随后只赋值模型声明的字段并保存
    pub async fn add_or_update_entry(&self, model_name: &str, data: HashMap<String, DataValue>) -> OdmResult<Document> {
        let existing_id = data
            .get("id")
            .cloned()
            .map(|raw| cast(&FieldType::Id, raw))
            .and_then(|value| value.as_object_id());

        let mut document = match existing_id {
            Some(id) => match self.get_by_id(model_name, &id.to_hex()).await {
                Ok(document) => document,
                Err(OdmError::NotFound { .. }) => {
                    debug!("标识 {} 不存在，新建文档", id);
                    self.instantiate(model_name)?
                }
                Err(e) => return Err(e),
            },
            None => self.instantiate(model_name)?,
        };

        self.assign(&mut document, &data)?;
        self.save(&mut document).await?;
        Ok(document)
    }

    pub(crate) async fn insert_document(&self, document: &mut Document, ctx: &HookContext) -> OdmResult<()> {
        let model = document.model().clone();
        let target = self.target(&model.meta);
        let fresh_id = ObjectId::new();

        model.hooks.run(HookKind::BeforeCreate, document, ctx)?;

        let mut raw = document.fields().clone();
        raw.insert(ID_FIELD.to_string(), DataValue::ObjectId(fresh_id));
        let inserted = self
            .store
            .insert_one(&target, raw)
            .await
            .map_err(|e| OdmError::Insert {
                collection: target.collection.clone(),
                message: e.to_string(),
            })?;
        document.adopt_id(inserted)?;
        info!("创建文档: {} id={}", target, inserted);

        model.hooks.run(HookKind::AfterCreate, document, ctx)
    }
}
