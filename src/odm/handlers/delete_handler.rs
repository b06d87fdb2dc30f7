//! # 删除处理

use crate::adapter::id_filter;
use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use crate::hooks::HookKind;
use crate::odm::manager_core::require_id;
use crate::odm::DocumentMapper;
use rat_logger::{debug, info};

impl DocumentMapper {
    /// 删除已加载的文档：beforeDelete → 按标识删除 → afterDelete
    ///
    /// 返回驱动报告的删除数量
    pub async fn delete(&self, document: &mut Document) -> OdmResult<u64> {
        let id = require_id(document)?;
        let ctx = self.hook_context();
        let model = document.model().clone();
        let target = self.target(&model.meta);

        model.hooks.run(HookKind::BeforeDelete, document, &ctx)?;
        let deleted = self.store.delete_one(&target, &id_filter(id)).await?;
        info!("删除文档: {} id={} deleted={}", target, id, deleted);
        model.hooks.run(HookKind::AfterDelete, document, &ctx)?;

        Ok(deleted)
    }

    /// 按标识删除：先加载文档，再走带钩子的删除流程
    ///
    /// 文档不存在时返回 0
    pub async fn delete_by_id(&self, model_name: &str, id: &str) -> OdmResult<u64> {
        let mut document = match self.get_by_id(model_name, id).await {
            Ok(document) => document,
            Err(OdmError::NotFound { collection, .. }) => {
                debug!("按标识删除: {} 中没有 id={}", collection, id);
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        self.delete(&mut document).await
    }
}
