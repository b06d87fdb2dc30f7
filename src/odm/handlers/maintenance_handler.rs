//! # 索引与数据库维护

use crate::error::OdmResult;
use crate::odm::DocumentMapper;
use rat_logger::{info, warn};

impl DocumentMapper {
    /// 创建模型声明的全部索引，返回索引名
    pub async fn ensure_indexes(&self, model_name: &str) -> OdmResult<Vec<String>> {
        let model = self.model(model_name)?;
        let target = self.target(&model.meta);
        let mut names = Vec::with_capacity(model.meta.indexes.len());
        for index in &model.meta.indexes {
            let name = self.store.create_index(&target, index).await?;
            info!("创建索引: {} {}", target, name);
            names.push(name);
        }
        Ok(names)
    }

    /// 删除当前租户的数据库
    pub async fn drop_database(&self) -> OdmResult<()> {
        let database = self.database_name();
        warn!("删除数据库: {}", database);
        self.store.drop_database(&database).await
    }
}
