//! # 文档映射器配置构建器

use crate::config::core::{LoggingConfig, MongoConfig, OdmConfig};
use crate::error::OdmError;
use rat_logger::info;

/// 文档映射器配置构建器
#[derive(Debug, Default)]
pub struct OdmConfigBuilder {
    mongodb: Option<MongoConfig>,
    search_limit: Option<u64>,
    logging: Option<LoggingConfig>,
}

impl OdmConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mongodb(mut self, mongodb: MongoConfig) -> Self {
        self.mongodb = Some(mongodb);
        self
    }

    /// 全文检索默认返回条数
    pub fn search_limit(mut self, search_limit: u64) -> Self {
        self.search_limit = Some(search_limit);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置，将返回错误
    pub fn build(self) -> Result<OdmConfig, OdmError> {
        let mongodb = self
            .mongodb
            .ok_or_else(|| crate::odm_error!(config, "MongoDB配置必须设置"))?;
        let search_limit = self
            .search_limit
            .ok_or_else(|| crate::odm_error!(config, "全文检索条数上限必须设置"))?;
        let logging = self
            .logging
            .ok_or_else(|| crate::odm_error!(config, "日志配置必须设置"))?;
        if search_limit == 0 {
            return Err(crate::odm_error!(config, "全文检索条数上限不能为零"));
        }

        info!("创建映射器配置: 数据库={}, 检索上限={}", mongodb.database, search_limit);
        Ok(OdmConfig {
            search_limit,
            mongodb,
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::core::LogLevel;

    #[test]
    fn test_builder_refuses_missing_items() {
        let err = OdmConfigBuilder::new().search_limit(500).build().unwrap_err();
        assert!(err.to_string().contains("MongoDB"));
        assert!(MongoConfig::builder().host("localhost").port(27017).build().is_err());
    }

    #[test]
    fn test_builder_builds_complete_config() {
        let config = OdmConfig::builder()
            .mongodb(
                MongoConfig::builder()
                    .host("localhost")
                    .port(27017)
                    .database("cms")
                    .build()
                    .unwrap(),
            )
            .search_limit(500)
            .logging(LoggingConfig::builder().level(LogLevel::Info).console(true).build().unwrap())
            .build()
            .unwrap();
        assert_eq!(config.mongodb.build_uri(), "mongodb://localhost:27017/cms");
    }
}
