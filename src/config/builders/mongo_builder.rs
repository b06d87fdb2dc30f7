//! # MongoDB 连接配置构建器

use crate::config::core::MongoConfig;
use crate::error::OdmError;
use std::collections::HashMap;

/// MongoDB 连接配置构建器
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    auth_source: Option<String>,
    direct_connection: bool,
    options: HashMap<String, String>,
}

impl MongoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// 设置用户名和密码
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// 设置认证数据库
    pub fn with_auth_source(mut self, auth_source: impl Into<String>) -> Self {
        self.auth_source = Some(auth_source.into());
        self
    }

    /// 启用直接连接
    pub fn with_direct_connection(mut self, direct: bool) -> Self {
        self.direct_connection = direct;
        self
    }

    /// 添加自定义选项
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<MongoConfig, OdmError> {
        let host = self
            .host
            .ok_or_else(|| crate::odm_error!(config, "MongoDB主机地址必须设置"))?;
        let port = self
            .port
            .ok_or_else(|| crate::odm_error!(config, "MongoDB端口必须设置"))?;
        let database = self
            .database
            .ok_or_else(|| crate::odm_error!(config, "MongoDB数据库名必须设置"))?;
        if host.is_empty() {
            return Err(crate::odm_error!(config, "MongoDB主机地址不能为空"));
        }
        if database.is_empty() {
            return Err(crate::odm_error!(config, "MongoDB数据库名不能为空"));
        }
        Ok(MongoConfig {
            host,
            port,
            database,
            username: self.username,
            password: self.password,
            auth_source: self.auth_source,
            direct_connection: self.direct_connection,
            options: self.options,
        })
    }
}
