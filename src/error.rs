//! 错误类型定义
//!
//! 核心只产生带类型的错误值，面向用户的格式化交给外层（API、CLI）

use thiserror::Error;

/// 文档映射器统一错误类型
#[derive(Error, Debug)]
pub enum OdmError {
    /// 按ID查找时没有匹配的文档
    #[error("在集合 '{collection}' 中未找到ID为 '{id}' 的文档")]
    NotFound { id: String, collection: String },

    /// 驱动拒绝了插入（例如唯一索引冲突）
    #[error("插入集合 '{collection}' 失败: {message}")]
    Insert { collection: String, message: String },

    /// 存储驱动错误，原样向上传递
    #[error("存储驱动错误: {message}")]
    Driver { message: String },

    /// 钩子执行失败，操作在后续步骤之前中止
    #[error("钩子 {hook} 执行失败: {source}")]
    Hook {
        hook: String,
        #[source]
        source: anyhow::Error,
    },

    /// 字段校验失败
    #[error("字段校验失败: {field} - {message}")]
    Validation { field: String, message: String },

    /// 模型未注册
    #[error("模型 '{model}' 未注册")]
    ModelNotRegistered { model: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config { message: String },

    /// 序列化错误
    #[error("数据序列化失败: {message}")]
    Serialization { message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 统一结果类型
pub type OdmResult<T> = Result<T, OdmError>;

impl From<serde_json::Error> for OdmError {
    fn from(e: serde_json::Error) -> Self {
        OdmError::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for OdmError {
    fn from(e: mongodb::error::Error) -> Self {
        OdmError::Driver {
            message: e.to_string(),
        }
    }
}

/// 快速构建常用错误
///
/// ```ignore
/// odm_error!(config, "日志级别必须设置");
/// odm_error!(validation, "title", "标题不能为空");
/// ```
#[macro_export]
macro_rules! odm_error {
    (config, $msg:expr) => {
        $crate::error::OdmError::Config {
            message: ($msg).to_string(),
        }
    };
    (driver, $msg:expr) => {
        $crate::error::OdmError::Driver {
            message: ($msg).to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::OdmError::Serialization {
            message: ($msg).to_string(),
        }
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::OdmError::Validation {
            field: ($field).to_string(),
            message: ($msg).to_string(),
        }
    };
    (not_registered, $model:expr) => {
        $crate::error::OdmError::ModelNotRegistered {
            model: ($model).to_string(),
        }
    };
}
