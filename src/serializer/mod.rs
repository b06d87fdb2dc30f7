//! 文档序列化
//!
//! 把文档展开为可传输的 JSON 映射：标识转为字符串放在 `id` 下，
//! 时间转为 ISO-8601，嵌套结构递归展开，关联结果总是附加在顶层。

use crate::document::Document;
use crate::error::{OdmError, OdmResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 序列化输出中的标识键
pub const ID_KEY: &str = "id";

/// 序列化选项
///
/// `include` 与 `exclude` 互斥，同时给出时 `include` 生效
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializeOptions {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    fn keeps(&self, key: &str) -> bool {
        match (&self.include, &self.exclude) {
            (Some(include), _) => include.iter().any(|k| k == key),
            (None, Some(exclude)) => !exclude.iter().any(|k| k == key),
            (None, None) => true,
        }
    }
}

/// 序列化文档，不修改源文档
pub fn serialize(document: &Document, options: &SerializeOptions) -> Map<String, Value> {
    let mut output = Map::new();

    if options.keeps(ID_KEY) {
        let id = document
            .id()
            .map(|id| Value::String(id.to_hex()))
            .unwrap_or(Value::Null);
        output.insert(ID_KEY.to_string(), id);
    }

    for (name, value) in document.fields() {
        if options.keeps(name) {
            output.insert(name.clone(), value.to_json_value());
        }
    }

    // 关联键不受 include/exclude 影响
    let full = SerializeOptions::new();
    for (key, related) in document.relations() {
        let items = related
            .iter()
            .map(|child| Value::Object(serialize(child, &full)))
            .collect();
        output.insert(key.clone(), Value::Array(items));
    }

    output
}

/// 序列化为 JSON 字符串
pub fn serialize_to_json_string(document: &Document, options: &SerializeOptions) -> OdmResult<String> {
    serde_json::to_string(&serialize(document, options))
        .map_err(|e| OdmError::Serialization { message: format!("文档序列化失败: {}", e) })
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(serialize(self, &SerializeOptions::new())))
    }
}
