//! MongoDB工具函数模块
//!
//! DataValue 与 BSON 之间的转换

use crate::adapter::RawDocument;
use crate::types::DataValue;
use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use std::collections::HashMap;

/// 将DataValue转换为BSON值
pub fn data_value_to_bson(value: &DataValue) -> Bson {
    match value {
        DataValue::Null => Bson::Null,
        DataValue::Bool(b) => Bson::Boolean(*b),
        DataValue::Int(i) => Bson::Int64(*i),
        DataValue::Float(f) => Bson::Double(*f),
        DataValue::String(s) => Bson::String(s.clone()),
        DataValue::DateTime(dt) => {
            Bson::DateTime(mongodb::bson::DateTime::from_system_time((*dt).into()))
        }
        DataValue::ObjectId(oid) => Bson::ObjectId(*oid),
        DataValue::Array(arr) => Bson::Array(arr.iter().map(data_value_to_bson).collect()),
        DataValue::Object(obj) => Bson::Document(data_map_to_document(obj)),
    }
}

/// 将字段映射转换为BSON文档
pub fn data_map_to_document(map: &HashMap<String, DataValue>) -> Document {
    let mut document = Document::new();
    for (key, value) in map {
        document.insert(key, data_value_to_bson(value));
    }
    document
}

/// 将BSON值转换为DataValue
pub fn bson_to_data_value(bson: &Bson) -> DataValue {
    match bson {
        Bson::Null | Bson::Undefined => DataValue::Null,
        Bson::Boolean(b) => DataValue::Bool(*b),
        Bson::Int32(i) => DataValue::Int(*i as i64),
        Bson::Int64(i) => DataValue::Int(*i),
        Bson::Double(d) => DataValue::Float(*d),
        Bson::String(s) => DataValue::String(s.clone()),
        Bson::DateTime(dt) => DataValue::DateTime(DateTime::<Utc>::from(dt.to_system_time())),
        Bson::ObjectId(oid) => DataValue::ObjectId(*oid),
        Bson::Array(arr) => DataValue::Array(arr.iter().map(bson_to_data_value).collect()),
        Bson::Document(doc) => DataValue::Object(document_to_raw(doc)),
        Bson::Decimal128(decimal) => DataValue::String(decimal.to_string()),
        Bson::Symbol(symbol) => DataValue::String(symbol.clone()),
        Bson::JavaScriptCode(code) => DataValue::String(code.clone()),
        Bson::RegularExpression(regex) => DataValue::String(format!("/{}/{}", regex.pattern, regex.options)),
        other => DataValue::String(other.to_string()),
    }
}

/// 将BSON文档转换为原始文档
pub fn document_to_raw(document: &Document) -> RawDocument {
    document
        .iter()
        .map(|(key, value)| (key.clone(), bson_to_data_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn test_bson_conversion_preserves_types() {
        let oid = ObjectId::new();
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let source = doc! {
            "_id": oid,
            "count": 3_i32,
            "at": mongodb::bson::DateTime::from_system_time(when.into()),
            "tags": ["a", "b"],
        };

        let raw = document_to_raw(&source);
        assert_eq!(raw.get("_id"), Some(&DataValue::ObjectId(oid)));
        assert_eq!(raw.get("count"), Some(&DataValue::Int(3)));
        assert_eq!(raw.get("at"), Some(&DataValue::DateTime(when)));

        let back = data_map_to_document(&raw);
        assert_eq!(back.get_object_id("_id").unwrap(), oid);
        assert_eq!(back.get_i64("count").unwrap(), 3);
    }
}
