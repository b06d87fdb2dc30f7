//! 字段值类型转换
//!
//! 纯函数，按声明类型把原始值转换为存储值。无法合理转换的输入
//! 得到该类型最接近的默认值；标识转换失败得到 `Null`，不会报错。

use crate::model::field_types::FieldType;
use crate::types::DataValue;
use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static INTEGER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d+").expect("整数前缀正则无效")
});

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("浮点前缀正则无效")
});

/// 按声明类型转换字段值
///
/// 对同一类型重复转换结果不变：`cast(t, cast(t, v)) == cast(t, v)`
pub fn cast(field_type: &FieldType, value: DataValue) -> DataValue {
    match field_type {
        FieldType::Id => cast_id(value),
        FieldType::Integer => DataValue::Int(to_integer(&value)),
        FieldType::Float => DataValue::Float(to_float(&value)),
        FieldType::Boolean => DataValue::Bool(to_boolean(&value)),
        FieldType::String => DataValue::String(to_string(&value)),
        FieldType::Array => cast_array(value),
        FieldType::Object => cast_object(value),
        FieldType::DateTime => cast_datetime(value),
        FieldType::Mixed => value,
    }
}

/// 可选类型的转换，未声明类型的字段原样返回
pub fn cast_optional(field_type: Option<&FieldType>, value: DataValue) -> DataValue {
    match field_type {
        Some(field_type) => cast(field_type, value),
        None => value,
    }
}

fn cast_id(value: DataValue) -> DataValue {
    match value {
        DataValue::ObjectId(_) => value,
        DataValue::String(s) => match ObjectId::parse_str(s.trim()) {
            Ok(oid) => DataValue::ObjectId(oid),
            Err(e) => {
                crate::debug_log!("标识转换失败，置为空值: {} ({})", s, e);
                DataValue::Null
            }
        },
        _ => DataValue::Null,
    }
}

fn finite_or_zero(f: f64) -> f64 {
    if f.is_finite() { f } else { 0.0 }
}

fn to_integer(value: &DataValue) -> i64 {
    match value {
        DataValue::Null => 0,
        DataValue::Bool(b) => *b as i64,
        DataValue::Int(i) => *i,
        // `as` 在溢出时饱和
        DataValue::Float(f) => finite_or_zero(*f) as i64,
        DataValue::String(s) => parse_integer(s),
        DataValue::DateTime(dt) => dt.timestamp(),
        DataValue::ObjectId(_) => 1,
        DataValue::Array(items) => (!items.is_empty()) as i64,
        DataValue::Object(map) => (!map.is_empty()) as i64,
    }
}

fn parse_integer(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return i;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return finite_or_zero(f) as i64;
    }
    if let Some(m) = FLOAT_PREFIX.find(trimmed) {
        if let Ok(f) = m.as_str().parse::<f64>() {
            return finite_or_zero(f) as i64;
        }
    }
    INTEGER_PREFIX
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

fn to_float(value: &DataValue) -> f64 {
    match value {
        DataValue::Null => 0.0,
        DataValue::Bool(b) => if *b { 1.0 } else { 0.0 },
        DataValue::Int(i) => *i as f64,
        DataValue::Float(f) => finite_or_zero(*f),
        DataValue::String(s) => parse_float(s),
        DataValue::DateTime(dt) => dt.timestamp() as f64,
        DataValue::ObjectId(_) => 1.0,
        DataValue::Array(items) => if items.is_empty() { 0.0 } else { 1.0 },
        DataValue::Object(map) => if map.is_empty() { 0.0 } else { 1.0 },
    }
}

fn parse_float(raw: &str) -> f64 {
    let trimmed = raw.trim();
    // "inf"、"NaN" 这类文本不算数字
    if let Some(m) = FLOAT_PREFIX.find(trimmed) {
        if let Ok(f) = m.as_str().parse::<f64>() {
            return finite_or_zero(f);
        }
    }
    0.0
}

fn to_boolean(value: &DataValue) -> bool {
    match value {
        DataValue::Null => false,
        DataValue::Bool(b) => *b,
        DataValue::Int(i) => *i != 0,
        DataValue::Float(f) => *f != 0.0,
        DataValue::String(s) => !(s.is_empty() || s == "0"),
        DataValue::DateTime(_) | DataValue::ObjectId(_) => true,
        DataValue::Array(items) => !items.is_empty(),
        DataValue::Object(map) => !map.is_empty(),
    }
}

fn to_string(value: &DataValue) -> String {
    match value {
        DataValue::Null => String::new(),
        DataValue::Bool(true) => "1".to_string(),
        DataValue::Bool(false) => String::new(),
        DataValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cast_array(value: DataValue) -> DataValue {
    match value {
        // 关联数组保持为对象
        DataValue::Array(_) | DataValue::Object(_) => value,
        DataValue::Null => DataValue::Array(Vec::new()),
        scalar => DataValue::Array(vec![scalar]),
    }
}

fn cast_object(value: DataValue) -> DataValue {
    match value {
        DataValue::Object(_) => value,
        DataValue::Null => DataValue::Object(HashMap::new()),
        DataValue::Array(items) => DataValue::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        scalar => {
            let mut map = HashMap::new();
            map.insert("scalar".to_string(), scalar);
            DataValue::Object(map)
        }
    }
}

fn cast_datetime(value: DataValue) -> DataValue {
    match value {
        DataValue::DateTime(_) => value,
        DataValue::Int(millis) => millis_to_datetime(millis),
        DataValue::Float(f) if f.is_finite() => millis_to_datetime(f as i64),
        DataValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| DataValue::DateTime(dt.with_timezone(&Utc)))
            .unwrap_or(DataValue::Null),
        _ => DataValue::Null,
    }
}

fn millis_to_datetime(millis: i64) -> DataValue {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(DataValue::DateTime)
        .unwrap_or(DataValue::Null)
}
