//! 内存存储的条件匹配与排序
//!
//! 语义尽量贴近 MongoDB：数组字段上的条件匹配任一元素，
//! 等值比较中整数与浮点数互通，排序按 BSON 类型顺序。

use crate::adapter::RawDocument;
use crate::document::path;
use crate::error::OdmResult;
use crate::types::*;
use regex::RegexBuilder;
use std::cmp::Ordering;

/// 过滤器各项按 AND 组合，空过滤器匹配全部
pub fn matches(document: &RawDocument, filter: &[QueryConditionGroup]) -> OdmResult<bool> {
    for group in filter {
        if !matches_group(document, group)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_group(document: &RawDocument, group: &QueryConditionGroup) -> OdmResult<bool> {
    match group {
        QueryConditionGroup::Single(condition) => matches_condition(document, condition),
        QueryConditionGroup::Group { conditions, .. } if conditions.is_empty() => Ok(true),
        QueryConditionGroup::Group { operator: LogicalOperator::And, conditions } => {
            for condition in conditions {
                if !matches_group(document, condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        QueryConditionGroup::Group { operator: LogicalOperator::Or, conditions } => {
            for condition in conditions {
                if matches_group(document, condition)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn matches_condition(document: &RawDocument, condition: &QueryCondition) -> OdmResult<bool> {
    let actual = path::lookup(document, &condition.field);
    let expected = &condition.value;
    let result = match condition.operator {
        QueryOperator::Eq => equals_any(actual, expected),
        QueryOperator::Ne => !equals_any(actual, expected),
        QueryOperator::Gt => compares(actual, expected, |o| o == Ordering::Greater),
        QueryOperator::Gte => compares(actual, expected, |o| o != Ordering::Less),
        QueryOperator::Lt => compares(actual, expected, |o| o == Ordering::Less),
        QueryOperator::Lte => compares(actual, expected, |o| o != Ordering::Greater),
        QueryOperator::In => in_list(actual, expected)?,
        QueryOperator::NotIn => !in_list(actual, expected)?,
        QueryOperator::Regex => regex_matches(actual, condition)?,
        QueryOperator::Exists => {
            let wanted = !matches!(expected, DataValue::Bool(false) | DataValue::Null);
            actual.is_some() == wanted
        }
    };
    Ok(result)
}

/// 等值判断；Null 同时匹配缺失字段
pub fn equals_any(actual: Option<&DataValue>, expected: &DataValue) -> bool {
    match actual {
        None => expected.is_null(),
        Some(value) => {
            if values_equal(value, expected) {
                return true;
            }
            match value {
                DataValue::Array(items) => items.iter().any(|item| values_equal(item, expected)),
                _ => false,
            }
        }
    }
}

/// 值相等，整数与浮点数按数值比较
pub fn values_equal(left: &DataValue, right: &DataValue) -> bool {
    match (left, right) {
        (DataValue::Int(a), DataValue::Float(b)) | (DataValue::Float(b), DataValue::Int(a)) => {
            (*a as f64) == *b
        }
        (DataValue::Array(a), DataValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (DataValue::Object(a), DataValue::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

fn compares(actual: Option<&DataValue>, expected: &DataValue, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(value) = actual else {
        return false;
    };
    let check = |candidate: &DataValue| same_class_cmp(candidate, expected).is_some_and(&accept);
    match value {
        DataValue::Array(items) => items.iter().any(check),
        other => check(other),
    }
}

/// 同类值之间的比较，跨类返回 None（范围条件不跨类型匹配）
fn same_class_cmp(left: &DataValue, right: &DataValue) -> Option<Ordering> {
    match (left, right) {
        (DataValue::Int(a), DataValue::Int(b)) => Some(a.cmp(b)),
        (a, b) if is_number(a) && is_number(b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (DataValue::String(a), DataValue::String(b)) => Some(a.cmp(b)),
        (DataValue::DateTime(a), DataValue::DateTime(b)) => Some(a.cmp(b)),
        (DataValue::ObjectId(a), DataValue::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        (DataValue::Bool(a), DataValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn is_number(value: &DataValue) -> bool {
    matches!(value, DataValue::Int(_) | DataValue::Float(_))
}

fn in_list(actual: Option<&DataValue>, expected: &DataValue) -> OdmResult<bool> {
    match expected {
        DataValue::Array(candidates) => Ok(candidates.iter().any(|candidate| equals_any(actual, candidate))),
        other => Err(crate::odm_error!(
            driver,
            format!("$in/$nin 需要数组参数，收到: {}", other.type_name())
        )),
    }
}

fn regex_matches(actual: Option<&DataValue>, condition: &QueryCondition) -> OdmResult<bool> {
    let Some(pattern) = condition.value.as_str() else {
        return Err(crate::odm_error!(
            driver,
            format!("字段 {} 的正则条件必须是字符串", condition.field)
        ));
    };
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(condition.case_insensitive)
        .build()
        .map_err(|e| crate::odm_error!(driver, format!("无效的正则表达式 '{}': {}", pattern, e)))?;

    let is_match = |value: &DataValue| value.as_str().is_some_and(|s| regex.is_match(s));
    Ok(match actual {
        Some(DataValue::Array(items)) => items.iter().any(is_match),
        Some(value) => is_match(value),
        None => false,
    })
}

/// BSON 类型顺序
fn type_rank(value: Option<&DataValue>) -> u8 {
    match value {
        None | Some(DataValue::Null) => 0,
        Some(DataValue::Int(_)) | Some(DataValue::Float(_)) => 1,
        Some(DataValue::String(_)) => 2,
        Some(DataValue::Object(_)) => 3,
        Some(DataValue::Array(_)) => 4,
        Some(DataValue::ObjectId(_)) => 5,
        Some(DataValue::Bool(_)) => 6,
        Some(DataValue::DateTime(_)) => 7,
    }
}

/// 排序比较
pub fn sort_cmp(left: Option<&DataValue>, right: Option<&DataValue>) -> Ordering {
    let rank = type_rank(left).cmp(&type_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }
    match (left, right) {
        (Some(a), Some(b)) => same_class_cmp(a, b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// 按多键排序，稳定排序保留插入顺序
pub fn sort_documents(documents: &mut [RawDocument], sort: &[SortConfig]) {
    if sort.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for key in sort {
            let ordering = sort_cmp(path::lookup(a, &key.field), path::lookup(b, &key.field));
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::json_object_to_data_map;
    use serde_json::json;

    fn doc() -> RawDocument {
        json_object_to_data_map(json!({
            "title": "Hello Rust",
            "views": 10,
            "tags": ["db", "odm"],
            "meta": { "lang": "en" }
        }))
    }

    #[test]
    fn test_equality_and_arrays() {
        let d = doc();
        assert!(matches(&d, &[QueryCondition::eq("tags", "odm").into()]).unwrap());
        assert!(matches(&d, &[QueryCondition::eq("views", 10.0).into()]).unwrap());
        assert!(matches(&d, &[QueryCondition::eq("missing", DataValue::Null).into()]).unwrap());
        assert!(!matches(&d, &[QueryCondition::eq("meta.lang", "de").into()]).unwrap());
    }

    #[test]
    fn test_or_of_case_insensitive_regex() {
        let d = doc();
        let filter = vec![QueryConditionGroup::or(vec![
            QueryCondition::regex_ci("meta.lang", "^EN$").into(),
            QueryCondition::regex_ci("title", "python").into(),
        ])];
        assert!(matches(&d, &filter).unwrap());
    }

    #[test]
    fn test_ranges_do_not_cross_types() {
        let d = doc();
        assert!(matches(&d, &[QueryCondition::new("views", QueryOperator::Gte, 10).into()]).unwrap());
        assert!(!matches(&d, &[QueryCondition::new("views", QueryOperator::Gt, "1").into()]).unwrap());
    }

    #[test]
    fn test_sort_puts_missing_first() {
        let mut docs = vec![
            json_object_to_data_map(json!({ "n": 2 })),
            json_object_to_data_map(json!({})),
            json_object_to_data_map(json!({ "n": 1.5 })),
        ];
        sort_documents(&mut docs, &[SortConfig::asc("n")]);
        assert_eq!(docs[0].get("n"), None);
        assert_eq!(docs[1].get("n"), Some(&DataValue::Float(1.5)));
    }
}
