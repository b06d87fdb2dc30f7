//! 点号路径访问
//!
//! 路径按 `.` 分段，依次穿过嵌套对象与数组（数组段为下标）。

use crate::types::DataValue;
use std::collections::HashMap;

fn split(path: &str) -> Option<Vec<&str>> {
    let splits: Vec<&str> = path.split('.').collect();
    if splits.iter().any(|segment| segment.is_empty()) {
        None
    } else {
        Some(splits)
    }
}

/// 按路径查找值，路径不存在返回 None（与存在但为 Null 的值区分）
pub fn lookup<'a>(root: &'a HashMap<String, DataValue>, path: &str) -> Option<&'a DataValue> {
    let splits = split(path)?;
    let (first, rest) = splits.split_first()?;
    let mut current = root.get(*first)?;
    for segment in rest {
        current = step(current, segment)?;
    }
    Some(current)
}

fn step<'a>(value: &'a DataValue, segment: &str) -> Option<&'a DataValue> {
    match value {
        DataValue::Object(map) => map.get(segment),
        DataValue::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut DataValue, segment: &str) -> Option<&'a mut DataValue> {
    match value {
        DataValue::Object(map) => map.get_mut(segment),
        DataValue::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |index| items.get_mut(index)),
        _ => None,
    }
}

/// 删除路径指向的叶子，不创建中间结构
///
/// 数组元素被置为 Null 而不是移除，保持其余下标不变
pub fn remove(root: &mut HashMap<String, DataValue>, path: &str) -> bool {
    let Some(splits) = split(path) else {
        return false;
    };
    let Some((leaf, parents)) = splits.split_last() else {
        return false;
    };
    let Some((first, middle)) = parents.split_first() else {
        return root.remove(*leaf).is_some();
    };

    let Some(mut current) = root.get_mut(*first) else {
        return false;
    };
    for segment in middle {
        match step_mut(current, segment) {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        DataValue::Object(map) => map.remove(*leaf).is_some(),
        DataValue::Array(items) => match leaf.parse::<usize>().ok().and_then(|index| items.get_mut(index)) {
            Some(slot) => {
                *slot = DataValue::Null;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// 按路径写入值，缺失的中间层创建为对象
///
/// 途经非容器值、或数组下标超出末尾时失败返回 false
pub fn assign(root: &mut HashMap<String, DataValue>, path: &str, value: DataValue) -> bool {
    let Some(splits) = split(path) else {
        return false;
    };
    let Some((first, rest)) = splits.split_first() else {
        return false;
    };
    if rest.is_empty() {
        root.insert(first.to_string(), value);
        return true;
    }
    let slot = root
        .entry(first.to_string())
        .or_insert_with(|| DataValue::Object(HashMap::new()));
    assign_into(slot, rest, value)
}

fn assign_into(target: &mut DataValue, splits: &[&str], value: DataValue) -> bool {
    let Some((key, rest)) = splits.split_first() else {
        *target = value;
        return true;
    };
    let slot = match target {
        DataValue::Object(map) => map
            .entry(key.to_string())
            .or_insert_with(|| DataValue::Object(HashMap::new())),
        DataValue::Array(items) => {
            let Ok(index) = key.parse::<usize>() else {
                return false;
            };
            // 只允许改写已有元素或在末尾追加一个
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Greater => return false,
                std::cmp::Ordering::Equal => items.push(DataValue::Null),
                std::cmp::Ordering::Less => {}
            }
            if rest.is_empty() {
                items[index] = value;
                return true;
            }
            let slot = &mut items[index];
            if slot.is_null() {
                *slot = DataValue::Object(HashMap::new());
            }
            slot
        }
        _ => return false,
    };
    if rest.is_empty() {
        *slot = value;
        true
    } else {
        assign_into(slot, rest, value)
    }
}
