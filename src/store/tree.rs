//! Pure operations on a JSON document tree with the hosted store's rules:
//! nulls and empty objects do not exist, arrays become index-keyed objects.

use serde_json::{Map, Value};

pub fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let map: Map<String, Value> = items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| normalize(item).map(|item| (i.to_string(), item)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, item)| normalize(item).map(|item| (key, item)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        scalar => Some(scalar),
    }
}

pub fn get<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let node = segments
        .iter()
        .try_fold(root, |node, segment| node.get(segment.as_str()))?;
    (!node.is_null()).then_some(node)
}

fn get_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    segments.iter().try_fold(root, |node, segment| {
        node.as_object_mut()?.get_mut(segment.as_str())
    })
}

pub fn set(root: &mut Value, segments: &[String], value: Value) {
    let Some(value) = normalize(value) else {
        remove(root, segments);
        return;
    };

    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map.entry(segment.as_str()).or_insert(Value::Null);
    }
    *node = value;
}

pub fn remove(root: &mut Value, segments: &[String]) {
    let Some((last, parent)) = segments.split_last() else {
        *root = Value::Null;
        return;
    };
    if let Some(Value::Object(map)) = get_mut(root, parent) {
        map.remove(last.as_str());
    }
    prune(root, parent);
}

fn prune(root: &mut Value, segments: &[String]) {
    for depth in (0..=segments.len()).rev() {
        let prefix = &segments[..depth];
        let empty = matches!(get_mut(root, prefix), Some(Value::Object(map)) if map.is_empty());
        if !empty {
            break;
        }
        match prefix.split_last() {
            Some((last, parent)) => {
                if let Some(Value::Object(map)) = get_mut(root, parent) {
                    map.remove(last.as_str());
                }
            }
            None => *root = Value::Null,
        }
    }
}
