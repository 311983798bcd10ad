// Deterministic, filesystem-free folding of profile documents plus a
// final override tree into one effective policy.
//
// Precedence is left-to-right with right bias: the later value wins for
// scalars, maps merge key-wise, and lists concatenate earlier-first.
// Type conflicts are never errors; the later value's kind replaces the
// earlier one (last-wins).
use super::model::{EffectivePolicy, PolicyDocument};
use super::value::{Value, ValueMap};

/// Recursively merge `incoming` over `base`
pub fn deep_merge(base: Value, incoming: Value) -> Value {
    match (base, incoming) {
        (Value::Map(base), Value::Map(incoming)) => Value::Map(merge_maps(base, incoming)),
        (Value::List(mut base), Value::List(incoming)) => {
            base.extend(incoming);
            Value::List(base)
        }
        (_, incoming) => incoming,
    }
}

/// Key-wise map merge under the same rules as [`deep_merge`]
pub fn merge_maps(mut base: ValueMap, incoming: ValueMap) -> ValueMap {
    for (key, value) in incoming {
        match base.remove(&key) {
            Some(existing) => base.insert(key, deep_merge(existing, value)),
            None => base.insert(key, value),
        };
    }
    base
}

/// Insert `value` at a nested key path, creating intermediate maps on
/// demand. A non-map intermediate is replaced by a map (last-wins).
pub fn insert_path(map: &mut ValueMap, keys: &[&str], value: Value) {
    match keys {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Map(ValueMap::new()));
            if let Value::Map(inner) = entry {
                insert_path(inner, rest, value);
            } else {
                let mut inner = ValueMap::new();
                insert_path(&mut inner, rest, value);
                *entry = Value::Map(inner);
            }
        }
    }
}

/// Rewrite dotted flat keys (`"a.b.c"`) anywhere in a map tree into the
/// equivalent nesting, so the merge rules treat them as map fields
pub fn normalize_map(map: ValueMap) -> ValueMap {
    let mut out = ValueMap::new();
    for (key, value) in map {
        let value = normalize_value(value);
        if key.contains('.') {
            let keys: Vec<&str> = key.split('.').collect();
            let mut nested = ValueMap::new();
            insert_path(&mut nested, &keys, value);
            out = merge_maps(out, nested);
        } else {
            match out.remove(&key) {
                Some(existing) => {
                    out.insert(key, deep_merge(existing, value));
                }
                None => {
                    out.insert(key, value);
                }
            }
        }
    }
    out
}

fn normalize_value(value: Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(normalize_map(map)),
        Value::List(items) => Value::List(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

/// Fold an ordered document list, then the override tree, into one
/// effective policy
pub fn merge_profiles(documents: &[PolicyDocument], overrides: ValueMap) -> EffectivePolicy {
    let mut merged = ValueMap::new();
    for document in documents {
        merged = merge_maps(merged, document.to_map());
    }
    let merged = normalize_map(merged);
    let overrides = normalize_map(overrides);
    EffectivePolicy::from_map(merge_maps(merged, overrides))
}
