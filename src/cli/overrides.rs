// Parses inline override tokens (`+network.enabled=true` or
// `override:network.enabled=true`) into an override tree. Any other
// token is passed through unchanged as a profile-name selector.
use crate::policy::merge::insert_path;
use crate::policy::{Value, ValueMap};

/// Split CLI selector tokens into profile names and an override tree.
/// Later assignments to the same leaf path overwrite earlier ones.
pub fn parse_overrides(args: &[String]) -> (Vec<String>, ValueMap) {
    let mut profiles: Vec<String> = Vec::new();
    let mut overrides = ValueMap::new();

    for arg in args {
        let assignment = arg
            .strip_prefix('+')
            .or_else(|| arg.strip_prefix("override:"));

        match assignment {
            Some(assignment) => match assignment.split_once('=') {
                Some((path, raw)) if !path.is_empty() => {
                    let keys: Vec<&str> = path.split('.').collect();
                    insert_path(&mut overrides, &keys, infer_value(raw));
                }
                _ => log::warn!("ignoring malformed override '{arg}' (expected path=value)"),
            },
            None => profiles.push(arg.clone()),
        }
    }

    (profiles, overrides)
}

/// Ordered type inference for override values: JSON literal, boolean,
/// integer, float, then plain string. Never fails; anything unresolvable
/// stays a string.
pub fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            return Value::from(json);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Integer(n);
        }
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(raw.to_string())
}
