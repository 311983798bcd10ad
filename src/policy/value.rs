use std::collections::BTreeMap;

/// Map form shared by profile documents and override trees
pub type ValueMap = BTreeMap<String, Value>;

/// Closed value type that profile documents and override trees are
/// folded over. Keeping merging on a single tagged type means the merge
/// rules are total: every combination of kinds has a defined outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            // TOML datetimes have no policy meaning; carry them as text
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(from_toml_table(table)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, val)| (key, Value::from(val)))
                    .collect(),
            ),
        }
    }
}

/// Convert a parsed TOML table into the internal map form
pub fn from_toml_table(table: toml::Table) -> ValueMap {
    table
        .into_iter()
        .map(|(key, val)| (key, Value::from(val)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_table_converts_recursively() {
        let table: toml::Table = toml::from_str(
            r#"
            enabled = true
            count = 3
            ratio = 0.5
            name = "base"
            [nested]
            items = ["a", "b"]
            "#,
        )
        .unwrap();

        let map = from_toml_table(table);
        assert_eq!(map.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(map.get("count"), Some(&Value::Integer(3)));
        assert_eq!(map.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(map.get("name"), Some(&Value::String("base".to_string())));

        let nested = map.get("nested").and_then(Value::as_map).unwrap();
        assert_eq!(
            nested.get("items"),
            Some(&Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]))
        );
    }

    #[test]
    fn json_null_and_numbers_convert() {
        let json: serde_json::Value = serde_json::from_str(r#"[null, 1, 2.5, "x"]"#).unwrap();
        let value = Value::from(json);
        assert_eq!(
            value,
            Value::List(vec![
                Value::Null,
                Value::Integer(1),
                Value::Float(2.5),
                Value::String("x".to_string()),
            ])
        );
    }
}
