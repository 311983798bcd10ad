use std::{fmt, fs, path::Path};

use serde::{Deserialize, Deserializer, de};

use crate::policy::merge::normalize_map;
use crate::policy::value::from_toml_table;
use crate::policy::ValueMap;

/// Optional per-executable defaults: extra profiles and overrides keyed
/// by executable name patterns. Loaded from `<config_dir>/config.toml`.
/// Rules keep their file order, so when several match one executable the
/// last rule in the file wins the scalar merge.
#[derive(Debug, Deserialize, Default)]
pub struct ExecutablesConfig {
    #[serde(default, deserialize_with = "rules_in_file_order")]
    pub executables: Vec<(String, ExecutableRule)>,
}

fn rules_in_file_order<'de, D>(deserializer: D) -> Result<Vec<(String, ExecutableRule)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RulesVisitor;

    impl<'de> de::Visitor<'de> for RulesVisitor {
        type Value = Vec<(String, ExecutableRule)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of executable rules")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let mut rules = Vec::new();
            while let Some(entry) = access.next_entry()? {
                rules.push(entry);
            }
            Ok(rules)
        }
    }

    deserializer.deserialize_map(RulesVisitor)
}

#[derive(Debug, Deserialize)]
pub struct ExecutableRule {
    /// Name pattern; defaults to the table key. A trailing `*` matches
    /// any suffix, otherwise the match is exact.
    pub pattern: Option<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Overrides in dot notation or nested table form
    #[serde(default)]
    pub overrides: toml::Table,
}

impl ExecutableRule {
    fn matches(&self, key: &str, executable: &str) -> bool {
        let pattern = self.pattern.as_deref().unwrap_or(key);
        match pattern.strip_suffix('*') {
            Some(prefix) => executable.starts_with(prefix),
            None => executable == pattern,
        }
    }

    /// Override tree with dot-notation keys normalized into nesting
    pub fn override_tree(&self) -> ValueMap {
        normalize_map(from_toml_table(self.overrides.clone()))
    }
}

impl ExecutablesConfig {
    /// Load the table if present. This configuration is optional: any
    /// read or parse failure degrades to "no overrides" with a warning.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("failed to read {}: {err}", path.display());
                return None;
            }
        };
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("failed to parse {}: {err}", path.display());
                None
            }
        }
    }

    /// All rules matching the executable basename, in file order
    pub fn matching_rules(&self, executable: &str) -> Vec<&ExecutableRule> {
        self.executables
            .iter()
            .filter(|(key, rule)| rule.matches(key, executable))
            .map(|(_, rule)| rule)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Value;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{content}").unwrap();
        tmp
    }

    #[test]
    fn loads_rules_and_matches_exact_names() {
        let tmp = write_config(
            r#"
            [executables.curl]
            profiles = ["network"]

            [executables.git]
            pattern = "git*"
            profiles = ["network"]
            [executables.git.overrides]
            "filesystem.write.paths" = ["{working-directory}"]
            "#,
        );

        let config = ExecutablesConfig::load(tmp.path()).unwrap();
        assert_eq!(config.matching_rules("curl").len(), 1);
        assert_eq!(config.matching_rules("git-lfs").len(), 1);
        assert!(config.matching_rules("wget").is_empty());
    }

    #[test]
    fn dot_notation_overrides_normalize() {
        let tmp = write_config(
            r#"
            [executables.make]
            [executables.make.overrides]
            "network.enabled" = true
            "#,
        );

        let config = ExecutablesConfig::load(tmp.path()).unwrap();
        let rule = &config.matching_rules("make")[0];
        let tree = rule.override_tree();
        let network = tree.get("network").and_then(Value::as_map).unwrap();
        assert_eq!(network.get("enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn rules_merge_in_file_order_not_key_order() {
        use crate::policy::merge::merge_maps;

        // Keys are deliberately in reverse alphabetical order: the last
        // rule in the file must win, regardless of key names.
        let tmp = write_config(
            r#"
            [executables.zz]
            pattern = "git*"
            [executables.zz.overrides]
            "network.enabled" = true

            [executables.aa]
            pattern = "git*"
            [executables.aa.overrides]
            "network.enabled" = false
            "#,
        );

        let config = ExecutablesConfig::load(tmp.path()).unwrap();
        let rules = config.matching_rules("git-lfs");
        assert_eq!(rules.len(), 2);

        let mut overrides = ValueMap::new();
        for rule in rules {
            overrides = merge_maps(overrides, rule.override_tree());
        }
        let network = overrides.get("network").and_then(Value::as_map).unwrap();
        assert_eq!(network.get("enabled"), Some(&Value::Bool(false)));
    }

    #[test]
    fn malformed_table_degrades_to_none() {
        let tmp = write_config("[executables\nbroken");
        assert!(ExecutablesConfig::load(tmp.path()).is_none());
    }

    #[test]
    fn missing_file_is_none() {
        assert!(ExecutablesConfig::load(Path::new("/nonexistent/config.toml")).is_none());
    }
}
