use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::HakoError;

use super::model::PolicyDocument;
use super::value::from_toml_table;

/// Resolves named profile documents on disk. User-level profiles shadow
/// the bundled defaults; nothing else is consulted.
pub struct ProfileLoader {
    user_dir: PathBuf,
    bundled_dir: PathBuf,
}

impl ProfileLoader {
    pub fn new(user_dir: impl Into<PathBuf>, bundled_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            bundled_dir: bundled_dir.into(),
        }
    }

    /// Load one named profile document. Fails closed: a missing or
    /// unparseable document is an error, never silently skipped.
    pub fn load(&self, name: &str) -> Result<PolicyDocument, HakoError> {
        let file_name = format!("{name}.toml");
        let user_path = self.user_dir.join(&file_name);
        let bundled_path = self.bundled_dir.join(&file_name);

        let path = if user_path.is_file() {
            user_path
        } else if bundled_path.is_file() {
            bundled_path
        } else {
            return Err(HakoError::ProfileNotFound {
                name: name.to_string(),
                user_path,
                bundled_path,
            });
        };

        log::debug!("loading profile '{name}' from {}", path.display());
        Self::read_document(&path)
    }

    /// Load an ordered list of profiles, stopping at the first failure
    pub fn load_all(&self, names: &[String]) -> Result<Vec<PolicyDocument>, HakoError> {
        names.iter().map(|name| self.load(name)).collect()
    }

    fn read_document(path: &Path) -> Result<PolicyDocument, HakoError> {
        // A located file that cannot be decoded is malformed, not missing
        let content =
            String::from_utf8(fs::read(path)?).map_err(|source| HakoError::ProfileDecode {
                path: path.to_path_buf(),
                source,
            })?;
        if content.trim().is_empty() {
            return Err(HakoError::ProfileEmpty {
                path: path.to_path_buf(),
            });
        }
        let table: toml::Table =
            toml::from_str(&content).map_err(|source| HakoError::ProfileParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(PolicyDocument::from_map(from_toml_table(table)))
    }
}
