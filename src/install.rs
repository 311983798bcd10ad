use std::{fs, path::Path};

use crate::error::HakoError;

/// Profiles shipped with the binary, written to the bundled profile
/// directory so the loader can resolve them from disk.
const BUNDLED_PROFILES: &[(&str, &str)] = &[
    ("base", include_str!("../profiles/base.toml")),
    ("dev", include_str!("../profiles/dev.toml")),
    ("network", include_str!("../profiles/network.toml")),
    ("localhost", include_str!("../profiles/localhost.toml")),
];

/// Write the bundled profiles into `dir`, skipping files that already
/// exist unless `force` is set
pub fn install_default_profiles(dir: &Path, force: bool) -> Result<(), HakoError> {
    fs::create_dir_all(dir)?;
    for (name, content) in BUNDLED_PROFILES {
        let dest = dir.join(format!("{name}.toml"));
        if dest.exists() && !force {
            log::debug!("profile '{name}' already installed, skipping");
            continue;
        }
        fs::write(&dest, content)?;
        log::info!("installed profile '{name}' to {}", dest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn installs_all_bundled_profiles() {
        let dir = tempfile::tempdir().unwrap();
        install_default_profiles(dir.path(), false).unwrap();

        for (name, _) in BUNDLED_PROFILES {
            assert!(dir.path().join(format!("{name}.toml")).is_file());
        }
    }

    #[test]
    fn existing_profiles_are_kept_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        fs::write(&base, "[network]\nenabled = true\n").unwrap();

        install_default_profiles(dir.path(), false).unwrap();
        assert_eq!(
            fs::read_to_string(&base).unwrap(),
            "[network]\nenabled = true\n"
        );

        install_default_profiles(dir.path(), true).unwrap();
        assert_ne!(
            fs::read_to_string(&base).unwrap(),
            "[network]\nenabled = true\n"
        );
    }

    #[test]
    fn bundled_profiles_parse_as_documents() {
        use crate::policy::value::from_toml_table;
        use crate::policy::PolicyDocument;

        for (name, content) in BUNDLED_PROFILES {
            let table: toml::Table = toml::from_str(content)
                .unwrap_or_else(|err| panic!("bundled profile '{name}' is invalid: {err}"));
            let doc = PolicyDocument::from_map(from_toml_table(table));
            // Bundled profiles must not carry keys the model cannot type
            assert!(doc.extra.is_empty(), "unexpected keys in '{name}'");
        }
    }
}
