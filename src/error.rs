use thiserror::Error;

use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum HakoError {
    #[error("profile '{name}' not found at {user_path} or {bundled_path}")]
    ProfileNotFound {
        name: String,
        user_path: PathBuf,
        bundled_path: PathBuf,
    },

    #[error("profile {path} is empty")]
    ProfileEmpty { path: PathBuf },

    #[error("failed to parse profile {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("profile {path} is not valid UTF-8")]
    ProfileDecode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for command: {source}")]
    CommandWait {
        #[source]
        source: std::io::Error,
    },

    #[error("sandbox execution is only supported on macOS")]
    Unsupported,
}
