pub mod args;
pub mod config;
pub mod overrides;

pub use args::{Args, resolve_profiles};
pub use config::ExecutablesConfig;
pub use overrides::parse_overrides;
