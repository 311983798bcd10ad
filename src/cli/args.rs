use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run commands under composable macOS sandbox-exec profiles"
)]
pub struct Args {
    /// Profile names and inline overrides (+path=value or override:path=value)
    #[arg(value_name = "PROFILE|OVERRIDE")]
    pub selectors: Vec<String>,

    /// Print the compiled sandbox profile instead of running a command
    #[arg(long = "print-profile")]
    pub print_profile: bool,

    /// Install bundled default profiles and exit
    #[arg(long = "install-profiles")]
    pub install_profiles: bool,

    /// Overwrite existing profiles when installing
    #[arg(long = "force", requires = "install_profiles")]
    pub force: bool,

    /// Command to execute under the sandbox (defaults to your shell)
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Apply the default-profile rule to user-selected profile names: `base`
/// is always loaded first unless it is already listed or the `no-base`
/// sentinel is present. The sentinel itself selects nothing.
pub fn resolve_profiles(selected: Vec<String>) -> Vec<String> {
    let mut profiles = if selected.is_empty() {
        vec!["base".to_string()]
    } else if selected.iter().any(|name| name == "base" || name == "no-base") {
        selected
    } else {
        let mut with_base = vec!["base".to_string()];
        with_base.extend(selected);
        with_base
    };
    profiles.retain(|name| name != "no-base");
    profiles
}
