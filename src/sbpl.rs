//! Compiles an effective policy into SBPL (Sandbox Profile Language)
//! text for `sandbox-exec`. Statement ordering is fixed: downstream the
//! enforcement engine parses this output literally, so the textual form
//! is the compatibility-sensitive surface and must stay reproducible.

use std::fmt;

use crate::policy::EffectivePolicy;

/// Caller-supplied strings substituted into path and pattern entries
#[derive(Debug, Clone)]
pub struct ProfileParams {
    pub home: String,
    pub working_directory: String,
    pub config_dir: String,
}

/// Compiled SBPL program plus the derived environment hint. Immutable
/// once produced; rendered via `Display`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProfile {
    statements: Vec<String>,
    network_enabled: bool,
}

impl CompiledProfile {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Whether the policy grants full network access; surfaced to the
    /// spawned process's environment by the caller
    pub fn network_enabled(&self) -> bool {
        self.network_enabled
    }
}

impl fmt::Display for CompiledProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statements.join("\n"))
    }
}

/// Render the effective policy as an SBPL program. Never fails: a sparse
/// policy simply compiles to a smaller program.
pub fn compile(policy: &EffectivePolicy, params: &ProfileParams) -> CompiledProfile {
    let mut lines: Vec<String> = vec!["(version 1)".to_string()];

    if let Some(imports) = &policy.imports {
        for profile in &imports.system_profiles {
            lines.push(format!("(import \"{profile}\")"));
        }
    }

    if let Some(filesystem) = &policy.filesystem {
        if filesystem.default_deny.unwrap_or(false) {
            lines.push("(deny default)".to_string());
        }
    }

    // Helper definitions used by home-relative path rules
    lines.push(String::new());
    lines.push("(define home-path (param \"home\"))".to_string());
    lines.push(String::new());
    lines.push("(define (home-subpath home-relative-subpath)".to_string());
    lines.push("  (subpath (string-append home-path home-relative-subpath)))".to_string());
    lines.push(String::new());

    // `enabled` takes precedence over the localhost-only pair
    if let Some(network) = &policy.network {
        if network.enabled.unwrap_or(false) {
            lines.push("(allow network*)".to_string());
        } else if network.allow_localhost.unwrap_or(false) {
            lines.push("(allow network* (to ip \"localhost:*\"))".to_string());
            lines.push("(allow network-inbound (from ip \"localhost:*\"))".to_string());
        }
    }

    if let Some(filesystem) = &policy.filesystem {
        if let Some(read) = &filesystem.read {
            push_file_block(&mut lines, "(allow file-read*", read, params);
        }
        if let Some(write) = &filesystem.write {
            push_file_block(&mut lines, "(allow file*", write, params);
        }
    }

    if let Some(process) = &policy.process {
        if process.allow_exec.unwrap_or(false) {
            lines.push("(allow process-exec)".to_string());
        }
        if process.allow_fork.unwrap_or(false) {
            lines.push("(allow process-fork)".to_string());
        }
    }

    if let Some(system) = &policy.system {
        if system.allow_user_preferences.unwrap_or(false) {
            lines.push("(allow user-preference-read)".to_string());
        }
        if system.allow_sysctl_write.unwrap_or(false) {
            lines.push("(allow sysctl-write)".to_string());
        }
        if system.allow_system_debug.unwrap_or(false) {
            lines.push("(allow system-debug)".to_string());
        }
        if system.allow_mach_priv_task_port.unwrap_or(false) {
            lines.push("(allow mach-priv-task-port)".to_string());
        }
    }

    if let Some(mach) = &policy.mach {
        for name in &mach.lookup {
            lines.push(format!("(allow mach-lookup (global-name \"{name}\"))"));
        }
        for pattern in &mach.lookup_pattern {
            lines.push(format!(
                "(allow mach-lookup (global-name-regex \"{pattern}\"))"
            ));
        }
    }

    if let Some(ipc) = &policy.ipc {
        if ipc.allow_posix_shm.unwrap_or(false) {
            if ipc.posix_shm_names.is_empty() {
                lines.push("(allow ipc-posix-shm)".to_string());
            } else {
                lines.push("(allow ipc-posix-shm".to_string());
                for name in &ipc.posix_shm_names {
                    lines.push(format!("       (ipc-posix-name \"{name}\")"));
                }
                lines.push(")".to_string());
            }
        }
        if ipc.allow_posix_sem.unwrap_or(false) {
            lines.push("(allow ipc-posix-sem)".to_string());
        }
    }

    if let Some(signal) = &policy.signal {
        if let Some(target) = &signal.target {
            lines.push(format!("(allow signal (target {target}))"));
        }
    }

    if let Some(iokit) = &policy.iokit {
        for name in &iokit.open {
            lines.push(format!("(allow iokit-open (global-name \"{name}\"))"));
        }
    }

    CompiledProfile {
        statements: lines,
        network_enabled: policy.network_enabled(),
    }
}

fn push_file_block(
    lines: &mut Vec<String>,
    header: &str,
    access: &crate::policy::model::FsAccessSection,
    params: &ProfileParams,
) {
    if access.is_empty() {
        return;
    }
    lines.push(header.to_string());
    for path in &access.paths {
        lines.push(format!("       {}", format_path(path, params)));
    }
    for pattern in &access.patterns {
        lines.push(format!(
            "       (regex #\"{}\")",
            substitute_vars(pattern, params)
        ));
    }
    lines.push(")".to_string());
}

/// Classify one path entry into its SBPL filter form.
///
/// The home-relative check runs before substitution: a substituted home
/// directory may itself contain pattern characters, and classifying
/// first keeps the `~/` prefix unambiguous.
fn format_path(path: &str, params: &ProfileParams) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        return format!("(home-subpath \"{}\")", substitute_vars(rest, params));
    }

    let path = substitute_vars(path, params);
    if path.starts_with('/') {
        format!("(subpath \"{path}\")")
    } else if path.starts_with('^') || path.contains('*') || path.contains('?') {
        format!("(regex #\"{path}\")")
    } else {
        format!("(literal \"{path}\")")
    }
}

/// Fixed substitution sequence applied to path and pattern strings.
/// Plain text replacement, no escaping pass.
fn substitute_vars(text: &str, params: &ProfileParams) -> String {
    text.replace('~', &params.home)
        .replace("{working-directory}", &params.working_directory)
        .replace("{home}", &params.home)
}
