use tokio::process::Command;

use crate::error::HakoError;
use crate::sbpl::CompiledProfile;

/// Spawn `command` under the compiled profile via `sandbox-exec` and
/// wait for it. The network hint is surfaced to the child as
/// `HAKO_NETWORK=online|offline`.
pub async fn execute_with_profile(
    command: &str,
    args: &[&str],
    profile: &CompiledProfile,
    home: &str,
) -> Result<i32, HakoError> {
    let mut child = Command::new("sandbox-exec")
        .arg("-p")
        .arg(profile.to_string())
        // The compiled profile references (param "home")
        .arg("-D")
        .arg(format!("home={home}"))
        .arg(command)
        .args(args)
        .env(
            "HAKO_NETWORK",
            if profile.network_enabled() {
                "online"
            } else {
                "offline"
            },
        )
        .spawn()
        .map_err(|source| HakoError::CommandSpawn {
            command: "sandbox-exec".to_string(),
            source,
        })?;

    let status = child
        .wait()
        .await
        .map_err(|source| HakoError::CommandWait { source })?;

    Ok(status.code().unwrap_or(1))
}
