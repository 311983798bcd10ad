use crate::error::HakoError;
use crate::sbpl::CompiledProfile;

pub async fn execute_with_profile(
    _command: &str,
    _args: &[&str],
    _profile: &CompiledProfile,
    _home: &str,
) -> Result<i32, HakoError> {
    Err(HakoError::Unsupported)
}
