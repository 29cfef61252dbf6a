//! Platform identifiers used in release download URLs.

use anyhow::{Result, bail};

/// Map an OS/architecture pair to a release platform id such as `darwin-arm64`.
///
/// `musl` only matters on linux x64, which has a dedicated musl build.
pub fn platform_id(os: &str, arch: &str, musl: bool) -> Result<String> {
    let os_name = match os.to_lowercase().as_str() {
        "darwin" | "macos" => "darwin",
        "linux" => "linux",
        other => bail!("Unsupported OS: {other}"),
    };
    let arch_name = match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" => "x64",
        "arm64" | "aarch64" => "arm64",
        other => bail!("Unsupported architecture: {other}"),
    };
    if os_name == "linux" && arch_name == "x64" && musl {
        return Ok("linux-x64-musl".to_string());
    }
    Ok(format!("{os_name}-{arch_name}"))
}
