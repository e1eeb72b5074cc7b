//! Build-time metadata embedded by the build script.

/// Short git hash at build time, `SWITCHBOARD_GIT_HASH` if set, else `unknown`.
pub const GIT_HASH: &str = env!("SWITCHBOARD_GIT_HASH");

/// The build profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("SWITCHBOARD_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return a formatted version string including git hash and profile.
///
/// Example: `"0.1.0 (abc1234, debug)"`
pub fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE})")
}
