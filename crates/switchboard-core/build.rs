use std::env;
use std::process::Command;

/// Short hash of `HEAD`, or `None` outside a git checkout.
fn git_head() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}

fn main() {
    // Source tarballs have no .git; packagers pass the hash in instead.
    println!("cargo:rerun-if-env-changed=SWITCHBOARD_GIT_HASH");
    let git_hash = env::var("SWITCHBOARD_GIT_HASH")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=SWITCHBOARD_GIT_HASH={git_hash}");

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SWITCHBOARD_BUILD_PROFILE={profile}");

    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs");
}
