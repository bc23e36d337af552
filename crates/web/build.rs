//! Build script for Framedash Web crate
//!
//! Records build metadata reported by `/_shell/version`.

fn main() {
    // Build timestamp
    println!(
        "cargo:rustc-env=FRAMEDASH_BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );

    // Git info for version endpoint
    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
    {
        if output.status.success() {
            let commit_hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
            println!("cargo:rustc-env=FRAMEDASH_GIT_COMMIT={}", commit_hash);
        }
    }

    // Re-run triggers
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=static/");
}
