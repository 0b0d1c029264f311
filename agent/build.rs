//! Build script for dockhand
//!
//! Stamps the binary with the commit and build time reported by `--version` and `/health`.

use std::env;
use std::process::Command;

use chrono::Utc;

fn main() {
    // Image builds usually run without a .git directory, so the commit can be passed in
    let git_hash = env::var("DOCKHAND_COMMIT")
        .ok()
        .filter(|hash| !hash.trim().is_empty())
        .or_else(|| {
            Command::new("git")
                .args(["rev-parse", "--short", "HEAD"])
                .output()
                .ok()
                .filter(|output| output.status.success())
                .and_then(|output| String::from_utf8(output.stdout).ok())
        })
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let build_time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=DOCKHAND_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=DOCKHAND_BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-env-changed=DOCKHAND_COMMIT");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
