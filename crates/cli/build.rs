//! Build script for the otto-studio CLI
//!
//! Writes `built.rs` and exposes host, commit and build time to
//! `--version` through `BUILT_*` compile-time variables.

use std::env;

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn env_or_unknown(key: &str) -> String {
    println!("cargo:rerun-if-env-changed={}", key);
    env::var(key).unwrap_or_else(|_| "unknown".to_string())
}

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    emit("BUILT_HOST", &env_or_unknown("HOST"));
    emit("BUILT_GIT_COMMIT_HASH", &env_or_unknown("GIT_COMMIT_HASH"));
    emit(
        "BUILT_TIME_UTC",
        &chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
}
