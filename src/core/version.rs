//! Build metadata generated by the build script.
//! The snapshot format version is read from `[package.metadata]` in Cargo.toml,
//! so the store and the binary share a single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Newest queue snapshot format this build reads and writes.
/// Falls back to format 1 if the generated value cannot be parsed.
pub fn snapshot_format_version() -> u32 {
    SNAPSHOT_FORMAT_VERSION.parse().unwrap_or(1)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Long version string shown by `relayq --version`
pub fn long_version() -> String {
    format!(
        "{} (git {}, built {}, snapshot format {})",
        env!("CARGO_PKG_VERSION"),
        git_hash(),
        build_time(),
        snapshot_format_version()
    )
}
