// Build metadata captured at compile time by build.rs

/// Static build information reported by `build_info` and `/version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
    pub rust_version: &'static str,
}

impl BuildInfo {
    /// Build information of the running binary.
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: env!("ATLAS_BUILD_COMMIT"),
            date: env!("ATLAS_BUILD_DATE"),
            rust_version: env!("ATLAS_RUSTC_VERSION"),
        }
    }

    /// `VERSION (built DATE with rustc RUST_VERSION)`
    pub fn version_string(&self) -> String {
        format!(
            "{} (built {} with rustc {})",
            self.version, self.date, self.rust_version
        )
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}
