//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// `.chunkpipe.toml`
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Pipeline ----

/// Queue, chunk and pool defaults for the word counter.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Target bytes per chunk. 64 KB.
    pub const CHUNK_SIZE: usize = 64 * 1024;
    /// Extra capacity reserved per chunk for boundary extension.
    pub const CHUNK_SLACK: usize = 256;
    /// Queue slots between producer and workers.
    pub const QUEUE_CAPACITY: usize = 64;
    /// Hard cap on worker threads.
    pub const MAX_WORKERS: usize = 32;

    /// Default worker count: available threads (from rayon), capped at [`Self::MAX_WORKERS`].
    pub fn workers() -> usize {
        rayon::current_num_threads().clamp(1, Self::MAX_WORKERS)
    }
}

// ---- Dispatcher ----

/// Defaults for the connection dispatcher.
pub struct DispatchDefaults;

impl DispatchDefaults {
    pub const WORKERS: usize = 4;
    pub const QUEUE_CAPACITY: usize = 16;
    /// Back-to-back accept failures tolerated before the dispatcher gives up on the listener.
    pub const MAX_CONSECUTIVE_ACCEPT_ERRORS: usize = 64;
}

// ---- Progress ----

pub struct ProgressConsts;

impl ProgressConsts {
    pub const DESC: &'static str = "Counting";
    pub const UNIT: &'static str = "B";
}
