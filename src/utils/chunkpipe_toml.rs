//! Load `.chunkpipe.toml` from a directory (CLI only). Lib callers pass [`Opts`] directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkpipeToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    workers: Option<usize>,
    capacity: Option<usize>,
    chunk_size: Option<usize>,
    strict: Option<bool>,
    verbose: Option<bool>,
    json: Option<bool>,
    in_memory: Option<bool>,
}

impl ChunkpipeToml {
    pub(crate) fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }
}

pub(crate) fn parse_chunkpipe_toml(s: &str) -> Result<ChunkpipeToml, toml::de::Error> {
    toml::from_str(s)
}

/// Load `.chunkpipe.toml` from `dir`. A missing file is `Ok(None)`; an unreadable or invalid one
/// is an error naming the path.
pub(crate) fn load_chunkpipe_toml(dir: &Path) -> Result<Option<ChunkpipeToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let file =
        parse_chunkpipe_toml(&s).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $($field:ident),+) => {
        $(
            if let Some(v) = $section.$field {
                $opts.$field = v;
            }
        )+
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub(crate) fn apply_file_to_opts(file: &ChunkpipeToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, workers, capacity, chunk_size, strict, verbose, json, in_memory);
}
