//! `folio cache` subcommand group.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use folio_cache::{Cache, FileCache, RenderCache};
use folio_config::Config;

use super::CACHE_VERSION;
use crate::error::CliError;
use crate::output::Output;

/// Cache maintenance commands.
#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Remove every rendered page and compiled diagram.
    Clear(ClearArgs),
}

impl CacheCommand {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Clear(args) => args.execute(),
        }
    }
}

/// Arguments for the cache clear command.
#[derive(Args)]
pub(crate) struct ClearArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ClearArgs {
    fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        let dir = &config.cache_resolved.dir;
        let cache = FileCache::new(dir.clone(), CACHE_VERSION);
        RenderCache::new(&cache).clear();
        cache.bucket("diagrams").clear();

        output.success(&format!("Cache cleared: {}", dir.display()));
        Ok(())
    }
}
