//! `folio preload` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};

use super::{build_pipeline, open_cache};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the preload command.
#[derive(Args)]
pub(crate) struct PreloadArgs {
    /// Content ids to fetch, render and cache.
    #[arg(required = true)]
    ids: Vec<String>,

    /// Language to render for (overrides config).
    #[arg(long)]
    lang: Option<String>,

    /// Content endpoint (overrides config).
    #[arg(long, env = "FOLIO_CONTENT_ENDPOINT")]
    endpoint: Option<String>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "FOLIO_KROKI_URL")]
    kroki_url: Option<String>,

    /// Disable the persistent cache.
    #[arg(long)]
    no_cache: bool,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl PreloadArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            content_endpoint: self.endpoint,
            language: self.lang,
            cache_enabled: self.no_cache.then_some(false),
            kroki_url: self.kroki_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let cache = open_cache(&config);
        let pipeline = build_pipeline(&config, cache.as_ref());

        output.info(&format!(
            "Preloading {} item(s) in '{}'",
            self.ids.len(),
            pipeline.language()
        ));
        let summary = pipeline.preload_projects(self.ids.as_slice());

        let line = format!(
            "{} loaded, {} cached, {} failed",
            summary.loaded, summary.cached, summary.failed
        );
        if summary.failed > 0 {
            output.warning(&line);
        } else {
            output.success(&line);
        }
        Ok(())
    }
}
