//! `folio render` command implementation.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_pipeline::DEFAULT_CONTEXT;

use super::{build_pipeline, open_cache};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render; `-` or nothing reads stdin.
    file: Option<PathBuf>,

    /// Namespace for diagram and code block ids.
    #[arg(long, default_value = DEFAULT_CONTEXT)]
    context: String,

    /// Render as a chat answer (contact links, chat classes).
    #[arg(long)]
    chat: bool,

    /// Print `{html, interactive}` JSON instead of bare HTML.
    #[arg(long)]
    manifest: bool,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "FOLIO_KROKI_URL")]
    kroki_url: Option<String>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            kroki_url: self.kroki_url,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let markdown = match self.file {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
            _ => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        let cache = open_cache(&config);
        let pipeline = build_pipeline(&config, cache.as_ref());

        let rendered = if self.chat {
            pipeline.render_chat(&markdown, &self.context)
        } else {
            pipeline.render(&markdown, &self.context)?
        };

        if self.manifest {
            output.document(&serde_json::to_string_pretty(&rendered)?)?;
        } else {
            output.document(&rendered.html)?;
        }
        Ok(())
    }
}
