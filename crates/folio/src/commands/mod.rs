//! CLI command implementations.

mod cache;
mod preload;
mod render;

use std::time::Duration;

use folio_cache::{Cache, FileCache, NullCache};
use folio_config::{Config, OnDiagramError};
use folio_diagrams::{DiagramFailurePolicy, KrokiEngine};
use folio_pipeline::{
    ContentSource, DirSource, FallbackSource, HttpSource, Pipeline, PipelineConfig,
};

pub(crate) use cache::CacheCommand;
pub(crate) use preload::PreloadArgs;
pub(crate) use render::RenderArgs;

/// Cache format version; bump to invalidate persisted entries.
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP timeout for content requests.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Persistent cache for `config`, or a null cache when caching is disabled.
fn open_cache(config: &Config) -> Box<dyn Cache> {
    if config.cache_resolved.enabled {
        Box::new(FileCache::new(
            config.cache_resolved.dir.clone(),
            CACHE_VERSION,
        ))
    } else {
        Box::new(NullCache)
    }
}

/// Endpoint first, then the assets directory.
fn content_source(config: &Config) -> FallbackSource {
    let content = &config.content_resolved;
    let mut sources: Vec<Box<dyn ContentSource>> = Vec::new();
    if let Some(endpoint) = &content.endpoint {
        sources.push(Box::new(HttpSource::new(endpoint, FETCH_TIMEOUT)));
    }
    if let Some(dir) = &content.assets_dir {
        sources.push(Box::new(DirSource::new(dir.clone())));
    }
    FallbackSource::new(sources)
}

/// Build the pipeline described by `config`.
fn build_pipeline(config: &Config, cache: &dyn Cache) -> Pipeline {
    let diagrams = &config.diagrams_resolved;
    let pipeline_config = PipelineConfig {
        language: config.content_resolved.language.clone(),
        preload_delay: config.preload.delay(),
        diagram_policy: match diagrams.on_error {
            OnDiagramError::Abort => DiagramFailurePolicy::Abort,
            OnDiagramError::Placeholder => DiagramFailurePolicy::Placeholder,
        },
    };

    let pipeline = Pipeline::new(Box::new(content_source(config)), cache, pipeline_config);
    match &diagrams.kroki_url {
        Some(url) => pipeline.with_engine(Box::new(
            KrokiEngine::new(url)
                .with_timeout(diagrams.timeout)
                .with_cache(cache),
        )),
        None => pipeline,
    }
}
