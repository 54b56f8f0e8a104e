//! Option structs for the session, the fetch layer and export.
//!
//! Everything has a `Default` matching the reference sizing; [`ComposerConfig::from_env`] layers
//! `FIGCOMP_*` environment overrides on top.

use std::{path::PathBuf, time::Duration};

use crate::{
    compose::{drag::DragBounds, part::ViewMode},
    foundation::core::Canvas,
    removal::pipeline::RemovalParams,
};

/// Host whose images are routed through the image proxy.
pub const CATALOG_CDN_HOST: &str = "cdn.rebrickable.com";

/// How image bytes are located.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchConfig {
    /// Root for relative filesystem paths.
    pub assets_root: PathBuf,
    /// Image proxy endpoint (`GET <base>?url=...`). `None` loads catalog images directly.
    pub proxy_base: Option<String>,
    /// Host recognized as the catalog CDN.
    pub catalog_host: String,
    /// Per-request network timeout.
    pub http_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("."),
            proxy_base: None,
            catalog_host: CATALOG_CDN_HOST.to_string(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

/// Export raster settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    /// Output size.
    pub canvas: Canvas,
    /// Side of the square logical box every part is drawn into, before its transform.
    pub part_box: f64,
    /// Whether processed or original images are drawn.
    pub view: ViewMode,
    /// Optional straight-alpha background; transparent when `None`.
    pub clear_rgba: Option<[u8; 4]>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            part_box: 100.0,
            view: ViewMode::Processed,
            clear_rgba: None,
        }
    }
}

/// Top-level session configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposerConfig {
    /// Image location settings.
    pub fetch: FetchConfig,
    /// Background-removal thresholds.
    pub removal: RemovalParams,
    /// Export settings.
    pub export: ExportSettings,
    /// Bounded wait for in-flight removals before exporting.
    pub settle: Duration,
    /// Clamp rectangle for drag gestures.
    pub drag_bounds: DragBounds,
    /// Seed for the placement fallback jitter.
    pub placement_seed: u64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            removal: RemovalParams::default(),
            export: ExportSettings::default(),
            settle: Duration::from_millis(1000),
            drag_bounds: DragBounds::default(),
            placement_seed: 0x5EED_F16C_0000_0001,
        }
    }
}

impl ComposerConfig {
    /// Defaults with `FIGCOMP_SETTLE_MS`, `FIGCOMP_PROXY_BASE`, `FIGCOMP_HTTP_TIMEOUT_MS` and
    /// `FIGCOMP_ASSETS_ROOT` applied. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|k| std::env::var(k).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = get("FIGCOMP_SETTLE_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            self.settle = Duration::from_millis(ms);
        }
        if let Some(base) = get("FIGCOMP_PROXY_BASE") {
            let base = base.trim();
            self.fetch.proxy_base = (!base.is_empty()).then(|| base.to_string());
        }
        if let Some(ms) = get("FIGCOMP_HTTP_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
        {
            self.fetch.http_timeout = Duration::from_millis(ms);
        }
        if let Some(root) = get("FIGCOMP_ASSETS_ROOT").filter(|v| !v.trim().is_empty()) {
            self.fetch.assets_root = PathBuf::from(root);
        }
        self
    }
}
