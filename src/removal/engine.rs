use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    assets::{
        decode,
        fetch::{self, ImageFetcher},
    },
    foundation::error::FigResult,
    removal::pipeline::{self, RemovalParams},
};

/// Outcome of running one source image through background removal.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    /// The unmodified input reference.
    pub original_url: String,
    /// Renderable reference with the background made transparent, or `original_url` when
    /// processing did not succeed.
    pub processed_url: String,
    /// `true` only when pixel-level removal ran and succeeded.
    pub is_processed: bool,
}

impl ProcessedImage {
    /// Fallback result that points back at the original image.
    pub fn unprocessed(url: &str) -> Self {
        Self {
            original_url: url.to_string(),
            processed_url: url.to_string(),
            is_processed: false,
        }
    }
}

/// Background remover with a per-URL result cache.
///
/// Each URL maps to a once-cell: the first caller runs fetch + pipeline, concurrent callers for
/// the same URL block on the same cell, later callers get the cached value. Entries are never
/// evicted, failed attempts included.
pub struct BackgroundRemover {
    fetcher: Arc<dyn ImageFetcher>,
    params: RemovalParams,
    cache: Mutex<HashMap<String, Arc<OnceLock<ProcessedImage>>>>,
    attempts: AtomicUsize,
    pixel_runs: AtomicUsize,
}

impl std::fmt::Debug for BackgroundRemover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemover")
            .field("params", &self.params)
            .field("cached", &self.len())
            .field("attempts", &self.attempts())
            .field("pixel_runs", &self.pixel_runs())
            .finish_non_exhaustive()
    }
}

impl BackgroundRemover {
    /// Remover with default thresholds.
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_params(fetcher, RemovalParams::default())
    }

    /// Remover with explicit thresholds.
    pub fn with_params(fetcher: Arc<dyn ImageFetcher>, params: RemovalParams) -> Self {
        Self {
            fetcher,
            params,
            cache: Mutex::new(HashMap::new()),
            attempts: AtomicUsize::new(0),
            pixel_runs: AtomicUsize::new(0),
        }
    }

    /// Thresholds used by this remover.
    pub fn params(&self) -> &RemovalParams {
        &self.params
    }

    /// Remove the background of the image at `url`.
    ///
    /// Never fails: any fetch, decode, pipeline or encode error resolves to
    /// [`ProcessedImage::unprocessed`], which is cached like a success.
    pub fn remove_background(&self, url: &str) -> ProcessedImage {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(url.to_string()).or_default())
        };
        cell.get_or_init(|| self.process(url)).clone()
    }

    /// Cached result for `url`, if a completed attempt exists.
    pub fn cached(&self, url: &str) -> Option<ProcessedImage> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(url).and_then(|cell| cell.get().cloned())
    }

    /// Number of URLs with a cache entry (completed or in flight).
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times an uncached URL was attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// How many times the pixel pipeline actually ran.
    pub fn pixel_runs(&self) -> usize {
        self.pixel_runs.load(Ordering::Relaxed)
    }

    #[tracing::instrument(skip(self))]
    fn process(&self, url: &str) -> ProcessedImage {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match self.try_process(url) {
            Ok(processed_url) => ProcessedImage {
                original_url: url.to_string(),
                processed_url,
                is_processed: true,
            },
            Err(err) => {
                tracing::warn!(%url, error = %err, "background removal failed, using original");
                ProcessedImage::unprocessed(url)
            }
        }
    }

    fn try_process(&self, url: &str) -> FigResult<String> {
        let mut img = fetch::load_rgba(self.fetcher.as_ref(), url)?;
        self.pixel_runs.fetch_add(1, Ordering::Relaxed);
        pipeline::strip_background(&mut img, &self.params)?;
        let png = decode::encode_png(&img)?;
        Ok(decode::png_data_url(&png))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/removal/engine.rs"]
mod tests;
