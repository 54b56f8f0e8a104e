use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::Context;

use crate::{
    assets::decode,
    config::FetchConfig,
    foundation::error::{FigError, FigResult},
};

/// Source of encoded image bytes for a URL.
///
/// This is the only place external IO happens; the removal pipeline and the exporter consume
/// decoded pixels only.
pub trait ImageFetcher: Send + Sync {
    /// Fetch the encoded bytes referenced by `url`.
    fn fetch(&self, url: &str) -> FigResult<Vec<u8>>;
}

/// Loads images from a root directory. Accepts relative paths and `file://` URLs.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Resolve relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used for relative paths.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageFetcher for FsFetcher {
    fn fetch(&self, url: &str) -> FigResult<Vec<u8>> {
        if is_http_url(url) {
            return Err(FigError::fetch(format!(
                "filesystem fetcher cannot load '{url}'"
            )));
        }
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::read(&path)
            .with_context(|| format!("read image bytes from '{}'", path.display()))
            .map_err(FigError::from)
    }
}

/// Blocking HTTP(S) fetcher backed by a shared `ureq` agent.
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Build a fetcher with a per-request timeout.
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

#[cfg(feature = "http")]
impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FigResult<Vec<u8>> {
        use std::io::Read as _;

        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FigError::fetch(format!("GET {url}: {e}")))?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(self.max_bytes)
            .read_to_end(&mut bytes)
            .with_context(|| format!("read response body of {url}"))?;
        Ok(bytes)
    }
}

/// Fixed in-memory URL table. Counts fetches per URL.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Vec<u8>>,
    hits: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MemoryFetcher {
    /// Empty table; every fetch fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes for `url`.
    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(url.into(), bytes);
    }

    /// Builder-style [`MemoryFetcher::insert`].
    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// Number of fetch attempts made for `url` (successful or not).
    pub fn fetch_count(&self, url: &str) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Number of fetch attempts across all URLs.
    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> FigResult<Vec<u8>> {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;
        self.entries
            .get(url)
            .cloned()
            .ok_or_else(|| FigError::fetch(format!("no in-memory image for '{url}'")))
    }
}

/// Scheme-dispatching fetcher used by the session and the CLI.
///
/// - `data:` URLs are decoded inline
/// - `http(s)` URLs go to the network fetcher; catalog CDN URLs are rewritten to the image proxy
///   when one is configured
/// - everything else is read from the filesystem
pub struct RoutedFetcher {
    fs: FsFetcher,
    network: Option<Box<dyn ImageFetcher>>,
    proxy_base: Option<String>,
    catalog_host: String,
}

impl std::fmt::Debug for RoutedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedFetcher")
            .field("fs_root", &self.fs.root())
            .field("network", &self.network.is_some())
            .field("proxy_base", &self.proxy_base)
            .field("catalog_host", &self.catalog_host)
            .finish()
    }
}

impl RoutedFetcher {
    /// Build from configuration, with the default network fetcher when the `http` feature is on.
    pub fn from_config(cfg: &FetchConfig) -> Self {
        #[cfg(feature = "http")]
        let network: Option<Box<dyn ImageFetcher>> =
            Some(Box::new(HttpFetcher::new(cfg.http_timeout)));
        #[cfg(not(feature = "http"))]
        let network: Option<Box<dyn ImageFetcher>> = None;

        Self {
            fs: FsFetcher::new(cfg.assets_root.clone()),
            network,
            proxy_base: cfg.proxy_base.clone(),
            catalog_host: cfg.catalog_host.clone(),
        }
    }

    /// Replace the network fetcher (tests, custom transports).
    pub fn with_network(mut self, network: Box<dyn ImageFetcher>) -> Self {
        self.network = Some(network);
        self
    }

    /// URL that will actually be requested for `url` after proxy routing.
    pub fn routed_url(&self, url: &str) -> String {
        match &self.proxy_base {
            Some(base) if is_host(url, &self.catalog_host) => proxy_url(base, url),
            _ => url.to_string(),
        }
    }
}

impl ImageFetcher for RoutedFetcher {
    fn fetch(&self, url: &str) -> FigResult<Vec<u8>> {
        if decode::is_data_url(url) {
            return decode::parse_data_url(url);
        }
        if is_http_url(url) {
            let network = self
                .network
                .as_ref()
                .ok_or_else(|| FigError::fetch("network fetching is disabled"))?;
            let target = self.routed_url(url);
            tracing::debug!(%url, %target, "fetching remote image");
            return network.fetch(&target);
        }
        self.fs.fetch(url)
    }
}

/// Fetch and decode `url` into straight-alpha RGBA8. `data:` URLs never reach `fetcher`.
pub fn load_rgba(fetcher: &dyn ImageFetcher, url: &str) -> FigResult<image::RgbaImage> {
    if url.is_empty() {
        return Err(FigError::validation("image URL must be non-empty"));
    }
    let bytes = if decode::is_data_url(url) {
        decode::parse_data_url(url)?
    } else {
        fetcher.fetch(url)?
    };
    decode::decode_rgba(&bytes)
}

/// Return `true` for `http://` and `https://` URLs.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Return `true` when `url` is an http(s) URL whose host equals `host` (case-insensitive).
pub fn is_host(url: &str, host: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    let hostname = authority.split(':').next().unwrap_or(authority);
    hostname.eq_ignore_ascii_case(host)
}

/// Build the image-proxy request URL: `<base>?url=<percent-encoded url>`.
pub fn proxy_url(base: &str, url: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}url={}", encode_uri_component(url))
}

fn encode_uri_component(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len() * 3);
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0f) as usize] as char);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
