//! figcomp composes LEGO minifigure parts on a layered canvas.
//!
//! Two engines make up the crate:
//!
//! - [`BackgroundRemover`]: corner-sampled background estimation, a color-distance alpha ramp,
//!   Sobel edge preservation and a 3x3 open, cached per image URL
//! - [`CompositionEngine`]: placed parts with position, scale, rotation and dense layers, synced
//!   from a [`Selection`] and flattened to PNG by [`export_composition`]
//!
//! [`Composer`] ties them together, running removal jobs on the rayon pool and merging results
//! back by part id.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod catalog;
pub(crate) mod compose;
/// Session, fetch and export options.
pub mod config;
pub(crate) mod removal;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgb8, Vec2};
pub use crate::foundation::error::{FigError, FigResult};
pub use crate::foundation::math::Rng64;

pub use crate::assets::decode::{
    PNG_DATA_URL_PREFIX, decode_rgba, encode_png as encode_image_png, is_data_url, parse_data_url,
    png_data_url, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
#[cfg(feature = "http")]
pub use crate::assets::fetch::HttpFetcher;
pub use crate::assets::fetch::{
    FsFetcher, ImageFetcher, MemoryFetcher, RoutedFetcher, is_host, is_http_url, load_rgba,
    proxy_url,
};
pub use crate::catalog::model::{
    Collection, Minifig, MinifigPart, PartColor, PartInfo, SelectedPart,
};
pub use crate::catalog::selection::Selection;
pub use crate::catalog::store::{CollectionStore, JsonCollectionStore, SaveOutcome};
pub use crate::compose::drag::{DragBounds, DragController, DragState};
pub use crate::compose::engine::{CompositionEngine, RemovalRequest};
pub use crate::compose::part::{
    LayerDirection, MAX_SCALE, MIN_SCALE, PlacedPart, ViewMode, clamp_scale,
};
pub use crate::compose::placement::Placement;
pub use crate::config::{CATALOG_CDN_HOST, ComposerConfig, ExportSettings, FetchConfig};
pub use crate::removal::engine::{BackgroundRemover, ProcessedImage};
pub use crate::removal::pipeline::{
    ALPHA_RAMP, CORNER_SAMPLE, EDGE_THRESHOLD, NEAR_WHITE, OPAQUE_DISTANCE, RemovalParams,
    TRANSPARENT_DISTANCE, dilate3x3, distance_alpha, erode3x3, estimate_background, sobel_edges,
    strip_background,
};
pub use crate::render::export::{EXPORT_FILE_NAME, FrameRGBA, encode_png, export_composition};
pub use crate::session::Composer;
