use crate::{
    catalog::model::SelectedPart,
    foundation::core::{Affine, Point},
    removal::engine::ProcessedImage,
};

/// Smallest allowed part scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed part scale.
pub const MAX_SCALE: f64 = 3.0;

/// Clamp a requested scale into `[MIN_SCALE, MAX_SCALE]`. NaN maps to 1.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Which image variant is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Background-stripped image when available.
    #[default]
    Processed,
    /// Always the untouched catalog image.
    Original,
}

/// Direction for [`crate::CompositionEngine::reorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerDirection {
    /// Toward the top (higher layer).
    Up,
    /// Toward the bottom (lower layer).
    Down,
}

/// One part instance on the canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlacedPart {
    /// Same id as the originating [`SelectedPart`].
    pub id: String,
    /// Originating selection record.
    pub source: SelectedPart,
    /// Removal result; `None` while pending.
    pub processed: Option<ProcessedImage>,
    /// Dense 0-based draw order.
    pub layer: usize,
    /// Canvas position of the part's center.
    pub position: Point,
    /// Uniform scale in `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

impl PlacedPart {
    /// `true` while background removal has not reported back.
    pub fn is_pending(&self) -> bool {
        self.processed.is_none()
    }

    /// URL of the untouched catalog image.
    pub fn original_url(&self) -> &str {
        match &self.processed {
            Some(p) => &p.original_url,
            None => self.source.part.image_url(),
        }
    }

    /// URL to draw for `view`; falls back to the original when not processed.
    pub fn display_url(&self, view: ViewMode) -> &str {
        match (&self.processed, view) {
            (Some(p), ViewMode::Processed) if p.is_processed => &p.processed_url,
            _ => self.original_url(),
        }
    }

    /// Canvas transform: translate to `position`, rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale(self.scale)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/part.rs"]
mod tests;
