use std::collections::HashSet;

use crate::{
    catalog::model::SelectedPart,
    compose::{
        part::{LayerDirection, PlacedPart, clamp_scale},
        placement::Placement,
    },
    foundation::core::Point,
    removal::engine::ProcessedImage,
};

/// Work item emitted by [`CompositionEngine::sync_selection`]: the caller runs `url` through the
/// remover and hands the result back with [`CompositionEngine::attach_processed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalRequest {
    /// Target part.
    pub part_id: String,
    /// Source image.
    pub url: String,
}

/// Authoritative list of placed parts.
///
/// The list is kept in draw order: index `i` always has `layer == i`. Every operation that takes
/// an id is a silent no-op when the id is unknown.
#[derive(Clone, Debug)]
pub struct CompositionEngine {
    parts: Vec<PlacedPart>,
    placement: Placement,
}

impl Default for CompositionEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CompositionEngine {
    /// Empty canvas; `seed` drives the placement fallback jitter.
    pub fn new(seed: u64) -> Self {
        Self {
            parts: Vec::new(),
            placement: Placement::new(seed),
        }
    }

    /// Placed parts in draw order.
    pub fn parts(&self) -> &[PlacedPart] {
        &self.parts
    }

    /// Part by id.
    pub fn get(&self, id: &str) -> Option<&PlacedPart> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Number of placed parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// `true` when nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Reconcile the canvas with the current selection.
    ///
    /// Parts no longer selected are dropped, newly selected ones are appended on top with default
    /// transforms. Returns one removal request per new part; empty when nothing changed.
    #[tracing::instrument(skip(self, selected), fields(count = selected.len()))]
    pub fn sync_selection(&mut self, selected: &[SelectedPart]) -> Vec<RemovalRequest> {
        let mut seen: HashSet<&str> = self.parts.iter().map(|p| p.id.as_str()).collect();
        // Duplicate ids in `selected` collapse onto their first occurrence.
        let new_parts: Vec<&SelectedPart> = selected
            .iter()
            .filter(|s| seen.insert(s.id.as_str()))
            .collect();

        let selected_ids: HashSet<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        let kept = self
            .parts
            .iter()
            .filter(|p| selected_ids.contains(p.id.as_str()))
            .count();

        if new_parts.is_empty() && kept == self.parts.len() {
            return Vec::new();
        }

        let new_parts: Vec<SelectedPart> = new_parts.into_iter().cloned().collect();
        self.parts.retain(|p| selected_ids.contains(p.id.as_str()));

        let mut requests = Vec::with_capacity(new_parts.len());
        for source in new_parts {
            let position = match source.position {
                Some(pos) => pos,
                None => {
                    let occupied: Vec<Point> = self.parts.iter().map(|p| p.position).collect();
                    self.placement.next_free(&occupied)
                }
            };
            requests.push(RemovalRequest {
                part_id: source.id.clone(),
                url: source.part.image_url().to_string(),
            });
            self.parts.push(PlacedPart {
                id: source.id.clone(),
                source,
                processed: None,
                layer: 0,
                position,
                scale: 1.0,
                rotation: 0.0,
            });
        }
        self.renumber();
        tracing::debug!(
            parts = self.parts.len(),
            added = requests.len(),
            "selection synced"
        );
        requests
    }

    /// Store a removal result. Returns `false` and discards it when the part is gone.
    pub fn attach_processed(&mut self, id: &str, processed: ProcessedImage) -> bool {
        match self.get_mut(id) {
            Some(part) => {
                part.processed = Some(processed);
                true
            }
            None => {
                tracing::debug!(%id, "dropping removal result for missing part");
                false
            }
        }
    }

    /// Set a part's position.
    pub fn move_part(&mut self, id: &str, position: Point) {
        if let Some(part) = self.get_mut(id) {
            part.position = position;
        }
    }

    /// Set a part's scale, clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn set_scale(&mut self, id: &str, scale: f64) {
        if let Some(part) = self.get_mut(id) {
            part.scale = clamp_scale(scale);
        }
    }

    /// Set a part's rotation in degrees. Stored as given.
    pub fn set_rotation(&mut self, id: &str, degrees: f64) {
        if let Some(part) = self.get_mut(id) {
            part.rotation = degrees;
        }
    }

    /// Swap a part with its neighbor in draw order. No-op at the top or bottom.
    pub fn reorder(&mut self, id: &str, direction: LayerDirection) {
        let Some(idx) = self.parts.iter().position(|p| p.id == id) else {
            return;
        };
        let other = match direction {
            LayerDirection::Up if idx + 1 < self.parts.len() => idx + 1,
            LayerDirection::Down if idx > 0 => idx - 1,
            _ => return,
        };
        self.parts.swap(idx, other);
        self.renumber();
    }

    /// Remove one part.
    pub fn remove(&mut self, id: &str) {
        let before = self.parts.len();
        self.parts.retain(|p| p.id != id);
        if self.parts.len() != before {
            self.renumber();
        }
    }

    /// Remove every part.
    pub fn clear(&mut self) {
        self.parts.clear();
    }

    /// Ids of parts still waiting for a removal result.
    pub fn pending_ids(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.is_pending())
            .map(|p| p.id.as_str())
            .collect()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut PlacedPart> {
        self.parts.iter_mut().find(|p| p.id == id)
    }

    fn renumber(&mut self) {
        for (i, part) in self.parts.iter_mut().enumerate() {
            part.layer = i;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/engine.rs"]
mod tests;
