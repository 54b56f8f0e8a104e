use crate::{
    catalog::model::{Collection, Minifig, MinifigPart, SelectedPart},
    foundation::core::Point,
};

/// The "currently selected parts" list and the minifigures they come from.
///
/// This is the input side of [`crate::CompositionEngine::sync_selection`]; the engine never
/// writes here.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    parts: Vec<SelectedPart>,
    source_minifigs: Vec<Minifig>,
    current_minifig: Option<Minifig>,
    next_seq: u64,
}

impl Selection {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected parts in selection order.
    pub fn parts(&self) -> &[SelectedPart] {
        &self.parts
    }

    /// Minifigures used as sources.
    pub fn source_minifigs(&self) -> &[Minifig] {
        &self.source_minifigs
    }

    /// Minifigure currently being browsed.
    pub fn current_minifig(&self) -> Option<&Minifig> {
        self.current_minifig.as_ref()
    }

    /// Select a part. Returns the new selection id (`<part_num>-<color_id>-<seq>`).
    ///
    /// The source minifigure is registered as a source if it is not one already.
    pub fn add_part(&mut self, part: MinifigPart, source: Minifig) -> String {
        let id = loop {
            self.next_seq += 1;
            let candidate = format!("{}-{}-{}", part.part.part_num, part.color.id, self.next_seq);
            if !self.parts.iter().any(|p| p.id == candidate) {
                break candidate;
            }
        };
        self.add_source_minifig(source.clone());
        self.parts.push(SelectedPart {
            id: id.clone(),
            part,
            source_minifig: source,
            position: None,
        });
        id
    }

    /// Deselect a part. Returns `false` for unknown ids.
    pub fn remove_part(&mut self, id: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|p| p.id != id);
        self.parts.len() != before
    }

    /// Remember the canvas position of a part so it survives save/load.
    pub fn update_part_position(&mut self, id: &str, position: Point) {
        if let Some(p) = self.parts.iter_mut().find(|p| p.id == id) {
            p.position = Some(position);
        }
    }

    /// Deselect all parts.
    pub fn clear_parts(&mut self) {
        self.parts.clear();
    }

    /// Set the minifigure being browsed.
    pub fn set_current_minifig(&mut self, minifig: Option<Minifig>) {
        self.current_minifig = minifig;
    }

    /// Register a source minifigure. Duplicates (by `set_num`) are ignored.
    pub fn add_source_minifig(&mut self, minifig: Minifig) -> bool {
        if self
            .source_minifigs
            .iter()
            .any(|m| m.set_num == minifig.set_num)
        {
            return false;
        }
        self.source_minifigs.push(minifig);
        true
    }

    /// Drop a source minifigure and every part selected from it.
    pub fn remove_source_minifig(&mut self, set_num: &str) {
        self.source_minifigs.retain(|m| m.set_num != set_num);
        self.parts.retain(|p| p.source_minifig.set_num != set_num);
    }

    /// Drop all sources, all parts and the browsed minifigure.
    pub fn clear_source_minifigs(&mut self) {
        self.source_minifigs.clear();
        self.parts.clear();
        self.current_minifig = None;
    }

    /// Replace the selection with a saved collection.
    pub fn load_collection(&mut self, collection: &Collection) {
        self.parts = collection.parts.clone();
        self.source_minifigs = collection.source_minifigs.clone();
        self.current_minifig = collection.source_minifigs.first().cloned();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/selection.rs"]
mod tests;
