use crate::{
    compose::engine::CompositionEngine,
    foundation::core::{Point, Vec2},
};

/// Clamp rectangle for dragged part centers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragBounds {
    /// Left edge.
    pub min_x: f64,
    /// Right edge.
    pub max_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl Default for DragBounds {
    fn default() -> Self {
        Self {
            min_x: 50.0,
            max_x: 550.0,
            min_y: 50.0,
            max_y: 350.0,
        }
    }
}

impl DragBounds {
    /// Clamp `p` into the rectangle.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.min_x, self.max_x),
            p.y.clamp(self.min_y, self.max_y),
        )
    }
}

/// Drag gesture state.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A part follows the pointer.
    Dragging {
        /// Part being dragged.
        part_id: String,
        /// Pointer position minus part position at grab time.
        grab_offset: Vec2,
    },
}

/// Pointer-driven drag of one part at a time.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    bounds: DragBounds,
    state: DragState,
}

impl DragController {
    /// Idle controller with the given clamp rectangle.
    pub fn new(bounds: DragBounds) -> Self {
        Self {
            bounds,
            state: DragState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// `true` while a part is grabbed.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Grab `id` at `pointer`. Returns `false` (and stays idle) when the part does not exist.
    ///
    /// A grab replaces any drag still in progress.
    pub fn pointer_down(&mut self, engine: &CompositionEngine, id: &str, pointer: Point) -> bool {
        match engine.get(id) {
            Some(part) => {
                self.state = DragState::Dragging {
                    part_id: id.to_string(),
                    grab_offset: pointer - part.position,
                };
                true
            }
            None => {
                self.state = DragState::Idle;
                false
            }
        }
    }

    /// Move the grabbed part to `pointer - grab_offset`, clamped. Returns the new position.
    ///
    /// Returns `None` when idle. A drag whose part was removed meanwhile is dropped here.
    pub fn pointer_move(
        &mut self,
        engine: &mut CompositionEngine,
        pointer: Point,
    ) -> Option<Point> {
        let DragState::Dragging {
            part_id,
            grab_offset,
        } = &self.state
        else {
            return None;
        };
        if engine.get(part_id).is_none() {
            tracing::debug!(%part_id, "dragged part disappeared");
            self.state = DragState::Idle;
            return None;
        }
        let position = self.bounds.clamp(pointer - *grab_offset);
        engine.move_part(part_id, position);
        Some(position)
    }

    /// Release the grab.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// Abort the gesture. The part stays where the last move put it.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/drag.rs"]
mod tests;
