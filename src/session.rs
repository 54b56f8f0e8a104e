//! Session glue: selection sync, background removal on the rayon pool, result merge, export.

use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    time::{Duration, Instant},
};

use crate::{
    assets::fetch::{ImageFetcher, RoutedFetcher},
    catalog::{
        model::{Collection, Minifig, MinifigPart},
        selection::Selection,
        store::{CollectionStore, SaveOutcome},
    },
    compose::{
        drag::{DragController, DragState},
        engine::{CompositionEngine, RemovalRequest},
        part::LayerDirection,
    },
    config::ComposerConfig,
    foundation::{core::Point, error::FigResult},
    removal::engine::{BackgroundRemover, ProcessedImage},
    render::export::{self, FrameRGBA},
};

struct RemovalDone {
    part_id: String,
    result: ProcessedImage,
}

/// Owns the selection and the composition built from it, and drives background removal.
///
/// Edits go through the selection and are mirrored onto the canvas, so a removed part stays
/// removed on the next sync and [`Composer::save`] writes the dragged positions.
///
/// Removal jobs only capture a part id, a URL, the shared remover and a channel sender. Results
/// are merged on the owning thread by [`Composer::poll`] and [`Composer::settle`], so a job whose
/// part was removed meanwhile is simply discarded.
pub struct Composer {
    config: ComposerConfig,
    fetcher: Arc<dyn ImageFetcher>,
    remover: Arc<BackgroundRemover>,
    selection: Selection,
    engine: CompositionEngine,
    drag: DragController,
    tx: Sender<RemovalDone>,
    rx: Receiver<RemovalDone>,
    in_flight: usize,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("parts", &self.engine.len())
            .field("in_flight", &self.in_flight)
            .field("remover", &self.remover)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Session over an explicit fetcher.
    pub fn new(config: ComposerConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let remover = Arc::new(BackgroundRemover::with_params(
            Arc::clone(&fetcher),
            config.removal,
        ));
        let (tx, rx) = mpsc::channel();
        Self {
            selection: Selection::new(),
            engine: CompositionEngine::new(config.placement_seed),
            drag: DragController::new(config.drag_bounds),
            config,
            fetcher,
            remover,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Session with a [`RoutedFetcher`] built from `config.fetch`.
    pub fn from_config(config: ComposerConfig) -> Self {
        let fetcher: Arc<dyn ImageFetcher> = Arc::new(RoutedFetcher::from_config(&config.fetch));
        Self::new(config, fetcher)
    }

    /// Session configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Current composition state.
    pub fn engine(&self) -> &CompositionEngine {
        &self.engine
    }

    /// Shared background remover.
    pub fn remover(&self) -> &Arc<BackgroundRemover> {
        &self.remover
    }

    /// Removal jobs spawned but not merged yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Parts and source minifigures currently selected.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select a part and place it. Returns the new part id.
    pub fn add_part(&mut self, part: MinifigPart, source: Minifig) -> String {
        let id = self.selection.add_part(part, source);
        self.sync();
        id
    }

    /// Drop a source minifigure together with every part taken from it.
    pub fn remove_source_minifig(&mut self, set_num: &str) {
        self.selection.remove_source_minifig(set_num);
        self.sync();
    }

    /// Replace the selection with a saved collection. Returns the number of jobs spawned.
    pub fn load_collection(&mut self, collection: &Collection) -> usize {
        self.drag.cancel();
        self.selection.load_collection(collection);
        self.sync()
    }

    /// Save the selection, including current part positions, under `title`.
    pub fn save(&self, store: &dyn CollectionStore, title: &str) -> SaveOutcome {
        store.save(
            title,
            self.selection.parts(),
            self.selection.source_minifigs(),
        )
    }

    /// Reconcile the canvas with the selection and start removal for every newly placed part.
    ///
    /// Returns the number of jobs spawned.
    pub fn sync(&mut self) -> usize {
        let requests = self.engine.sync_selection(self.selection.parts());
        let spawned = requests.len();
        for request in requests {
            self.spawn_removal(request);
        }
        spawned
    }

    fn spawn_removal(&mut self, request: RemovalRequest) {
        let RemovalRequest { part_id, url } = request;
        let remover = Arc::clone(&self.remover);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tracing::debug!(%part_id, %url, "spawning background removal");
        rayon::spawn(move || {
            let result = remover.remove_background(&url);
            // The receiver lives as long as the composer; a send error means it is gone.
            let _ = tx.send(RemovalDone { part_id, result });
        });
    }

    /// Merge every result that has already arrived. Returns how many were merged.
    pub fn poll(&mut self) -> usize {
        let mut merged = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.merge(done);
            merged += 1;
        }
        merged
    }

    /// Wait up to `timeout` for in-flight jobs, merging as they arrive.
    ///
    /// Returns `true` when nothing is left in flight.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        self.poll();
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(done) => self.merge(done),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(in_flight = self.in_flight, "settle timed out");
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn merge(&mut self, done: RemovalDone) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.engine.attach_processed(&done.part_id, done.result);
    }

    /// Set a part's position and remember it in the selection.
    pub fn move_part(&mut self, id: &str, position: Point) {
        if self.engine.get(id).is_some() {
            self.engine.move_part(id, position);
            self.selection.update_part_position(id, position);
        }
    }

    /// Set a part's scale (clamped).
    pub fn set_scale(&mut self, id: &str, scale: f64) {
        self.engine.set_scale(id, scale);
    }

    /// Set a part's rotation in degrees.
    pub fn set_rotation(&mut self, id: &str, degrees: f64) {
        self.engine.set_rotation(id, degrees);
    }

    /// Move a part one layer up or down.
    pub fn reorder(&mut self, id: &str, direction: LayerDirection) {
        self.engine.reorder(id, direction);
    }

    /// Deselect and remove one part.
    pub fn remove(&mut self, id: &str) {
        self.selection.remove_part(id);
        self.engine.remove(id);
    }

    /// Deselect every part, empty the canvas and abort any drag.
    pub fn clear(&mut self) {
        self.drag.cancel();
        self.selection.clear_parts();
        self.engine.clear();
    }

    /// Start dragging `id`. See [`DragController::pointer_down`].
    pub fn pointer_down(&mut self, id: &str, pointer: Point) -> bool {
        self.drag.pointer_down(&self.engine, id, pointer)
    }

    /// Continue the drag and remember the new position in the selection. See
    /// [`DragController::pointer_move`].
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Point> {
        let DragState::Dragging { part_id, .. } = self.drag.state() else {
            return None;
        };
        let part_id = part_id.clone();
        let position = self.drag.pointer_move(&mut self.engine, pointer)?;
        self.selection.update_part_position(&part_id, position);
        Some(position)
    }

    /// End the drag.
    pub fn pointer_up(&mut self) {
        self.drag.pointer_up();
    }

    /// Current drag controller.
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Settle for the configured delay, then rasterize the composition.
    #[tracing::instrument(skip(self))]
    pub fn export(&mut self) -> FigResult<FrameRGBA> {
        let settle = self.config.settle;
        if !self.settle(settle) {
            tracing::info!(
                pending = self.in_flight,
                "exporting before every removal finished"
            );
        }
        export::export_composition(
            self.engine.parts(),
            self.fetcher.as_ref(),
            &self.config.export,
        )
    }

    /// [`Composer::export`] encoded as PNG.
    pub fn export_png(&mut self) -> FigResult<Vec<u8>> {
        let frame = self.export()?;
        export::encode_png(&frame)
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
