pub(crate) mod drag;
pub(crate) mod engine;
pub(crate) mod part;
pub(crate) mod placement;
