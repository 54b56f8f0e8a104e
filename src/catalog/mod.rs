pub(crate) mod model;
pub(crate) mod selection;
pub(crate) mod store;
