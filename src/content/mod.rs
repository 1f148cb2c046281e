mod engine;
mod model;
mod set_map;

pub use engine::{ContentEngine, ContentQuery, MemoryEngine, QuerySort, SET_OBJECT_TAG};
pub use model::{ContentModel, ModelKind};
pub use set_map::SetMap;
