// Note sub-engine: category-agnostic note operations shared by every note-bearing record

pub mod category;
pub mod engine;

pub use category::NoteCategory;
pub use engine::*;
