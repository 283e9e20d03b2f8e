pub mod engine;

pub use engine::{Document, DocumentChange, DocumentError, Draft};
