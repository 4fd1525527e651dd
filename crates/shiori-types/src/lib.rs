pub mod api;
pub mod models;

pub use api::{BoardField, BoardPatch, ValidationError};
pub use models::{Board, Link, NewBoard, NewLink, Reactions, toggle_reaction};
