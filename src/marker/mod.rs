//! Marker-set record model.
//!
//! `model` holds the typed record and its on-disk counterpart; `rules` holds
//! the normalization and validation steps every record goes through.

pub mod model;
pub mod rules;

pub use model::{MarkerSet, MarkerSetFields};
pub use rules::MarkerSetError;
