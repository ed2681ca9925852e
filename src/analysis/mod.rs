//! Analysis modules.
//!
//! `aggregator` holds the pure numeric transforms; `views` composes them into
//! the per-panel data the report renders.

pub mod aggregator;
pub mod views;

pub use views::*;
