//! Analysis modules.
//!
//! This module joins the fetched collections and derives statistics
//! from the joined document.

pub mod aggregator;

pub use aggregator::*;
