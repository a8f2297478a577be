//! Cumulative climate impact and habitat partitioning of deep-sea climate projections.

pub mod bbox;
pub mod config;
pub mod date_gen;
pub mod error;
pub mod grid;
pub mod habitat;
pub mod impact;
pub mod indices;
pub mod mask;
pub mod pipeline;
pub mod readers;
pub mod sdm;
pub mod stats;
pub mod utils;
pub mod writers;
