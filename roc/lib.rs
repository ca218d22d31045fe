#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod config;
pub mod data;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod sweep;

// Rendering lives beside the analysis core, mirroring the multi-directory layout.
#[path = "../plot/mod.rs"]
pub mod plot;
