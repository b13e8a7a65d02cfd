//! CLI library components for the resource request engine.

pub mod logging;
