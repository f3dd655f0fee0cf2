//! Clearing & Settlement
//!
//! Entry point of the engine: reconciles self-reported production
//! against trusted data, charges deviation penalties from escrow, and
//! mints the corrected reward exactly once per settlement key.

mod engine;

pub use engine::ClearingEngine;
