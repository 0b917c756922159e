//! Utility helpers
//!
//! In-memory log capture and tracing setup for hosts embedding the engine.

pub mod logging;
