//! Pixport - client-side batch image conversion and export
//!
//! This library crate exposes the export subsystem: the sequential batch
//! conversion orchestrator, output file naming, and the zip export service.

pub mod batch;
pub mod convert;
pub mod export;
