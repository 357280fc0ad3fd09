//! Pixport-Common: shared types and identifiers.
//!
//! This crate provides the vocabulary used across pixport:
//!
//! - **Typed IDs**: a type-safe UUID wrapper for conversion jobs
//! - **Image Formats**: the format enum with extension mapping used by the
//!   batch orchestrator and the export naming layer
//!
//! # Examples
//!
//! ```
//! use pixport_common::{ImageFormat, JobId};
//!
//! let job_id = JobId::new();
//! let format = ImageFormat::from_extension("JPG").unwrap();
//! assert_eq!(format, ImageFormat::Jpeg);
//! assert_eq!(format.extension(), "jpg");
//! ```

pub mod formats;
pub mod ids;

pub use formats::ImageFormat;
pub use ids::JobId;
