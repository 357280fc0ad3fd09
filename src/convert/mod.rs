//! Image conversion collaborator interface.
//!
//! The batch orchestrator performs no pixel work itself; it drives an
//! [`ImageConverter`] once per job and applies its own deadline around the
//! call. Implementations either return output bytes or fail with a
//! descriptive error; a hung implementation is abandoned by the caller, not
//! interrupted.

mod raster;

pub use raster::RasterConverter;

use async_trait::async_trait;
use bytes::Bytes;
use pixport_common::ImageFormat;
use thiserror::Error;

/// One conversion request handed to the collaborator.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Raw source file contents.
    pub bytes: Bytes,
    /// Format the source claims to be.
    pub source_format: ImageFormat,
    /// Format to produce.
    pub target_format: ImageFormat,
}

/// Error type for conversion collaborators.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source bytes could not be decoded as the claimed format.
    #[error("Failed to decode {format} input: {message}")]
    Decode {
        format: ImageFormat,
        message: String,
    },

    /// The decoded image could not be encoded in the target format.
    #[error("Failed to encode {format} output: {message}")]
    Encode {
        format: ImageFormat,
        message: String,
    },

    /// The conversion task died before producing a result.
    #[error("Conversion task aborted before producing a result")]
    Aborted,
}

/// An image conversion service, invoked once per job.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    /// Convert one image from `source_format` to `target_format`.
    async fn convert(&self, request: ConvertRequest) -> Result<Bytes, ConvertError>;
}
