//! Default conversion collaborator backed by the `image` crate.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use pixport_common::ImageFormat;
use tracing::debug;

use super::{ConvertError, ConvertRequest, ImageConverter};

/// Converts raster images by decoding and re-encoding them in memory.
///
/// Decode and encode run inside `spawn_blocking`: the work is CPU-bound and
/// allocation-heavy, and the blocking task is not interruptible. A caller
/// that stops waiting simply never observes the result.
pub struct RasterConverter;

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Webp => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Tiff => image::ImageFormat::Tiff,
    }
}

fn convert_blocking(request: ConvertRequest) -> Result<Bytes, ConvertError> {
    let decoded =
        image::load_from_memory_with_format(&request.bytes, codec_format(request.source_format))
            .map_err(|e| ConvertError::Decode {
                format: request.source_format,
                message: e.to_string(),
            })?;

    // JPEG has no alpha channel; flatten before encoding.
    let decoded = if request.target_format == ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(decoded.to_rgb8())
    } else {
        decoded
    };

    let mut output = Cursor::new(Vec::new());
    decoded
        .write_to(&mut output, codec_format(request.target_format))
        .map_err(|e| ConvertError::Encode {
            format: request.target_format,
            message: e.to_string(),
        })?;

    debug!(
        from = %request.source_format,
        to = %request.target_format,
        in_bytes = request.bytes.len(),
        out_bytes = output.get_ref().len(),
        "Converted image"
    );

    Ok(Bytes::from(output.into_inner()))
}

#[async_trait]
impl ImageConverter for RasterConverter {
    async fn convert(&self, request: ConvertRequest) -> Result<Bytes, ConvertError> {
        tokio::task::spawn_blocking(move || convert_blocking(request))
            .await
            .map_err(|_| ConvertError::Aborted)?
    }
}
