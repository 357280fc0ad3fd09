//! Export service: package completed batch outputs into one zip archive.
//!
//! A fresh writer and name scope are created per export; callers that reach
//! an export error fall back to saving files individually.

pub mod naming;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use pixport_archive::ZipWriter;

use crate::batch::ConvertedImage;
use naming::{sanitize_file_name, NameAllocator, NamingError};

/// Error type for archive exports.
///
/// Both variants indicate a caller-contract violation or a format limit,
/// never a recoverable per-entry condition: the export as a whole fails.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Name conflict resolution ran out of suffixes.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The archive writer rejected an entry.
    #[error(transparent)]
    Archive(#[from] pixport_archive::Error),
}

/// Package the outputs into one uncompressed zip archive, in output order.
///
/// Each entry is named by sanitizing the output's source name for its new
/// format and resolving conflicts within this export, then stamped with the
/// output's conversion time.
pub fn build_archive(outputs: &[ConvertedImage]) -> Result<Bytes, ExportError> {
    let mut writer = ZipWriter::new();
    let mut names = NameAllocator::new();

    for output in outputs {
        let candidate = sanitize_file_name(&output.source_name, output.format.extension());
        let name = names.resolve(&candidate)?;
        debug!(
            job_id = %output.job_id,
            %name,
            bytes = output.bytes.len(),
            "Adding archive entry"
        );
        writer.add_entry(&name, &output.bytes, output.converted_at)?;
    }

    info!(entries = writer.entry_count(), "Building export archive");
    Ok(writer.build())
}

/// Download name for an export produced at `now`.
pub fn archive_file_name(now: DateTime<Utc>) -> String {
    format!("converted_images_{}.zip", now.format("%Y%m%d_%H%M%S"))
}
