//! Pixport-Archive: uncompressed zip container writing for batch exports.
//!
//! This crate implements the subset of the zip format pixport needs to hand a
//! finished batch to the host's save mechanism, written from first principles:
//!
//! - **CRC-32 engine**: table-driven IEEE checksum over entry payloads
//! - **DOS timestamps**: the packed 16+16-bit date/time zip headers require
//! - **Writer**: local file sections, central directory, end record
//!
//! Entries are always stored (method 0). There is no ZIP64 support; archives
//! that would overflow the format's 16/32-bit fields are rejected with hard
//! errors rather than silently truncated.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use pixport_archive::ZipWriter;
//!
//! let mut writer = ZipWriter::new();
//! writer.add_entry("photo.png", b"not a real png", Utc::now()).unwrap();
//! let archive = writer.build();
//! assert_eq!(&archive[0..4], &[0x50, 0x4b, 0x03, 0x04]);
//! ```

pub mod crc32;
pub mod error;
pub mod timestamp;
pub mod writer;

pub use crc32::crc32;
pub use error::{Error, Result};
pub use timestamp::DosDateTime;
pub use writer::ZipWriter;
