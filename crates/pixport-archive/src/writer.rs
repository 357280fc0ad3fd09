//! Zip archive writer: local file sections, central directory, end record.
//!
//! Each `add_entry` call encodes the local file header and appends it,
//! followed by the raw payload, to the accumulator buffer. The entry's
//! offset is read off the accumulator length at append time, so the offsets
//! recorded in the central directory always equal the actual cumulative byte
//! length. `build` consumes the writer, appends one central-directory record
//! per entry in insertion order, and closes with the end-of-central-directory
//! record. All multi-byte fields are little-endian.

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::crc32::crc32;
use crate::error::{Error, Result};
use crate::timestamp::DosDateTime;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version 2.0: the floor for store-only archives.
const VERSION: u16 = 20;

/// Fixed portion of a local file header.
const LOCAL_HEADER_LEN: usize = 30;
/// Fixed portion of a central directory record.
const CENTRAL_RECORD_LEN: usize = 46;
/// The end-of-central-directory record with an empty comment.
const END_RECORD_LEN: usize = 22;

const MAX_ENTRIES: usize = u16::MAX as usize;
const MAX_ENTRY_SIZE: u64 = u32::MAX as u64;
/// Hard cap on the whole archive so every offset and size field stays
/// representable in 32 bits (no ZIP64).
const MAX_ARCHIVE_SIZE: u64 = u32::MAX as u64;

/// Per-entry metadata retained for the central directory.
#[derive(Debug, Clone)]
struct EntryRecord {
    name: String,
    crc: u32,
    size: u32,
    modified: DosDateTime,
    local_header_offset: u32,
}

/// Builds one uncompressed zip archive.
///
/// A writer is populated once and consumed by [`build`](Self::build); create
/// a fresh writer per export.
pub struct ZipWriter {
    buf: BytesMut,
    entries: Vec<EntryRecord>,
    names: HashSet<String>,
    central_size: u64,
}

impl ZipWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            entries: Vec::new(),
            names: HashSet::new(),
            central_size: 0,
        }
    }

    /// Number of entries added so far.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// True if no entry has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry: local file header followed by the raw payload.
    ///
    /// `name` must be unique within the archive; callers resolve conflicts
    /// before adding. `modified` becomes the entry's DOS timestamp.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate name or when the entry would overflow a zip
    /// field: name length over `u16::MAX` bytes, payload over `u32::MAX`
    /// bytes, more than `u16::MAX` entries, or a total archive over
    /// `u32::MAX` bytes.
    pub fn add_entry(
        &mut self,
        name: &str,
        bytes: &[u8],
        modified: DateTime<Utc>,
    ) -> Result<()> {
        if self.names.contains(name) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(Error::TooManyEntries { limit: MAX_ENTRIES });
        }

        let name_len = name.len();
        if name_len > u16::MAX as usize {
            return Err(Error::NameTooLong {
                length: name_len,
                limit: u16::MAX as usize,
            });
        }

        let size = bytes.len() as u64;
        if size > MAX_ENTRY_SIZE {
            return Err(Error::EntryTooLarge {
                name: name.to_string(),
                size,
                limit: MAX_ENTRY_SIZE,
            });
        }

        // Reject the entry while nothing has been emitted yet if the final
        // archive (locals + central directory + end record) would leave any
        // 32-bit offset or size field unrepresentable.
        let local_len = (LOCAL_HEADER_LEN + name_len) as u64 + size;
        let central_len = (CENTRAL_RECORD_LEN + name_len) as u64;
        let projected = self.buf.len() as u64
            + local_len
            + self.central_size
            + central_len
            + END_RECORD_LEN as u64;
        if projected > MAX_ARCHIVE_SIZE {
            return Err(Error::ArchiveTooLarge {
                projected,
                limit: MAX_ARCHIVE_SIZE,
            });
        }

        let local_header_offset = self.buf.len() as u32;
        let record = EntryRecord {
            name: name.to_string(),
            crc: crc32(bytes),
            size: bytes.len() as u32,
            modified: DosDateTime::from_utc(modified),
            local_header_offset,
        };

        self.buf.reserve(LOCAL_HEADER_LEN + name_len + bytes.len());
        self.buf.put_u32_le(LOCAL_HEADER_SIG);
        self.buf.put_u16_le(VERSION); // version needed to extract
        self.buf.put_u16_le(0); // general purpose flags
        self.buf.put_u16_le(0); // method: stored
        self.buf.put_u16_le(record.modified.time);
        self.buf.put_u16_le(record.modified.date);
        self.buf.put_u32_le(record.crc);
        self.buf.put_u32_le(record.size); // compressed size
        self.buf.put_u32_le(record.size); // uncompressed size
        self.buf.put_u16_le(name_len as u16);
        self.buf.put_u16_le(0); // extra field length
        self.buf.put_slice(name.as_bytes());
        self.buf.put_slice(bytes);

        self.central_size += central_len;
        self.names.insert(record.name.clone());
        self.entries.push(record);
        Ok(())
    }

    /// Assemble the final archive bytes.
    ///
    /// Consumes the writer: the central directory and end record are derived
    /// from the entry list exactly once, and a populated writer cannot be
    /// extended afterwards.
    pub fn build(mut self) -> Bytes {
        let central_dir_offset = self.buf.len() as u32;

        for entry in &self.entries {
            self.buf
                .reserve(CENTRAL_RECORD_LEN + entry.name.len());
            self.buf.put_u32_le(CENTRAL_DIR_SIG);
            self.buf.put_u16_le(VERSION); // version made by
            self.buf.put_u16_le(VERSION); // version needed to extract
            self.buf.put_u16_le(0); // general purpose flags
            self.buf.put_u16_le(0); // method: stored
            self.buf.put_u16_le(entry.modified.time);
            self.buf.put_u16_le(entry.modified.date);
            self.buf.put_u32_le(entry.crc);
            self.buf.put_u32_le(entry.size); // compressed size
            self.buf.put_u32_le(entry.size); // uncompressed size
            self.buf.put_u16_le(entry.name.len() as u16);
            self.buf.put_u16_le(0); // extra field length
            self.buf.put_u16_le(0); // comment length
            self.buf.put_u16_le(0); // disk number start
            self.buf.put_u16_le(0); // internal attributes
            self.buf.put_u32_le(0); // external attributes
            self.buf.put_u32_le(entry.local_header_offset);
            self.buf.put_slice(entry.name.as_bytes());
        }

        let central_dir_size = self.buf.len() as u32 - central_dir_offset;
        let entry_count = self.entries.len() as u16;

        self.buf.reserve(END_RECORD_LEN);
        self.buf.put_u32_le(END_OF_CENTRAL_DIR_SIG);
        self.buf.put_u16_le(0); // this disk
        self.buf.put_u16_le(0); // disk where central directory starts
        self.buf.put_u16_le(entry_count); // entries on this disk
        self.buf.put_u16_le(entry_count); // entries total
        self.buf.put_u32_le(central_dir_size);
        self.buf.put_u32_le(central_dir_offset);
        self.buf.put_u16_le(0); // comment length

        self.buf.freeze()
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Minimal conformant reader: walks the central directory the way a
    /// third-party extractor would, cross-checking each local header.
    mod reader {
        pub struct Entry {
            pub name: String,
            pub crc: u32,
            pub size: u32,
            pub time: u16,
            pub date: u16,
            pub offset: u32,
            pub data: Vec<u8>,
        }

        fn u16_at(buf: &[u8], pos: usize) -> u16 {
            u16::from_le_bytes([buf[pos], buf[pos + 1]])
        }

        fn u32_at(buf: &[u8], pos: usize) -> u32 {
            u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
        }

        pub fn parse(archive: &[u8]) -> Vec<Entry> {
            // End record is the final 22 bytes (comments are never written).
            assert!(archive.len() >= 22, "archive shorter than end record");
            let end = archive.len() - 22;
            assert_eq!(u32_at(archive, end), 0x0605_4b50, "end record signature");
            assert_eq!(u16_at(archive, end + 4), 0, "disk number");
            assert_eq!(u16_at(archive, end + 6), 0, "central directory disk");
            let count = u16_at(archive, end + 8);
            assert_eq!(count, u16_at(archive, end + 10), "entry counts disagree");
            let cd_size = u32_at(archive, end + 12) as usize;
            let cd_offset = u32_at(archive, end + 16) as usize;
            assert_eq!(cd_offset + cd_size, end, "central directory bounds");
            assert_eq!(u16_at(archive, end + 20), 0, "comment length");

            let mut entries = Vec::new();
            let mut pos = cd_offset;
            for _ in 0..count {
                assert_eq!(u32_at(archive, pos), 0x0201_4b50, "central signature");
                assert_eq!(u16_at(archive, pos + 10), 0, "method must be stored");
                let time = u16_at(archive, pos + 12);
                let date = u16_at(archive, pos + 14);
                let crc = u32_at(archive, pos + 16);
                let compressed = u32_at(archive, pos + 20);
                let size = u32_at(archive, pos + 24);
                assert_eq!(compressed, size, "stored entries keep both sizes equal");
                let name_len = u16_at(archive, pos + 28) as usize;
                let offset = u32_at(archive, pos + 42);
                let name =
                    String::from_utf8(archive[pos + 46..pos + 46 + name_len].to_vec())
                        .expect("entry name is utf-8");
                entries.push(Entry {
                    name,
                    crc,
                    size,
                    time,
                    date,
                    offset,
                    data: Vec::new(),
                });
                pos += 46 + name_len;
            }
            assert_eq!(pos, cd_offset + cd_size, "central directory size");

            // Cross-check every local header against its central record.
            for entry in &mut entries {
                let pos = entry.offset as usize;
                assert_eq!(u32_at(archive, pos), 0x0403_4b50, "local signature");
                assert_eq!(u16_at(archive, pos + 4), 20, "version needed");
                assert_eq!(u16_at(archive, pos + 6), 0, "flags");
                assert_eq!(u16_at(archive, pos + 8), 0, "method");
                assert_eq!(u16_at(archive, pos + 10), entry.time, "local time");
                assert_eq!(u16_at(archive, pos + 12), entry.date, "local date");
                assert_eq!(u32_at(archive, pos + 14), entry.crc, "local crc");
                assert_eq!(u32_at(archive, pos + 18), entry.size, "compressed size");
                assert_eq!(u32_at(archive, pos + 22), entry.size, "uncompressed size");
                let name_len = u16_at(archive, pos + 26) as usize;
                assert_eq!(u16_at(archive, pos + 28), 0, "extra length");
                assert_eq!(
                    &archive[pos + 30..pos + 30 + name_len],
                    entry.name.as_bytes(),
                    "local name"
                );
                let data_start = pos + 30 + name_len;
                entry.data = archive[data_start..data_start + entry.size as usize].to_vec();
            }

            entries
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 20, 30).unwrap()
    }

    #[test]
    fn empty_writer_builds_end_record_only() {
        let archive = ZipWriter::new().build();
        assert_eq!(archive.len(), 22);
        let entries = reader::parse(&archive);
        assert!(entries.is_empty());
    }

    #[test]
    fn single_entry_round_trip() {
        let payload = b"payload bytes that are definitely not an image";
        let mut writer = ZipWriter::new();
        writer.add_entry("photo.png", payload, ts()).unwrap();
        let archive = writer.build();

        let entries = reader::parse(&archive);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "photo.png");
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[0].data, payload);
        assert_eq!(entries[0].crc, crc32(payload));
    }

    #[test]
    fn offsets_equal_cumulative_encoded_length() {
        let mut writer = ZipWriter::new();
        writer.add_entry("a.png", &[1u8; 100], ts()).unwrap();
        writer.add_entry("bb.png", &[2u8; 7], ts()).unwrap();
        writer.add_entry("ccc.png", &[], ts()).unwrap();
        let archive = writer.build();

        let entries = reader::parse(&archive);
        assert_eq!(entries[0].offset, 0);
        // 30-byte header + 5-byte name + 100-byte payload.
        assert_eq!(entries[1].offset, 135);
        assert_eq!(entries[2].offset, 135 + 30 + 6 + 7);
    }

    #[test]
    fn contents_and_checksums_survive_round_trip() {
        let inputs: Vec<(String, Vec<u8>)> = (0..10)
            .map(|i| {
                (
                    format!("image_{i}.webp"),
                    (0..=255u8).cycle().take(13 * (i + 1)).collect(),
                )
            })
            .collect();

        let mut writer = ZipWriter::new();
        for (name, data) in &inputs {
            writer.add_entry(name, data, ts()).unwrap();
        }
        let archive = writer.build();

        let entries = reader::parse(&archive);
        assert_eq!(entries.len(), inputs.len());
        for (entry, (name, data)) in entries.iter().zip(&inputs) {
            assert_eq!(&entry.name, name);
            assert_eq!(&entry.data, data);
            assert_eq!(entry.crc, crc32(data));
        }
    }

    #[test]
    fn timestamps_are_packed_into_headers() {
        let modified = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 58).unwrap();
        let mut writer = ZipWriter::new();
        writer.add_entry("y2k.gif", b"89a", modified).unwrap();
        let archive = writer.build();

        let entries = reader::parse(&archive);
        let expected = DosDateTime::from_utc(modified);
        assert_eq!(entries[0].time, expected.time);
        assert_eq!(entries[0].date, expected.date);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut writer = ZipWriter::new();
        writer.add_entry("photo.png", b"one", ts()).unwrap();
        let err = writer.add_entry("photo.png", b"two", ts()).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry(name) if name == "photo.png"));
        // The writer is still usable and the first entry is intact.
        writer.add_entry("photo_1.png", b"two", ts()).unwrap();
        assert_eq!(writer.entry_count(), 2);
    }

    #[test]
    fn oversized_name_is_rejected() {
        let name = "x".repeat(u16::MAX as usize + 1);
        let mut writer = ZipWriter::new();
        let err = writer.add_entry(&name, b"", ts()).unwrap_err();
        assert!(matches!(err, Error::NameTooLong { .. }));
        assert!(writer.is_empty());
    }

    #[test]
    fn non_ascii_names_use_byte_length() {
        let name = "fotografía días.png";
        let mut writer = ZipWriter::new();
        writer.add_entry(name, b"data", ts()).unwrap();
        let archive = writer.build();

        let entries = reader::parse(&archive);
        assert_eq!(entries[0].name, name);
        // Local header name-length field counts bytes, not chars.
        let name_len = u16::from_le_bytes([archive[26], archive[27]]);
        assert_eq!(name_len as usize, name.len());
    }

    #[test]
    fn empty_payload_entry() {
        let mut writer = ZipWriter::new();
        writer.add_entry("empty.bmp", b"", ts()).unwrap();
        let archive = writer.build();

        let entries = reader::parse(&archive);
        assert_eq!(entries[0].size, 0);
        assert_eq!(entries[0].crc, 0);
        assert!(entries[0].data.is_empty());
    }
}
