//! CRC-32 checksum engine.
//!
//! The zip format records an IEEE CRC-32 (reflected polynomial 0xEDB88320)
//! over each entry's raw payload. The 256-entry lookup table is built on
//! first use and cached for the process lifetime.

use std::sync::OnceLock;

/// Reflected IEEE 802.3 polynomial.
const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn table() -> &'static [u32; 256] {
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut crc = i as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ POLYNOMIAL
                } else {
                    crc >> 1
                };
            }
            *slot = crc;
        }
        table
    })
}

/// Compute the CRC-32 of a byte sequence.
///
/// Initial value 0xFFFFFFFF, final XOR 0xFFFFFFFF, as required by the zip
/// entry header fields.
pub fn crc32(bytes: &[u8]) -> u32 {
    let table = table();
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ table[index];
    }
    crc ^ 0xFFFF_FFFF
}
