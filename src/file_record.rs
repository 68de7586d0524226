//! On-block framing for one named file.
//!
//! Each erase block holds at most one file:
//! - Magic number (4 bytes): `0x4649_4C45` ('FILE')
//! - Payload length (2 bytes)
//! - Payload: postcard-serialized [`FileRecord`]
//! - CRC32 (4 bytes) over everything before it
//!
//! An erased block (all `0xFF`) has no magic and decodes as empty.

use crc32fast::Hasher;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Erase block size of the RP2040/RP2350 internal flash.
pub const BLOCK_SIZE: usize = 4096;
/// Largest file a single block holds.
pub const MAX_FILE_SIZE: usize = 1024;
/// Longest file path.
pub const MAX_PATH_LEN: usize = 64;

const MAGIC: u32 = 0x4649_4C45; // 'FILE'
const HEADER_SIZE: usize = 4 + 2; // Magic + PayloadLen
const CRC_SIZE: usize = 4;
const MAX_PAYLOAD_SIZE: usize = BLOCK_SIZE - HEADER_SIZE - CRC_SIZE;

/// A named file as stored in one block.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String<MAX_PATH_LEN>,
    pub contents: Vec<u8, MAX_FILE_SIZE>,
}

impl FileRecord {
    /// Build a record, checking path and content sizes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileTooLarge`] if either does not fit.
    pub fn new(path: &str, contents: &[u8]) -> Result<Self> {
        Ok(Self {
            path: String::try_from(path).map_err(|()| Error::FileTooLarge)?,
            contents: Vec::from_slice(contents).map_err(|()| Error::FileTooLarge)?,
        })
    }
}

/// Frame `record` into `block`, filling unused space with the erased value.
///
/// # Errors
///
/// Returns [`Error::FormatError`] if serialization fails.
#[expect(clippy::indexing_slicing, reason = "offsets are bounded by MAX_PAYLOAD_SIZE")]
#[expect(
    clippy::arithmetic_side_effects,
    reason = "payload_len <= MAX_PAYLOAD_SIZE, so the frame fits in BLOCK_SIZE"
)]
pub fn encode_block(record: &FileRecord, block: &mut [u8; BLOCK_SIZE]) -> Result<()> {
    let mut payload_buffer = [0u8; MAX_PAYLOAD_SIZE];
    let payload_len = postcard::to_slice(record, &mut payload_buffer)
        .map_err(|_| {
            error!(
                "FileRecord: Serialization failed or data too large (max {} bytes)",
                MAX_PAYLOAD_SIZE
            );
            Error::FormatError
        })?
        .len();
    let payload_len_u16 = u16::try_from(payload_len).map_err(|_| Error::FormatError)?;

    block.fill(0xFF);
    block[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    block[4..HEADER_SIZE].copy_from_slice(&payload_len_u16.to_le_bytes());
    block[HEADER_SIZE..HEADER_SIZE + payload_len].copy_from_slice(&payload_buffer[..payload_len]);

    let crc_offset = HEADER_SIZE + payload_len;
    let crc = compute_crc(&block[0..crc_offset]);
    block[crc_offset..crc_offset + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    Ok(())
}

/// Unframe a block.
///
/// Returns `Ok(None)` for a block that holds no file.
///
/// # Errors
///
/// Returns [`Error::StorageCorrupted`] if the length, CRC or payload is invalid.
pub fn decode_block(block: &[u8; BLOCK_SIZE]) -> Result<Option<FileRecord>> {
    if read_u32(block, 0)? != MAGIC {
        return Ok(None);
    }

    let payload_len = usize::from(u16::from_le_bytes(
        block
            .get(4..HEADER_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(Error::StorageCorrupted)?,
    ));
    if payload_len > MAX_PAYLOAD_SIZE {
        error!("FileRecord: Invalid payload length {}", payload_len);
        return Err(Error::StorageCorrupted);
    }

    let crc_offset = HEADER_SIZE
        .checked_add(payload_len)
        .ok_or(Error::StorageCorrupted)?;
    let stored_crc = read_u32(block, crc_offset)?;
    let computed_crc = compute_crc(block.get(..crc_offset).ok_or(Error::StorageCorrupted)?);
    if stored_crc != computed_crc {
        error!(
            "FileRecord: CRC mismatch (expected {}, found {})",
            computed_crc, stored_crc
        );
        return Err(Error::StorageCorrupted);
    }

    let payload = block
        .get(HEADER_SIZE..crc_offset)
        .ok_or(Error::StorageCorrupted)?;
    let record = postcard::from_bytes(payload).map_err(|_| {
        error!("FileRecord: Deserialization failed");
        Error::StorageCorrupted
    })?;
    Ok(Some(record))
}

fn read_u32(block: &[u8], offset: usize) -> Result<u32> {
    let bytes = block
        .get(offset..offset.checked_add(4).ok_or(Error::StorageCorrupted)?)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(Error::StorageCorrupted)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Compute CRC32 checksum.
fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
