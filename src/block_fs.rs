//! A small named-file store over erase blocks, one file per block.
//!
//! Files are found by scanning the blocks for a record with a matching path. Writing a file
//! reuses its block, or takes the first block that is empty or unreadable.

use crate::file_record::{BLOCK_SIZE, FileRecord, decode_block, encode_block};
use crate::storage::FileSystem;
use crate::{Error, Result};

/// Storage made of fixed-size erase blocks.
pub trait BlockDevice {
    /// Number of blocks available to the file store.
    fn block_count(&self) -> u32;

    /// Read block `index` into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the device read fails.
    fn read_block(&mut self, index: u32, buffer: &mut [u8; BLOCK_SIZE]) -> Result<()>;

    /// Erase block `index` and program it with `buffer`.
    ///
    /// # Errors
    ///
    /// Returns an error if erasing or programming fails.
    fn write_block(&mut self, index: u32, buffer: &[u8; BLOCK_SIZE]) -> Result<()>;
}

/// A [`FileSystem`] over a [`BlockDevice`].
pub struct BlockFileSystem<B: BlockDevice> {
    device: B,
    mounted: bool,
}

enum Slot {
    Match(u32),
    Free(u32),
}

impl<B: BlockDevice> BlockFileSystem<B> {
    #[must_use]
    pub const fn new(device: B) -> Self {
        Self {
            device,
            mounted: false,
        }
    }

    /// Access the underlying device.
    pub const fn device_mut(&mut self) -> &mut B {
        &mut self.device
    }

    const fn ensure_mounted(&self) -> Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(Error::StorageNotMounted)
        }
    }

    fn find(&mut self, path: &str, block: &mut [u8; BLOCK_SIZE]) -> Result<Option<FileRecord>> {
        for index in 0..self.device.block_count() {
            self.device.read_block(index, block)?;
            match decode_block(block) {
                Ok(Some(record)) if record.path.as_str() == path => return Ok(Some(record)),
                Ok(_) => {}
                Err(_) => warn!("BlockFileSystem: skipping unreadable block {}", index),
            }
        }
        Ok(None)
    }

    fn slot_for(&mut self, path: &str, block: &mut [u8; BLOCK_SIZE]) -> Result<Option<Slot>> {
        let mut free = None;
        for index in 0..self.device.block_count() {
            self.device.read_block(index, block)?;
            match decode_block(block) {
                Ok(Some(record)) if record.path.as_str() == path => {
                    return Ok(Some(Slot::Match(index)));
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => {
                    if free.is_none() {
                        free = Some(Slot::Free(index));
                    }
                }
            }
        }
        Ok(free)
    }
}

impl<B: BlockDevice> FileSystem for BlockFileSystem<B> {
    fn mount(&mut self) -> Result<()> {
        if self.device.block_count() == 0 {
            error!("BlockFileSystem: no blocks reserved for storage");
            return Err(Error::StorageMount);
        }
        let mut block = [0u8; BLOCK_SIZE];
        self.device.read_block(0, &mut block).map_err(|err| {
            error!("BlockFileSystem: mount read failed: {}", err);
            Error::StorageMount
        })?;
        self.mounted = true;
        Ok(())
    }

    fn unmount(&mut self) -> Result<()> {
        self.ensure_mounted()?;
        self.mounted = false;
        Ok(())
    }

    fn read_file(&mut self, path: &str, buffer: &mut [u8]) -> Result<usize> {
        self.ensure_mounted()?;
        let mut block = [0u8; BLOCK_SIZE];
        let record = self.find(path, &mut block)?.ok_or(Error::FileNotFound)?;
        let contents = record.contents.as_slice();
        let target = buffer
            .get_mut(..contents.len())
            .ok_or(Error::FileTooLarge)?;
        target.copy_from_slice(contents);
        debug!("BlockFileSystem: read {} bytes", contents.len());
        Ok(contents.len())
    }

    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<usize> {
        self.ensure_mounted()?;
        let record = FileRecord::new(path, contents)?;
        let mut block = [0u8; BLOCK_SIZE];
        let index = match self.slot_for(path, &mut block)? {
            Some(Slot::Match(index) | Slot::Free(index)) => index,
            None => return Err(Error::StorageFull),
        };
        encode_block(&record, &mut block)?;
        self.device.write_block(index, &block)?;
        info!(
            "BlockFileSystem: wrote {} bytes to block {}",
            contents.len(),
            index
        );
        Ok(contents.len())
    }
}

// ============================================================================
// RAM-backed blocks for host testing
// ============================================================================

/// Blocks held in memory. Reads and writes can be made to fail.
#[cfg(any(test, feature = "host"))]
pub struct RamBlocks<const N: usize> {
    blocks: [[u8; BLOCK_SIZE]; N],
    pub fail_reads: bool,
    pub fail_writes: bool,
}

#[cfg(any(test, feature = "host"))]
impl<const N: usize> Default for RamBlocks<N> {
    fn default() -> Self {
        Self {
            blocks: [[0xFF; BLOCK_SIZE]; N],
            fail_reads: false,
            fail_writes: false,
        }
    }
}

#[cfg(any(test, feature = "host"))]
impl<const N: usize> RamBlocks<N> {
    /// Raw bytes of a block, for inspection or tampering.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut [u8; BLOCK_SIZE]> {
        self.blocks.get_mut(index)
    }
}

#[cfg(any(test, feature = "host"))]
impl<const N: usize> BlockDevice for RamBlocks<N> {
    #[expect(clippy::cast_possible_truncation, reason = "block counts are small")]
    fn block_count(&self) -> u32 {
        N as u32
    }

    fn read_block(&mut self, index: u32, buffer: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        if self.fail_reads {
            return Err(Error::StorageCorrupted);
        }
        let block = self
            .blocks
            .get(index as usize)
            .ok_or(Error::StorageCorrupted)?;
        buffer.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&mut self, index: u32, buffer: &[u8; BLOCK_SIZE]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::StorageCorrupted);
        }
        let block = self
            .blocks
            .get_mut(index as usize)
            .ok_or(Error::StorageCorrupted)?;
        block.copy_from_slice(buffer);
        Ok(())
    }
}
