//! The file store's erase blocks at the end of internal flash.
//!
//! Block 0 is the last erase block of flash, block 1 the one before it. `memory.x` keeps the
//! program image clear of these blocks.

use embassy_rp::Peri;
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash};
use embassy_rp::peripherals::FLASH;

use crate::block_fs::BlockDevice;
use crate::file_record::BLOCK_SIZE;
use crate::{Error, Result};

/// Internal flash size for Raspberry Pi Pico 2 W (4 MB).
#[cfg(feature = "pico2")]
pub const INTERNAL_FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Internal flash size for Raspberry Pi Pico 1 W (2 MB).
#[cfg(not(feature = "pico2"))]
pub const INTERNAL_FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Erase blocks reserved for the file store.
pub const FILE_SLOT_COUNT: u32 = 2;

const _: () = assert!(BLOCK_SIZE == ERASE_SIZE);

/// [`BlockDevice`] over the reserved blocks of internal flash.
pub struct FlashBlocks {
    flash: Flash<'static, FLASH, Blocking, INTERNAL_FLASH_SIZE>,
}

impl FlashBlocks {
    #[must_use]
    pub fn new(peripheral: Peri<'static, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(peripheral),
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "flash sizes fit in u32")]
#[expect(
    clippy::arithmetic_side_effects,
    reason = "callers check index < FILE_SLOT_COUNT, so the offset stays inside flash"
)]
const fn block_offset(index: u32) -> u32 {
    INTERNAL_FLASH_SIZE as u32 - (index + 1) * ERASE_SIZE as u32
}

impl BlockDevice for FlashBlocks {
    fn block_count(&self) -> u32 {
        FILE_SLOT_COUNT
    }

    fn read_block(&mut self, index: u32, buffer: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        if index >= FILE_SLOT_COUNT {
            return Err(Error::StorageCorrupted);
        }
        self.flash
            .blocking_read(block_offset(index), buffer)
            .map_err(Error::Flash)
    }

    #[expect(clippy::cast_possible_truncation, reason = "ERASE_SIZE fits in u32")]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "a reserved block ends at or before the end of flash"
    )]
    fn write_block(&mut self, index: u32, buffer: &[u8; BLOCK_SIZE]) -> Result<()> {
        if index >= FILE_SLOT_COUNT {
            return Err(Error::StorageCorrupted);
        }
        let offset = block_offset(index);
        self.flash
            .blocking_erase(offset, offset + ERASE_SIZE as u32)
            .map_err(Error::Flash)?;
        self.flash
            .blocking_write(offset, buffer)
            .map_err(Error::Flash)?;
        debug!("Flash: wrote block {} at offset {}", index, offset);
        Ok(())
    }
}
