//! Config record storage in the last flash sector.

use embassy_rp::flash::{Blocking, Error as FlashError, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use wedge_core::{ConfigStore, StoreError};
use wedge_proto::MAX_RECORD_LEN;

/// Flash size of the Raspberry Pi Pico.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Offset of the config sector, excluded from the program region in `memory.x`.
pub const CONFIG_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// Bytes read and programmed per access; the rest of the sector stays erased.
const SLOT_LEN: usize = 512;

const _: () = assert!(MAX_RECORD_LEN <= SLOT_LEN && SLOT_LEN <= ERASE_SIZE);

fn flash_error(e: FlashError) -> StoreError {
    defmt::warn!("flash access failed: {:?}", e);
    StoreError::Io
}

/// [`ConfigStore`] backed by on-chip flash.
pub struct FlashConfigStore<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> FlashConfigStore<'d> {
    #[must_use]
    pub fn new(flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>) -> Self {
        Self { flash }
    }
}

impl ConfigStore for FlashConfigStore<'_> {
    fn load(&mut self, buf: &mut [u8]) -> Result<usize, StoreError> {
        let n = buf.len().min(SLOT_LEN);
        self.flash
            .blocking_read(CONFIG_OFFSET, &mut buf[..n])
            .map_err(flash_error)?;
        Ok(n)
    }

    fn save(&mut self, record: &[u8]) -> Result<(), StoreError> {
        if record.len() > SLOT_LEN {
            return Err(StoreError::BufferTooSmall);
        }
        let mut slot = [0xFF; SLOT_LEN];
        slot[..record.len()].copy_from_slice(record);

        self.flash
            .blocking_erase(CONFIG_OFFSET, CONFIG_OFFSET + ERASE_SIZE as u32)
            .map_err(flash_error)?;
        self.flash
            .blocking_write(CONFIG_OFFSET, &slot)
            .map_err(flash_error)
    }
}
