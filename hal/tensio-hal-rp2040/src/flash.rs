//! Flash storage driver for RP2040
//!
//! The last 128KB of the Pico's flash hold a sequential-storage map with
//! the training definitions and the saved workout records. Every map
//! operation goes through one scratch buffer owned by the driver, sized
//! for the largest item plus the map's item header.
//!
//! Implements the `FlashStorage` trait from `tensio-hal`.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::{map, Error as MapError};

pub use tensio_hal::flash::{FlashError, StorageKey};

/// Total flash on the Pico
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Partition for definitions and records, at the end of flash
pub const STORAGE_SIZE: usize = 128 * 1024;

/// Largest stored item (a definitions file)
pub const MAX_ITEM_SIZE: usize = 8192;

/// Map item header and key overhead
const ITEM_OVERHEAD: usize = 16;

/// Flash range handed to the map
pub const STORAGE_RANGE: Range<u32> = ((FLASH_SIZE - STORAGE_SIZE) as u32)..(FLASH_SIZE as u32);

/// RP2040 flash behind the `FlashStorage` trait
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    scratch: [u8; MAX_ITEM_SIZE + ITEM_OVERHEAD],
}

impl<'d> Rp2040FlashStorage<'d> {
    /// Take the flash peripheral; `dma` serves the async reads
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            scratch: [0; MAX_ITEM_SIZE + ITEM_OVERHEAD],
        }
    }

    /// Look `key` up, returning the stored bytes inside the scratch buffer
    async fn fetch(&mut self, key: StorageKey) -> Result<Option<&[u8]>, FlashError> {
        map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
        )
        .await
        .map_err(map_error)
    }
}

impl<'d> tensio_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.fetch(key).await?.ok_or(FlashError::NotFound)?;
        let target = buffer
            .get_mut(..data.len())
            .ok_or(FlashError::BufferTooSmall)?;
        target.copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > MAX_ITEM_SIZE {
            return Err(FlashError::Full);
        }
        map::store_item(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
            &data,
        )
        .await
        .map_err(map_error)
    }
}

/// Fold map errors into the shared flash error
fn map_error<S>(e: MapError<S>) -> FlashError {
    match e {
        MapError::Storage { .. } => FlashError::Flash,
        MapError::FullStorage => FlashError::Full,
        MapError::Corrupted { .. } => FlashError::Corrupted,
        MapError::BufferTooSmall(_) => FlashError::BufferTooSmall,
        _ => FlashError::Storage,
    }
}
