//! Flash storage abstractions
//!
//! Keys and the storage trait the firmware persists definitions and
//! workout records through. Chip HALs implement [`FlashStorage`] on top of
//! their flash peripheral.

/// Number of workout record slots
pub const MAX_RECORD_SLOTS: u8 = 8;

/// First key byte used by record slots
const RECORD_KEY_BASE: u8 = 0x10;

/// What a stored item holds
///
/// Keys map to single bytes in flash: definitions and the record index
/// first, then one byte per record slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Training definitions as TOML text
    DefinitionsToml,
    /// Next record identifier (binary postcard format)
    RecordIndex,
    /// One saved workout record
    Record(u8),
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        match self {
            StorageKey::DefinitionsToml => 0,
            StorageKey::RecordIndex => 1,
            StorageKey::Record(slot) => RECORD_KEY_BASE + slot,
        }
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::DefinitionsToml),
            1 => Some(StorageKey::RecordIndex),
            v if (RECORD_KEY_BASE..RECORD_KEY_BASE + MAX_RECORD_SLOTS).contains(&v) => {
                Some(StorageKey::Record(v - RECORD_KEY_BASE))
            }
            _ => None,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The flash peripheral reported an error
    Flash,
    /// The key/value layer failed for another reason
    Storage,
    /// Nothing stored under the key
    NotFound,
    /// Stored item does not fit the caller's buffer
    BufferTooSmall,
    /// Stored data failed its integrity check
    Corrupted,
    /// No room left, or the item exceeds the largest storable size
    Full,
}

/// Key/value storage in on-chip flash
///
/// A write replaces any earlier value under the same key. Wear leveling
/// and item integrity are the implementation's job.
pub trait FlashStorage {
    /// Copy the value under `key` into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Store `data` under `key`
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
