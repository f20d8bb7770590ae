//! Definitions persistence
//!
//! Loads training definitions from flash storage.
//! Falls back to the embedded defaults if flash is empty or invalid.

use core::str;
use defmt::*;

use tensio_core::config::{parse_definitions, ParseError, TrainingConfig};
use tensio_hal::{FlashError, FlashStorage, StorageKey};

/// Maximum TOML definitions size
const MAX_TOML_SIZE: usize = 8192;

/// Definitions loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing or validation failed
    Parse(ParseError),
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::Parse(e)
    }
}

/// Loads training definitions from flash
pub struct DefinitionsLoader<F> {
    storage: F,
}

impl<F: FlashStorage> DefinitionsLoader<F> {
    /// Create a loader over `storage`
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// Consume the loader and return the underlying storage
    ///
    /// The record store takes the storage over once loading is done.
    pub fn into_storage(self) -> F {
        self.storage
    }

    /// Load definitions stored in flash
    pub async fn load(&mut self) -> Result<TrainingConfig, ConfigError> {
        info!("Loading training definitions from flash...");

        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::DefinitionsToml, &mut buffer)
            .await?;
        debug!("Read {} bytes of TOML from flash", len);

        let text = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
        let definitions = parse_definitions(text)?;
        log_summary(&definitions);
        Ok(definitions)
    }

    /// Load from flash, or parse `embedded` when flash holds nothing usable
    ///
    /// A broken embedded file yields an empty definition set with default
    /// run settings.
    pub async fn load_or(&mut self, embedded: &str) -> TrainingConfig {
        match self.load().await {
            Ok(definitions) => return definitions,
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No definitions in flash, using embedded defaults");
            }
            Err(e) => {
                warn!("Stored definitions unusable: {:?}, using embedded defaults", e);
            }
        }

        match parse_definitions(embedded) {
            Ok(definitions) => {
                log_summary(&definitions);
                definitions
            }
            Err(e) => {
                // build.rs validates the file, so this is a parser mismatch
                error!("Failed to parse embedded definitions: {:?}", e);
                TrainingConfig::new()
            }
        }
    }
}

/// Log a summary of the loaded definitions
fn log_summary(definitions: &TrainingConfig) {
    info!("Training definitions loaded");
    debug!("  {} timers", definitions.timers.len());
    debug!("  {} workouts", definitions.workouts.len());
    debug!(
        "  pre-roll {}, warning at {} s, sampling every {} ms",
        definitions.run.pre_roll, definitions.run.warning_s, definitions.run.sample_period_ms
    );
}
