//! Config persistence through a [`ConfigStore`].

use wedge_proto::{
    decode, encode_to_vec, frame_record, unframe_record, DecodeError, ProtocolConfig,
    RecordError, MAX_RECORD_LEN,
};

/// Error type for config persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing has been saved yet.
    NotFound,
    /// Storage read, erase or program failed.
    Io,
    /// Stored bytes fail the magic, length or CRC check.
    Corrupt,
    /// Record does not fit the storage slot.
    BufferTooSmall,
    /// Record framing is intact but its content is invalid.
    Decode(DecodeError),
}

impl From<RecordError> for StoreError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound => StoreError::NotFound,
            RecordError::Corrupt => StoreError::Corrupt,
            RecordError::BufferTooSmall => StoreError::BufferTooSmall,
        }
    }
}

impl From<DecodeError> for StoreError {
    fn from(err: DecodeError) -> Self {
        StoreError::Decode(err)
    }
}

/// Raw storage slot for one framed config record.
pub trait ConfigStore {
    /// Read the slot into `buf`, returning the number of bytes read.
    fn load(&mut self, buf: &mut [u8]) -> Result<usize, StoreError>;

    /// Replace the slot content with `record`.
    fn save(&mut self, record: &[u8]) -> Result<(), StoreError>;
}

/// Read and validate the stored config.
pub fn try_load_config<S: ConfigStore>(store: &mut S) -> Result<ProtocolConfig, StoreError> {
    let mut buf = [0u8; MAX_RECORD_LEN];
    let n = store.load(&mut buf)?;
    let payload = unframe_record(&buf[..n])?;
    Ok(decode(payload)?)
}

/// Load the stored config, or `fallback` if none is usable.
///
/// An empty store is provisioned with `fallback` so later loads read it
/// back. A rejected record is left in place.
pub fn load_config<S: ConfigStore>(store: &mut S, fallback: ProtocolConfig) -> ProtocolConfig {
    match try_load_config(store) {
        Ok(config) => {
            info!("config loaded");
            config
        }
        Err(StoreError::NotFound) => {
            info!("no stored config, writing defaults");
            if let Err(e) = save_config(store, &fallback) {
                warn!("saving defaults failed: {:?}", e);
            }
            fallback
        }
        Err(e) => {
            warn!("stored config rejected: {:?}", e);
            fallback
        }
    }
}

/// Encode, frame and write `config`.
pub fn save_config<S: ConfigStore>(store: &mut S, config: &ProtocolConfig) -> Result<(), StoreError> {
    let payload = encode_to_vec(config);
    let mut buf = [0u8; MAX_RECORD_LEN];
    let n = frame_record(&payload, &mut buf)?;
    store.save(&buf[..n])?;
    info!("config saved ({} bytes)", n);
    Ok(())
}
