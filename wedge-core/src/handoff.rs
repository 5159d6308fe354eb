//! Lock-protected exchange of the frame and config between tasks.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;
use wedge_proto::{ConfigError, ProtocolConfig};

use crate::frame::Frame;

/// Error type for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandoffError {
    /// The other side held the lock for the whole bounded wait.
    Busy,
}

/// Error type for [`FrameHandoff::reconfigure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconfigureError {
    Busy,
    /// The update was rejected; the previous config is kept.
    Config(ConfigError),
}

impl From<HandoffError> for ReconfigureError {
    fn from(err: HandoffError) -> Self {
        match err {
            HandoffError::Busy => ReconfigureError::Busy,
        }
    }
}

impl From<ConfigError> for ReconfigureError {
    fn from(err: ConfigError) -> Self {
        ReconfigureError::Config(err)
    }
}

/// State owned by whoever holds the handoff lock.
#[derive(Debug)]
pub struct Shared {
    pub frame: Frame,
    pub config: ProtocolConfig,
}

/// Guard returned by [`FrameHandoff::acquire`].
pub type SharedGuard<'a, M> = MutexGuard<'a, M, Shared>;

/// The single lock shared by the capture machine and the dispatcher.
///
/// It guards both the [`Frame`] and the [`ProtocolConfig`]: a capture
/// holds it from request to substitution, dispatch holds it while typing,
/// and reconfiguration takes it to swap the config. Every acquisition is
/// bounded; a side that cannot get the lock in time reports
/// [`HandoffError::Busy`] and retries on its next cycle.
///
/// The handoff is meant to be placed in a `StaticCell` and shared by
/// reference between tasks.
pub struct FrameHandoff<M: RawMutex> {
    inner: Mutex<M, Shared>,
}

impl<M: RawMutex> FrameHandoff<M> {
    /// Create a handoff with an empty frame.
    pub const fn new(config: ProtocolConfig) -> Self {
        Self {
            inner: Mutex::new(Shared {
                frame: Frame::new(),
                config,
            }),
        }
    }

    /// Wait at most `wait_ms` for the lock.
    pub async fn acquire<D: DelayNs>(
        &self,
        delay: &mut D,
        wait_ms: u32,
    ) -> Result<SharedGuard<'_, M>, HandoffError> {
        match select(self.inner.lock(), delay.delay_ms(wait_ms)).await {
            Either::First(guard) => Ok(guard),
            Either::Second(()) => Err(HandoffError::Busy),
        }
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(&self) -> Result<SharedGuard<'_, M>, HandoffError> {
        self.inner.try_lock().map_err(|_| HandoffError::Busy)
    }

    /// Copy of the current config, taken under the lock.
    pub async fn config<D: DelayNs>(
        &self,
        delay: &mut D,
        wait_ms: u32,
    ) -> Result<ProtocolConfig, HandoffError> {
        let shared = self.acquire(delay, wait_ms).await?;
        Ok(shared.config.clone())
    }

    /// Apply `update` to the config under the lock.
    ///
    /// The update runs on a copy; only if it succeeds is the copy stored
    /// and the frame emptied, so a rejected setter leaves both untouched.
    pub async fn reconfigure<D, F>(
        &self,
        delay: &mut D,
        wait_ms: u32,
        update: F,
    ) -> Result<(), ReconfigureError>
    where
        D: DelayNs,
        F: FnOnce(&mut ProtocolConfig) -> Result<(), ConfigError>,
    {
        let mut shared = self.acquire(delay, wait_ms).await?;
        let mut config = shared.config.clone();
        update(&mut config)?;
        shared.config = config;
        shared.frame.clear();
        info!("config updated");
        Ok(())
    }
}
