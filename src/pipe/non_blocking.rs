//! Non-blocking pipe: satu percobaan, gagal cepat

use std::error::Error;
use std::fmt;

use tracing::debug;

use super::{Pipe, SlotPool};
use crate::config::PipeConfig;
use crate::core::Transferable;
use crate::error::PipeError;

/// Pipe yang tidak pernah menunggu.
///
/// `dispatch` mengembalikan `false` jika tidak ada slot bebas dan
/// `receive` mengembalikan `false` jika belum ada pesan. Saat gagal,
/// pool, queue, dan pesan caller tidak berubah. Keputusan retry ada di caller.
///
/// Dirancang untuk tepat satu dispatcher dan satu receiver.
pub struct NonBlockingPipe<T> {
    slots: SlotPool<T>,
}

impl<T: Transferable + Default> NonBlockingPipe<T> {
    /// Pipe dengan `capacity` slot berisi `T::default()`
    pub fn new(capacity: usize) -> Result<Self, PipeError> {
        Self::with_factory(capacity, T::default)
    }
}

impl<T: Transferable> NonBlockingPipe<T> {
    pub fn with_factory(capacity: usize, factory: impl FnMut() -> T) -> Result<Self, PipeError> {
        Ok(Self::assemble(SlotPool::new(capacity, factory)?))
    }

    pub fn try_with_factory<E>(
        capacity: usize,
        factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Ok(Self::assemble(SlotPool::try_new(capacity, factory)?))
    }

    /// `config.wait` diabaikan: pipe ini tidak pernah menunggu
    pub fn from_config(config: &PipeConfig, factory: impl FnMut() -> T) -> Result<Self, PipeError> {
        Self::note_ignored_wait(config);
        Self::with_factory(config.capacity, factory)
    }

    pub fn try_from_config<E>(
        config: &PipeConfig,
        factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::note_ignored_wait(config);
        Self::try_with_factory(config.capacity, factory)
    }

    fn note_ignored_wait(config: &PipeConfig) {
        debug!(
            capacity = config.capacity,
            wait = %config.wait,
            "wait strategy ignored by non-blocking pipe"
        );
    }

    fn assemble(slots: SlotPool<T>) -> Self {
        debug!(capacity = slots.capacity(), "non-blocking pipe created");
        Self { slots }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.slots.free()
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.slots.queued()
    }
}

impl<T: Transferable> Pipe<T> for NonBlockingPipe<T> {
    #[inline]
    fn dispatch(&self, message: &T) -> bool {
        self.slots.try_dispatch(message)
    }

    #[inline]
    fn receive(&self, message: &mut T) -> bool {
        self.slots.try_receive(message)
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<T> fmt::Debug for NonBlockingPipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonBlockingPipe")
            .field("capacity", &self.slots.capacity())
            .field("free", &self.slots.free())
            .field("queued", &self.slots.queued())
            .finish()
    }
}
