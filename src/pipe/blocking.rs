//! Blocking pipe: busy-spin sampai ada slot bebas / pesan masuk

use std::error::Error;
use std::fmt;

use tracing::debug;

use super::{Pipe, SlotPool};
use crate::config::PipeConfig;
use crate::core::{Transferable, WaitStrategy};
use crate::error::PipeError;

/// Pipe yang menunggu dengan spin.
///
/// `dispatch` berputar sampai slot bebas tersedia dan `receive` berputar
/// sampai ada pesan. Keduanya selalu `true`. Tidak ada timeout dan tidak
/// ada cancellation: tanpa counterpart yang hidup, thread berputar selamanya.
///
/// Dirancang untuk tepat satu dispatcher dan satu receiver.
pub struct BlockingPipe<T> {
    slots: SlotPool<T>,
    wait: WaitStrategy,
}

impl<T: Transferable + Default> BlockingPipe<T> {
    /// Pipe dengan `capacity` slot berisi `T::default()`
    pub fn new(capacity: usize) -> Result<Self, PipeError> {
        Self::with_factory(capacity, T::default)
    }
}

impl<T: Transferable> BlockingPipe<T> {
    pub fn with_factory(capacity: usize, factory: impl FnMut() -> T) -> Result<Self, PipeError> {
        Self::from_config(&PipeConfig::default().with_capacity(capacity), factory)
    }

    /// Factory yang bisa gagal; satu kegagalan membatalkan seluruh pipe
    pub fn try_with_factory<E>(
        capacity: usize,
        factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::try_from_config(&PipeConfig::default().with_capacity(capacity), factory)
    }

    pub fn from_config(config: &PipeConfig, factory: impl FnMut() -> T) -> Result<Self, PipeError> {
        let slots = SlotPool::new(config.capacity, factory)?;
        Ok(Self::assemble(slots, config.wait))
    }

    pub fn try_from_config<E>(
        config: &PipeConfig,
        factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let slots = SlotPool::try_new(config.capacity, factory)?;
        Ok(Self::assemble(slots, config.wait))
    }

    fn assemble(slots: SlotPool<T>, wait: WaitStrategy) -> Self {
        debug!(capacity = slots.capacity(), wait = %wait, "blocking pipe created");
        Self { slots, wait }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Jumlah slot bebas saat ini
    #[inline]
    pub fn free(&self) -> usize {
        self.slots.free()
    }

    /// Jumlah pesan yang menunggu diterima
    #[inline]
    pub fn queued(&self) -> usize {
        self.slots.queued()
    }

    #[inline]
    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }
}

impl<T: Transferable> Pipe<T> for BlockingPipe<T> {
    #[inline]
    fn dispatch(&self, message: &T) -> bool {
        self.wait
            .spin_until(|| self.slots.try_dispatch(message).then_some(()));
        true
    }

    #[inline]
    fn receive(&self, message: &mut T) -> bool {
        self.wait
            .spin_until(|| self.slots.try_receive(message).then_some(()));
        true
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<T> fmt::Debug for BlockingPipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingPipe")
            .field("capacity", &self.slots.capacity())
            .field("free", &self.slots.free())
            .field("queued", &self.slots.queued())
            .field("wait", &self.wait)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_dispatch_receive_in_order() {
        let pipe: BlockingPipe<u64> = BlockingPipe::new(4).unwrap();

        for i in 1..=4 {
            assert!(pipe.dispatch(&i));
        }
        assert_eq!(pipe.free(), 0);

        let mut out = 0;
        for i in 1..=4 {
            assert!(pipe.receive(&mut out));
            assert_eq!(out, i);
        }
        assert_eq!(pipe.free(), 4);
    }

    #[test]
    fn test_config_wait_strategy_is_used() {
        let config = PipeConfig::default()
            .with_capacity(2)
            .with_wait(WaitStrategy::Backoff);
        let pipe = BlockingPipe::from_config(&config, || 0u32).unwrap();

        assert_eq!(pipe.capacity(), 2);
        assert_eq!(pipe.wait_strategy(), WaitStrategy::Backoff);
    }

    #[test]
    fn test_fallible_factory_keeps_config_wait_strategy() {
        let config = PipeConfig::default()
            .with_capacity(3)
            .with_wait(WaitStrategy::Backoff);

        let pipe = BlockingPipe::try_from_config(&config, || Ok::<u32, &str>(0)).unwrap();
        assert_eq!(pipe.capacity(), 3);
        assert_eq!(pipe.wait_strategy(), WaitStrategy::Backoff);

        let mut built = 0;
        let result = BlockingPipe::<u32>::try_from_config(&config, || {
            built += 1;
            if built == 2 {
                Err("slot 1 unavailable")
            } else {
                Ok(0)
            }
        });
        assert!(matches!(result, Err(PipeError::Factory { index: 1, .. })));

        let pipe = BlockingPipe::try_with_factory(2, || Ok::<u32, &str>(0)).unwrap();
        assert_eq!(pipe.wait_strategy(), WaitStrategy::default());
    }

    #[test]
    fn test_receive_spins_until_dispatch() {
        let pipe: Arc<BlockingPipe<u64>> = Arc::new(BlockingPipe::new(1).unwrap());

        let consumer = {
            let pipe = Arc::clone(&pipe);
            thread::spawn(move || {
                let mut out = 0;
                assert!(pipe.receive(&mut out));
                out
            })
        };

        assert!(pipe.dispatch(&77));
        assert_eq!(consumer.join().unwrap(), 77);
        assert_eq!(pipe.free(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            BlockingPipe::<u8>::new(0),
            Err(PipeError::ZeroCapacity)
        ));
    }
}
