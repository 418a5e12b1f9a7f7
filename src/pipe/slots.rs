//! Slot pool: slot pre-allocated + dua ring buffer indeks
//!
//! ```text
//!   dispatch:  pool ──idx──> [copy msg -> slots[idx]] ──idx──> queue
//!   receive:   queue ──idx──> [copy slots[idx] -> msg] ──idx──> pool
//! ```
//!
//! Yang berpindah hanya indeks slot, bukan pesannya. Total indeks di pool
//! dan queue selalu sama dengan `capacity`, jadi push ke salah satu ring
//! tidak pernah gagal.

use std::cell::UnsafeCell;
use std::convert::Infallible;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::CachePadded;
use tracing::{debug, error};

use crate::core::{RingBuffer, Transferable, MAX_CAPACITY};
use crate::error::PipeError;

/// Penanda bahwa satu sisi (dispatch atau receive) sedang dipakai.
///
/// Ring buffer di bawahnya SPSC. Flag ini memastikan dua dispatcher
/// (atau dua receiver) tidak pernah masuk bersamaan.
struct SideGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SideGuard<'a> {
    #[inline(always)]
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::Acquire) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for SideGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Kumpulan slot milik pipe beserta Pool dan Queue-nya
pub struct SlotPool<T> {
    slots: Box<[UnsafeCell<T>]>,
    // Indeks slot bebas
    pool: RingBuffer<usize>,
    // Indeks slot berisi pesan, urutan FIFO
    queue: RingBuffer<usize>,
    dispatching: CachePadded<AtomicBool>,
    receiving: CachePadded<AtomicBool>,
}

// SAFETY: setiap slot hanya diakses oleh thread yang memegang indeksnya.
// Serah terima indeks lewat ring buffer (Release/Acquire) membawa
// visibility isi slot ke thread berikutnya.
unsafe impl<T: Send> Send for SlotPool<T> {}
unsafe impl<T: Send> Sync for SlotPool<T> {}

impl<T: Transferable> SlotPool<T> {
    /// Membangun `capacity` slot dengan factory yang tidak bisa gagal
    pub fn new(capacity: usize, mut factory: impl FnMut() -> T) -> Result<Self, PipeError> {
        Self::try_new(capacity, || Ok::<T, Infallible>(factory()))
    }

    /// Membangun `capacity` slot dengan factory yang bisa gagal.
    ///
    /// All-or-nothing: kegagalan di slot mana pun membatalkan konstruksi.
    pub fn try_new<E>(
        capacity: usize,
        mut factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        if capacity == 0 {
            return Err(PipeError::ZeroCapacity);
        }
        if capacity > MAX_CAPACITY {
            return Err(PipeError::CapacityTooLarge {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }

        let mut slots = Vec::with_capacity(capacity);
        for index in 0..capacity {
            match factory() {
                Ok(message) => slots.push(UnsafeCell::new(message)),
                Err(e) => {
                    let source = e.into();
                    error!(index, capacity, error = %source, "message factory failed");
                    return Err(PipeError::Factory { index, source });
                }
            }
        }

        let pool = RingBuffer::new(capacity);
        for index in 0..capacity {
            pool.push(index);
        }

        debug!(capacity, "slot pool ready");

        Ok(Self {
            slots: slots.into_boxed_slice(),
            pool,
            queue: RingBuffer::new(capacity),
            dispatching: CachePadded::new(AtomicBool::new(false)),
            receiving: CachePadded::new(AtomicBool::new(false)),
        })
    }

    /// Satu percobaan dispatch. `false` jika tidak ada slot bebas;
    /// dalam kasus itu tidak ada yang berubah.
    #[inline]
    pub fn try_dispatch(&self, message: &T) -> bool {
        let Some(_guard) = SideGuard::try_acquire(&self.dispatching) else {
            return false;
        };

        let taken = self.pool.pop_with(|index| {
            // SAFETY: indeks baru keluar dari pool, hanya thread ini yang memegangnya
            message.transfer_to(unsafe { &mut *self.slots[index].get() });
            index
        });

        match taken {
            Some(index) => {
                let queued = self.queue.push(index);
                debug_assert!(queued, "queue overflow: slot accounting broken");
                true
            }
            None => false,
        }
    }

    /// Satu percobaan receive. `false` jika queue kosong;
    /// `message` tidak disentuh dalam kasus itu.
    #[inline]
    pub fn try_receive(&self, message: &mut T) -> bool {
        let Some(_guard) = SideGuard::try_acquire(&self.receiving) else {
            return false;
        };

        let taken = self.queue.pop_with(|index| {
            // SAFETY: dispatcher sudah selesai menulis slot ini sebelum publish indeksnya
            unsafe { &*self.slots[index].get() }.transfer_to(message);
            index
        });

        match taken {
            Some(index) => {
                let freed = self.pool.push(index);
                debug_assert!(freed, "pool overflow: slot accounting broken");
                true
            }
            None => false,
        }
    }
}

impl<T> SlotPool<T> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Jumlah slot di Pool
    #[inline]
    pub fn free(&self) -> usize {
        self.pool.len()
    }

    /// Jumlah slot di Queue
    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::panic::{self, AssertUnwindSafe};

    #[derive(Debug)]
    struct FactoryExhausted;

    impl fmt::Display for FactoryExhausted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("factory exhausted")
        }
    }

    impl Error for FactoryExhausted {}

    #[derive(Default)]
    struct Fragile(u32);

    impl Transferable for Fragile {
        fn transfer_to(&self, dest: &mut Self) {
            if self.0 == u32::MAX {
                panic!("refusing to copy");
            }
            dest.0 = self.0;
        }
    }

    #[test]
    fn test_all_slots_start_free() {
        let slots: SlotPool<u64> = SlotPool::new(5, || 0).unwrap();
        assert_eq!(slots.capacity(), 5);
        assert_eq!(slots.free(), 5);
        assert_eq!(slots.queued(), 0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SlotPool::<u64>::new(0, || 0).err().unwrap();
        assert!(matches!(err, PipeError::ZeroCapacity));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let err = SlotPool::<u8>::new(MAX_CAPACITY + 1, || 0).err().unwrap();
        assert!(matches!(err, PipeError::CapacityTooLarge { .. }));
    }

    #[test]
    fn test_factory_failure_is_all_or_nothing() {
        let mut built = 0;
        let result = SlotPool::<u64>::try_new(4, || {
            if built == 2 {
                return Err(FactoryExhausted);
            }
            built += 1;
            Ok(0)
        });

        match result {
            Err(PipeError::Factory { index, source }) => {
                assert_eq!(index, 2);
                assert_eq!(source.to_string(), "factory exhausted");
            }
            _ => panic!("expected factory error"),
        }
        assert_eq!(built, 2);
    }

    #[test]
    fn test_conservation_through_dispatch_receive() {
        let slots: SlotPool<u64> = SlotPool::new(3, || 0).unwrap();
        let mut out = 0;

        assert!(slots.try_dispatch(&1));
        assert!(slots.try_dispatch(&2));
        assert_eq!((slots.free(), slots.queued()), (1, 2));

        assert!(slots.try_receive(&mut out));
        assert_eq!(out, 1);
        assert_eq!((slots.free(), slots.queued()), (2, 1));
    }

    #[test]
    fn test_busy_side_reports_unavailable() {
        let slots: SlotPool<u64> = SlotPool::new(2, || 0).unwrap();

        let held = SideGuard::try_acquire(&slots.dispatching).unwrap();
        assert!(!slots.try_dispatch(&1));
        drop(held);

        assert!(slots.try_dispatch(&1));
        assert_eq!(slots.queued(), 1);
    }

    #[test]
    fn test_panicking_transfer_loses_no_slot() {
        let slots: SlotPool<Fragile> = SlotPool::new(2, Fragile::default).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            slots.try_dispatch(&Fragile(u32::MAX));
        }));
        assert!(result.is_err());
        assert_eq!((slots.free(), slots.queued()), (2, 0));

        // Guard dilepas saat unwind
        assert!(slots.try_dispatch(&Fragile(3)));
        let mut out = Fragile::default();
        assert!(slots.try_receive(&mut out));
        assert_eq!(out.0, 3);
    }
}
