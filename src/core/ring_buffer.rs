//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer
//!
//! Implementasi menggunakan Lamport Queue dengan memory ordering yang tepat.
//! Kapasitas ditentukan saat runtime (bukan const generic) karena kapasitas
//! pipe baru diketahui saat konstruksi. Tidak ada Mutex, tidak ada alokasi
//! setelah inisialisasi.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Batas atas kapasitas supaya selisih head/tail tidak pernah ambigu
pub const MAX_CAPACITY: usize = 1 << (usize::BITS - 2);

/// Slot dalam ring buffer - menyimpan data dengan ukuran tetap
struct Slot<T> {
    data: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Lock-Free SPSC Ring Buffer
///
/// Head dan tail berada di cache line terpisah
/// untuk menghindari false sharing antara producer dan consumer.
pub struct RingBuffer<T> {
    // Producer side - hanya ditulis oleh producer
    head: CachePadded<AtomicUsize>,
    // Consumer side - hanya ditulis oleh consumer
    tail: CachePadded<AtomicUsize>,
    // Pre-allocated buffer di heap, panjangnya power of 2
    buffer: Box<[Slot<T>]>,
    // Mask untuk operasi modulo yang cepat
    mask: usize,
    // Kapasitas yang diminta (<= buffer.len())
    capacity: usize,
}

// SAFETY: RingBuffer aman untuk Send/Sync karena:
// - Hanya satu producer (menulis head)
// - Hanya satu consumer (menulis tail)
// - Atomic operations menjamin visibility
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T: Copy> RingBuffer<T> {
    /// Membuat ring buffer baru dengan kapasitas `capacity`.
    ///
    /// Buffer internal dibulatkan ke power of 2 berikutnya, tapi
    /// `push` menolak data begitu `capacity` elemen tersimpan.
    ///
    /// # Panics
    /// Panic jika `capacity == 0` atau `capacity > MAX_CAPACITY`
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity <= MAX_CAPACITY,
            "capacity must be in 1..={}",
            MAX_CAPACITY
        );

        let len = capacity.next_power_of_two();
        let mut buffer = Vec::with_capacity(len);
        for _ in 0..len {
            buffer.push(Slot::new());
        }

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            buffer: buffer.into_boxed_slice(),
            mask: len - 1,
            capacity,
        }
    }

    /// Push data ke buffer (Producer side)
    ///
    /// Returns `true` jika berhasil, `false` jika buffer penuh.
    /// Zero-allocation, lock-free.
    #[inline(always)]
    pub fn push(&self, value: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= self.capacity {
            return false;
        }

        let slot = &self.buffer[head & self.mask];

        // SAFETY: slot ini belum dipublikasikan ke consumer
        unsafe {
            (*slot.data.get()).write(value);
        }

        // Release: write di atas visible sebelum head di-update
        self.head.store(head.wrapping_add(1), Ordering::Release);

        true
    }

    /// Pop data dari buffer (Consumer side)
    ///
    /// Returns `Some(T)` jika ada data, `None` jika buffer kosong.
    #[inline(always)]
    pub fn pop(&self) -> Option<T> {
        self.pop_with(|value| value)
    }

    /// Pop data lalu jalankan `f` sebelum tail di-update (Consumer side)
    ///
    /// Elemen baru benar-benar keluar setelah `f` selesai. Jika `f` panic,
    /// tail tidak bergerak dan elemen tetap di buffer.
    #[inline(always)]
    pub fn pop_with<R>(&self, f: impl FnOnce(T) -> R) -> Option<R> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let slot = &self.buffer[tail & self.mask];

        // SAFETY: slot sudah ditulis producer dan tidak sedang ditulis
        let value = unsafe { (*slot.data.get()).assume_init_read() };
        let result = f(value);

        // Release: read di atas selesai sebelum tail di-update
        self.tail.store(tail.wrapping_add(1), Ordering::Release);

        Some(result)
    }

    /// Cek apakah buffer kosong
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail == head
    }

    /// Cek apakah buffer penuh
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Jumlah elemen dalam buffer, selalu dalam `0..=capacity`
    #[inline(always)]
    pub fn len(&self) -> usize {
        // tail dulu: head tidak pernah tertinggal dari tail yang sudah dibaca
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(self.capacity)
    }

    /// Kapasitas buffer
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_push_pop() {
        let rb: RingBuffer<u64> = RingBuffer::new(16);

        assert!(rb.is_empty());
        assert!(!rb.is_full());

        assert!(rb.push(42));
        assert!(!rb.is_empty());

        assert_eq!(rb.pop(), Some(42));
        assert!(rb.is_empty());
    }

    #[test]
    fn test_full_buffer() {
        let rb: RingBuffer<u64> = RingBuffer::new(4);

        assert!(rb.push(1));
        assert!(rb.push(2));
        assert!(rb.push(3));
        assert!(rb.push(4));

        assert!(rb.is_full());
        assert!(!rb.push(5)); // Should fail - buffer full

        assert_eq!(rb.pop(), Some(1));
        assert!(rb.push(5)); // Now should succeed
    }

    #[test]
    fn test_non_power_of_two_capacity() {
        let rb: RingBuffer<usize> = RingBuffer::new(3);

        assert_eq!(rb.capacity(), 3);
        assert!(rb.push(0));
        assert!(rb.push(1));
        assert!(rb.push(2));
        assert!(!rb.push(3)); // Buffer internal 4, tapi kapasitas tetap 3
        assert_eq!(rb.len(), 3);
    }

    #[test]
    fn test_wraparound() {
        let rb: RingBuffer<u64> = RingBuffer::new(3);

        // Fill and drain multiple times to test wraparound
        for round in 0..10 {
            for i in 0..3 {
                assert!(rb.push(round * 3 + i));
            }
            for i in 0..3 {
                assert_eq!(rb.pop(), Some(round * 3 + i));
            }
        }
        assert!(rb.is_empty());
    }

    #[test]
    fn test_pop_with_panic_keeps_element() {
        let rb: RingBuffer<u64> = RingBuffer::new(2);
        assert!(rb.push(9));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            rb.pop_with(|_| panic!("boom"));
        }));
        assert!(result.is_err());

        assert_eq!(rb.len(), 1);
        assert_eq!(rb.pop_with(|v| v * 2), Some(18));
        assert!(rb.is_empty());
    }

    #[test]
    fn test_len_bounded_under_concurrent_push_pop() {
        const ITEMS: u64 = 100_000;
        let rb: RingBuffer<u64> = RingBuffer::new(1);
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..ITEMS {
                    while !rb.push(i) {
                        std::thread::yield_now();
                    }
                }
            });
            s.spawn(|| {
                for i in 0..ITEMS {
                    loop {
                        if let Some(v) = rb.pop() {
                            assert_eq!(v, i);
                            break;
                        }
                        std::thread::yield_now();
                    }
                }
                done.store(true, Ordering::Release);
            });

            while !done.load(Ordering::Acquire) {
                let len = rb.len();
                assert!(len <= rb.capacity(), "len {} > capacity", len);
            }
        });

        assert!(rb.is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be in")]
    fn test_zero_capacity_panics() {
        let _rb: RingBuffer<u64> = RingBuffer::new(0);
    }
}
