//! Pipe Layer: kanal fixed-capacity antara dua thread
//!
//! Prinsip desain:
//! - Pre-allocated slots: pesan disalin ke/dari slot milik pipe
//! - Zero allocation per pesan
//! - FIFO untuk satu dispatcher dan satu receiver
//!
//! Dua varian dengan kontrak yang sama:
//! - [`BlockingPipe`]: busy-spin sampai slot/pesan tersedia
//! - [`NonBlockingPipe`]: langsung `false` jika penuh/kosong
//!
//! Varian dipilih saat konstruksi, tidak bisa diganti saat runtime.

mod blocking;
mod non_blocking;
mod slots;

pub use blocking::BlockingPipe;
pub use non_blocking::NonBlockingPipe;
pub use slots::SlotPool;

use crate::core::Transferable;

/// Kontrak pipe: kirim dan terima pesan dengan menyalin isinya.
///
/// Pipe tidak pernah menyimpan referensi ke pesan milik caller.
///
/// Asumsi operasi: satu thread memanggil `dispatch` dan satu thread
/// memanggil `receive`. Dispatcher kedua (atau receiver kedua) yang masuk
/// bersamaan tidak merusak pipe: varian blocking membuatnya menunggu
/// giliran, varian non-blocking menjawab `false`. Urutan antar-producer
/// tidak dijamin.
pub trait Pipe<T: Transferable> {
    /// Kirim salinan `message`.
    ///
    /// Returns `false` hanya pada varian non-blocking, artinya tidak ada slot bebas.
    fn dispatch(&self, message: &T) -> bool;

    /// Salin pesan tertua ke `message`.
    ///
    /// Returns `false` hanya pada varian non-blocking, artinya belum ada pesan.
    fn receive(&self, message: &mut T) -> bool;

    /// Jumlah slot yang dimiliki pipe
    fn capacity(&self) -> usize;
}

impl<T: Transferable, P: Pipe<T> + ?Sized> Pipe<T> for std::sync::Arc<P> {
    #[inline(always)]
    fn dispatch(&self, message: &T) -> bool {
        (**self).dispatch(message)
    }

    #[inline(always)]
    fn receive(&self, message: &mut T) -> bool {
        (**self).receive(message)
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}
