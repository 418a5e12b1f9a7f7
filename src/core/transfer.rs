//! Transfer capability: copy field-by-field ke instance lain dengan shape sama
//!
//! Pipe tidak tahu layout pesan. Yang dibutuhkan hanya satu operasi:
//! salin semua field `self` ke `dest` tanpa alokasi.

/// Pesan yang bisa disalin ke instance lain dari tipe yang sama.
///
/// `transfer_to` wajib menimpa setiap field yang relevan di `dest` dan
/// tidak boleh mengubah `self`. Salinan parsial adalah bug di sisi caller;
/// pipe tidak memvalidasinya.
///
/// ```
/// use piping::Transferable;
///
/// #[derive(Default)]
/// struct Quote {
///     bid: i64,
///     ask: i64,
/// }
///
/// impl Transferable for Quote {
///     fn transfer_to(&self, dest: &mut Self) {
///         dest.bid = self.bid;
///         dest.ask = self.ask;
///     }
/// }
///
/// let src = Quote { bid: 10, ask: 11 };
/// let mut dst = Quote::default();
/// src.transfer_to(&mut dst);
/// assert_eq!((dst.bid, dst.ask), (10, 11));
/// ```
pub trait Transferable {
    fn transfer_to(&self, dest: &mut Self);
}

macro_rules! impl_transferable_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Transferable for $t {
                #[inline(always)]
                fn transfer_to(&self, dest: &mut Self) {
                    *dest = *self;
                }
            }
        )*
    };
}

impl_transferable_scalar!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char,
);

impl<T: Transferable, const N: usize> Transferable for [T; N] {
    #[inline]
    fn transfer_to(&self, dest: &mut Self) {
        for (src, dst) in self.iter().zip(dest.iter_mut()) {
            src.transfer_to(dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_transfer() {
        let src = 7i64;
        let mut dst = 0i64;
        src.transfer_to(&mut dst);
        assert_eq!(dst, 7);
        assert_eq!(src, 7);
    }

    #[test]
    fn test_array_transfer() {
        let src = [1u8, 2, 3, 4];
        let mut dst = [0u8; 4];
        src.transfer_to(&mut dst);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_nested_array_transfer() {
        let src = [[1.5f64, 2.5], [3.5, 4.5]];
        let mut dst = [[0.0f64; 2]; 2];
        src.transfer_to(&mut dst);
        assert_eq!(dst, src);
    }
}
