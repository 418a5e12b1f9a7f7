//! Pesan yang dipakai worker demo

use crate::core::Transferable;

/// Operasi yang dikirim thread B ke counter di thread A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Add,
    Sub,
}

/// Perintah ubah counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpMessage {
    pub op: Op,
    pub value: i64,
}

impl OpMessage {
    /// Perintah yang dikirim B pada iterasi `i`:
    /// `x` genap -> `Sub x`, `x` ganjil -> `Add 2x`, dengan `x = i % 10`
    #[inline]
    pub fn for_iteration(i: u64) -> Self {
        let x = (i % 10) as i64;
        if x % 2 == 0 {
            Self { op: Op::Sub, value: x }
        } else {
            Self { op: Op::Add, value: 2 * x }
        }
    }
}

impl Transferable for OpMessage {
    #[inline(always)]
    fn transfer_to(&self, dest: &mut Self) {
        dest.op = self.op;
        dest.value = self.value;
    }
}

/// Acknowledgment tanpa isi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AckMessage;

impl Transferable for AckMessage {
    #[inline(always)]
    fn transfer_to(&self, _dest: &mut Self) {}
}
