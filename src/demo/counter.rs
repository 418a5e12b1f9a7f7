//! Counter milik thread A

use std::fmt;

use super::message::{Op, OpMessage};

/// Counter yang hanya pernah diubah oleh pemiliknya (kecuali di baseline lock)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counter {
    pub counter: i64,
    pub operations: u64,
}

impl Counter {
    #[inline(always)]
    pub fn increment_by(&mut self, x: i64) {
        self.counter += x;
        self.operations += 1;
    }

    #[inline(always)]
    pub fn decrement_by(&mut self, x: i64) {
        self.counter -= x;
        self.operations += 1;
    }

    /// Kerja lokal A pada iterasi `i`: `x` genap -> `+2x`, ganjil -> `-x`
    #[inline(always)]
    pub fn local_step(&mut self, i: u64) {
        let x = (i % 10) as i64;
        if x % 2 == 0 {
            self.increment_by(2 * x);
        } else {
            self.decrement_by(x);
        }
    }

    #[inline(always)]
    pub fn apply(&mut self, message: &OpMessage) {
        match message.op {
            Op::Add => self.increment_by(message.value),
            Op::Sub => self.decrement_by(message.value),
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "counter={} after {} operations",
            self.counter, self.operations
        )
    }
}

/// Nilai akhir jika semua `iterations` pesan sampai ke A.
///
/// Tiap iterasi kerja lokal + pesan B bersih menambah `i % 10`.
pub fn expected_total(iterations: u64) -> Counter {
    let full_rounds = iterations / 10;
    let rest = iterations % 10;
    let counter = full_rounds * 45 + rest * (rest + 1) / 2;
    Counter {
        counter: counter as i64,
        operations: iterations * 2,
    }
}
