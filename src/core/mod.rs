//! Core module: primitive di bawah pipe
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic operations, tidak ada Mutex/RwLock
//! - No-Allocation: Semua buffer pre-allocated saat init
//! - Busy-Spin: Menunggu tanpa pernah tidur di scheduler

mod ring_buffer;
mod transfer;
mod wait;

pub use ring_buffer::{RingBuffer, MAX_CAPACITY};
pub use transfer::Transferable;
pub use wait::WaitStrategy;
