//! Piping - Allocation-Free Message Pipes
//!
//! Arsitektur:
//! - Pre-allocated slots: pesan disalin, tidak pernah dialokasi per kirim
//! - Lock-Free: Dua SPSC ring buffer (Pool dan Queue) berisi indeks slot
//! - Busy-Spin: Blocking pipe menunggu tanpa tidur di scheduler
//!
//! ```
//! use piping::{NonBlockingPipe, Pipe};
//!
//! let pipe: NonBlockingPipe<u64> = NonBlockingPipe::new(2).unwrap();
//! assert!(pipe.dispatch(&5));
//! assert!(pipe.dispatch(&7));
//! assert!(!pipe.dispatch(&9)); // penuh
//!
//! let mut out = 0;
//! assert!(pipe.receive(&mut out));
//! assert_eq!(out, 5);
//! ```

pub mod config;
pub mod core;
pub mod demo;
pub mod error;
pub mod pipe;

pub use crate::config::PipeConfig;
pub use crate::core::{Transferable, WaitStrategy};
pub use crate::error::PipeError;
pub use crate::pipe::{BlockingPipe, NonBlockingPipe, Pipe};
