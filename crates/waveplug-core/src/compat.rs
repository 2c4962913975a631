//! Shared re-exports so the other crates agree on one lock and one atomic set.

pub use parking_lot::{Mutex, MutexGuard};

pub use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
    Arc, Weak,
};
