//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Expired sweep: removes expired entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
