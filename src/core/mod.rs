//! # Core Module
//!
//! This module provides the concurrency primitives used throughout the engine.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `OwnedWorker`: A thread that exclusively owns a value and runs closures against it in order
//!
//! ## Usage
//! ```rust
//! use voxel_octree_engine::core::{MtResource, OwnedWorker};
//!
//! // Thread-safe resource
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! // Single-owner worker
//! let worker = OwnedWorker::spawn("counter", 0u32).unwrap();
//! worker.submit(|count| *count += 2).unwrap();
//! assert_eq!(worker.call(|count| *count).unwrap(), 2);
//! ```

pub mod mt_resource;
pub mod owned_worker;

// Re-export types for easier access
pub use mt_resource::MtResource;
pub use owned_worker::OwnedWorker;
