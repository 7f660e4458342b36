//! Backing stores.
//!
//! A store implements both [`StructureBuilder`](crate::capability::StructureBuilder)
//! and [`ContentStore`](crate::capability::ContentStore) for one tree and
//! registers itself on the root it hands out.
//!
//! On-disk layout of a [`FileStore`]:
//! ```text
//! <base>/
//!   com/example/foo/1.0.0/
//!     com.example.foo-1.0.0.car
//!     com.example.foo-1.0.0.car.blake3
//!     module.properties
//!   default/
//!     default.car
//! ```

mod file;
mod memory;

pub use file::{checksum_path, verify_checksum, FileStore};
pub use memory::MemoryStore;
