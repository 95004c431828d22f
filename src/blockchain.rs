// Thin re-export module: implementation is in `blockchain/core.rs` so block
// construction, chain management and integrity validation stay separate.

pub mod core;
pub use self::core::*;
