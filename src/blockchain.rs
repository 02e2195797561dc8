// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// the chain engine, the registry state and append-time validation.

pub mod core;
pub use core::*;
