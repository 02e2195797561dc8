//! LedgerChain - A deterministic in-memory token ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Block chain engine, token/wallet registry and append-time validation
//! - [`transaction`] - Transaction types, canonical serialization and validation
//!
//! ## Energy
//! - [`energy`] - Transaction energy from serialized size and hash
//! - [`economics`] - Bound/reward split of energy for native tokens
//! - [`units`] - SI and binary byte-size reference tables
//!
//! ## Audit & Access
//! - [`audit`] - Independent full-state validator
//! - [`query`] - Read-only query trait
//! - [`shared`] - Reader/writer handle for concurrent callers
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 hashing and address checks
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Energy
// ============================================================================
pub mod economics;
pub mod energy;
pub mod units;

// ============================================================================
// Audit & Access
// ============================================================================
pub mod audit;
pub mod query;
pub mod shared;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
