//! System Components.
//!
//! This module organizes the storage the simulated program sees: segmented
//! main memory, its heap and label lookups, and the memory-mapped terminal.

/// Segmented memory and the MMIO terminal.
pub mod memory;

pub use memory::Memory;
