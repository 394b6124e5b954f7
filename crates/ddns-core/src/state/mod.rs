// # Record Store Implementations
//
// This module provides implementations of the RecordStore trait.

pub mod memory;

pub use memory::MemoryRecordStore;
