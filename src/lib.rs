/***********************************************************************************************************************
 * Copyright (c) 2019 by the authors
 *
 * Author: André Borrmann
 * License: Apache License 2.0
 **********************************************************************************************************************/
#![doc(html_root_url = "https://docs.rs/sama5-mmu/0.1.0")]
#![cfg_attr(not(test), no_std)]
//! # SAMA5 MMU
//!
//! This crate provides the flat (1:1) memory mapping and the L1 cache maintenance of single core ARMv7-A SoCs like the
//! Microchip SAMA5D2.
//!
//! The whole 4GB address space is described by a single level translation table of 1MB sections. Which sections are
//! mapped, and with which access and cache policy, is given by the region table of the board. Any section not covered
//! by it stays unmapped and accessing it raises a translation fault.
//!
//! # Usage
//!
//! ```ignore
//! use sama5_mmu::{board::sama5d2::MEMORY_MAP, Armv7a, Mmu, TranslationTable};
//!
//! static mut TTLB: TranslationTable = TranslationTable::new();
//!
//! fn boot() {
//!     // Safety: the boot path runs once, on the only core, before anything else touches the table
//!     let (cp15, table) = unsafe { (Armv7a::new(), &mut *core::ptr::addr_of_mut!(TTLB)) };
//!     let mut mmu = Mmu::new(cp15, table, MEMORY_MAP);
//!     mmu.initialize();
//!
//!     // hand a buffer to a DMA master and read back what it wrote
//!     mmu.clean_range(buffer.as_ptr() as usize, buffer.len());
//!     // ... start the transfer and wait for it to complete ...
//!     mmu.invalidate_range(buffer.as_ptr() as usize, buffer.len());
//! }
//! ```

pub mod board;
pub mod cache;
pub mod config;
pub mod cp15;
pub mod descriptor;
mod mmu;
pub mod region;
mod table;

#[cfg(test)]
mod testing;

pub use cache::{CacheMaintenance, CacheState};
#[cfg(target_arch = "arm")]
pub use cp15::Armv7a;
pub use cp15::{Cp15, LineOp};
pub use descriptor::{encode, AccessClass, CachePolicy, Execute, SectionAttributes, SectionDescriptor};
pub use mmu::Mmu;
pub use region::{Region, RegionError, RegionTable};
pub use table::TranslationTable;

/// Align a given address down to the start of the cache line it is part of
pub fn cache_line_align(addr: usize) -> usize {
    addr & !config::CACHE_LINE_MASK
}
