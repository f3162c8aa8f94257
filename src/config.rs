/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # MMU Configuration Constants
//!
//! The translation uses the ARMv7-A short descriptor format with first level section entries only. Each entry of the
//! single level translation table covers 1MB of memory, so 4096 entries cover the whole 32Bit address space. The
//! L1 data cache geometry matches the Cortex-A5 as integrated into the SAMA5D2.

pub const SECTION_SIZE: usize = 0x10_0000; // 1MB section size
pub const SECTION_SHIFT: usize = 20;
/// Number of first level entries, one per section of the 4GB address space
pub const SECTION_COUNT: usize = 4096;
/// TTBR0 requires the first level table to be aligned to its size (with TTBCR.N = 0)
pub const TABLE_ALIGN: usize = 0x4000; // 16kB

pub const CACHE_LINE_SIZE: usize = 32;
pub const CACHE_LINE_MASK: usize = CACHE_LINE_SIZE - 1;
pub const CACHE_LINE_SHIFT: u32 = 5;
pub const DCACHE_SETS: u32 = 256;
pub const DCACHE_WAYS: u32 = 4;
/// bit position of the way number in a set/way operand, 32 - log2(DCACHE_WAYS)
pub const DCACHE_WAY_SHIFT: u32 = 30;

/// The only domain any section is assigned to. It is configured as manager, so the access permission bits of the
/// descriptors are not checked.
pub const FLAT_DOMAIN: u8 = 15;
