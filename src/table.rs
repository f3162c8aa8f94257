/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # Translation Table
//!
//! The single level translation table holding one section entry for each 1MB of the 32Bit address space. The table
//! is addressed with `physical address >> 20`. It is filled exactly once from a [RegionTable] while the MMU is still
//! off and is never changed after it has been handed to the MMU.

use crate::config::{SECTION_COUNT, SECTION_SHIFT, TABLE_ALIGN};
use crate::descriptor::{SectionAttributes, SectionDescriptor};
use crate::region::RegionTable;
use log::debug;
use static_assertions::{assert_eq_size, const_assert_eq};

#[repr(C, align(0x4000))]
pub struct TranslationTable {
    entries: [SectionDescriptor; SECTION_COUNT],
}

assert_eq_size!(TranslationTable, [u32; SECTION_COUNT]);
const_assert_eq!(core::mem::align_of::<TranslationTable>(), TABLE_ALIGN);

impl TranslationTable {
    /// A table where every section is unmapped
    pub const fn new() -> Self {
        Self {
            entries: [SectionDescriptor::FAULT; SECTION_COUNT],
        }
    }

    /// Reset every entry to the fault entry
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = SectionDescriptor::FAULT;
        }
    }

    /// Populate the table with the 1:1 mapping described by `regions`.
    ///
    /// The whole table is cleared first, so sections no region covers end up unmapped. Regions are applied in the
    /// order given, a later region overwrites any section an earlier one already mapped. Section indices past the end
    /// of the table are skipped.
    pub fn build_flat_map(&mut self, regions: RegionTable<'_>) {
        self.clear();

        for region in regions {
            debug!(
                "map {} sections {:#05x}..{:#05x} as {:?}",
                region.name, region.start, region.end, region.attributes
            );
            for index in region.indices() {
                if let Some(entry) = self.entries.get_mut(index) {
                    *entry = SectionDescriptor::new((index << SECTION_SHIFT) as u32, &region.attributes);
                }
            }
        }
    }

    pub fn entry(&self, index: usize) -> Option<SectionDescriptor> {
        self.entries.get(index).copied()
    }

    pub fn entries(&self) -> &[SectionDescriptor; SECTION_COUNT] {
        &self.entries
    }

    /// The attributes the section containing `addr` is mapped with, `None` if it is unmapped
    pub fn attributes_at(&self, addr: u32) -> Option<SectionAttributes> {
        self.entry((addr >> SECTION_SHIFT) as usize)
            .and_then(SectionDescriptor::attributes)
    }

    /// The address of the first entry. With the MMU off and the flat mapping on this is the physical address to
    /// program into TTBR0, which only holds 32 bits.
    pub fn base_address(&self) -> usize {
        self.entries.as_ptr() as usize
    }
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::new()
    }
}
