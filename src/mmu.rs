/***********************************************************************************************************************
 * Copyright (c) 2019 by the authors
 *
 * Author: André Borrmann
 * License: Apache 2.0
 **********************************************************************************************************************/

//! # MMU maintenance
//!
use crate::cache::{CacheMaintenance, CacheState};
use crate::cp15::{Cp15, DACR, SCTLR, TTBCR};
use crate::region::RegionTable;
use crate::table::TranslationTable;
use core::mem::size_of;
use log::{debug, info, warn};
use tock_registers::LocalRegisterCopy;

/// The MMU and L1 caches of the current core together with the translation table they use.
///
/// There is one instance per core, created on the boot path. After [Mmu::initialize] the only operations meant to be
/// used are the cache maintenance ones around DMA transfers.
pub struct Mmu<'a, C: Cp15> {
    cp15: C,
    table: &'a mut TranslationTable,
    regions: RegionTable<'a>,
    initialized: bool,
}

impl<'a, C: Cp15> Mmu<'a, C> {
    pub fn new(cp15: C, table: &'a mut TranslationTable, regions: RegionTable<'a>) -> Self {
        Self {
            cp15,
            table,
            regions,
            initialized: false,
        }
    }

    /// Initialize the MMU. This configures the 1:1 mapping of all sections given by the memory map and enables the
    /// instruction cache, the MMU and the data cache - in this order. Sections not part of the memory map stay
    /// unmapped, any access to them raises a translation fault.
    ///
    /// This must be called exactly once, before interrupts are enabled and before any DMA capable peripheral is
    /// running. Further calls do nothing as the mapping is never changed once active.
    pub fn initialize(&mut self) {
        if self.initialized {
            warn!("MMU already initialized, mapping left untouched");
            return;
        }

        self.table.build_flat_map(self.regions);
        let table_base = self.table.base_address();
        debug!("translation table at {:#010x}", table_base);

        // table walks do not look into the data cache, a table written through it has to reach memory first
        if self.cp15.dcache_state() == CacheState::Enabled {
            self.cp15.clean_range(table_base, size_of::<TranslationTable>());
        }

        // use TTBR0 for the whole address space
        self.cp15.write_ttbcr(TTBCR::N.val(0).value);
        // addresses are 32 bits wide on the target, only host builds narrow the table address here
        self.cp15.write_ttbr0(table_base as u32);

        // only domain 15 is used, accesses to it are not checked against the access permission bits
        self.cp15.write_dacr(DACR::D15::MANAGER.value);

        // the table has to be in memory before the first table walk
        self.cp15.dsb();
        self.cp15.isb();

        self.cp15.enable_icache();
        debug!("instruction cache enabled");
        self.enable_translation();
        debug!("address translation enabled");
        self.cp15.enable_dcache();

        self.initialized = true;
        info!("MMU up, {} regions mapped 1:1, caches enabled", self.regions.len());
    }

    /// Disable the data cache, the MMU and the instruction cache. Dirty data is written back before the data cache is
    /// turned off. The translation table is kept as is.
    pub fn disable(&mut self) {
        self.cp15.disable_dcache();

        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.cp15.read_sctlr());
        if sctlr.is_set(SCTLR::M) {
            sctlr.modify(SCTLR::M::DISABLE);
            self.cp15.write_sctlr(sctlr.get());
            self.cp15.isb();
        }

        self.cp15.disable_icache();
        debug!("MMU and caches disabled");
    }

    pub fn is_enabled(&mut self) -> bool {
        LocalRegisterCopy::<u32, SCTLR::Register>::new(self.cp15.read_sctlr()).is_set(SCTLR::M)
    }

    pub fn table(&self) -> &TranslationTable {
        &*self.table
    }

    /// Invalidate the data cache lines of a buffer, call before reading data a DMA master has written to it
    pub fn invalidate_range(&mut self, addr: usize, len: usize) {
        self.cp15.invalidate_range(addr, len);
    }

    /// Clean the data cache lines of a buffer, call before a DMA master reads data the CPU has written to it
    pub fn clean_range(&mut self, addr: usize, len: usize) {
        self.cp15.clean_range(addr, len);
    }

    pub fn clean_invalidate_range(&mut self, addr: usize, len: usize) {
        self.cp15.clean_invalidate_range(addr, len);
    }

    pub fn invalidate_all_icache(&mut self) {
        self.cp15.invalidate_all_icache();
    }

    pub fn invalidate_all_dcache(&mut self) {
        self.cp15.invalidate_all_dcache();
    }

    pub fn clean_all_dcache(&mut self) {
        self.cp15.clean_all_dcache();
    }

    pub fn clean_invalidate_all_dcache(&mut self) {
        self.cp15.clean_invalidate_all_dcache();
    }

    pub fn enable_icache(&mut self) {
        self.cp15.enable_icache();
    }

    pub fn disable_icache(&mut self) {
        self.cp15.disable_icache();
    }

    pub fn enable_dcache(&mut self) {
        self.cp15.enable_dcache();
    }

    pub fn disable_dcache(&mut self) {
        self.cp15.disable_dcache();
    }

    /// Give back the CP15 access and the translation table
    pub fn release(self) -> (C, &'a mut TranslationTable) {
        (self.cp15, self.table)
    }

    fn enable_translation(&mut self) {
        // drop whatever a previous stage left in the TLB
        self.cp15.tlb_invalidate_all();
        self.cp15.dsb();
        self.cp15.isb();

        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.cp15.read_sctlr());
        sctlr.modify(SCTLR::M::ENABLE + SCTLR::A::DISABLE);
        self.cp15.write_sctlr(sctlr.get());
        // the next instruction fetch is translated already
        self.cp15.isb();
    }
}
