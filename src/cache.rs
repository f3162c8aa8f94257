/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # L1 Cache Maintenance
//!
//! Whole cache operations walk every set/way of the L1 data cache and are meant for enabling and disabling the caches
//! only, as their cost scales with the cache size. Around DMA transfers the range operations are to be used:
//!
//! - before the CPU reads a buffer a DMA master has written: [CacheMaintenance::invalidate_range]
//! - before a DMA master reads a buffer the CPU has written: [CacheMaintenance::clean_range]
//! - for buffers handed back and forth: [CacheMaintenance::clean_invalidate_range]
//!
//! Nothing in here locks or masks interrupts. Callers running with interrupts enabled have to make sure no other code
//! touches the caches while one of these operations is in progress.

use crate::cache_line_align;
use crate::config::{CACHE_LINE_SHIFT, CACHE_LINE_SIZE, DCACHE_SETS, DCACHE_WAYS, DCACHE_WAY_SHIFT};
use crate::cp15::{Cp15, LineOp, SCTLR};
use log::trace;
use tock_registers::LocalRegisterCopy;

/// Enable state of a single cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Disabled,
    Enabled,
}

/// Cache maintenance on top of the raw [Cp15] primitives. Available on every [Cp15] implementation.
pub trait CacheMaintenance: Cp15 {
    /// Discard the whole instruction cache
    fn invalidate_all_icache(&mut self) {
        self.icache_invalidate_all();
        self.dsb();
        self.isb();
    }

    /// Discard the whole data cache. Dirty lines are lost.
    fn invalidate_all_dcache(&mut self) {
        dcache_all(self, LineOp::Invalidate);
    }

    /// Write every dirty data cache line back to memory, the lines stay valid
    fn clean_all_dcache(&mut self) {
        dcache_all(self, LineOp::Clean);
    }

    fn clean_invalidate_all_dcache(&mut self) {
        dcache_all(self, LineOp::CleanInvalidate);
    }

    fn icache_state(&mut self) -> CacheState {
        let sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if sctlr.is_set(SCTLR::I) {
            CacheState::Enabled
        } else {
            CacheState::Disabled
        }
    }

    fn dcache_state(&mut self) -> CacheState {
        let sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if sctlr.is_set(SCTLR::C) {
            CacheState::Enabled
        } else {
            CacheState::Disabled
        }
    }

    /// Enable the instruction cache. It is invalidated right before, so nothing cached before it was enabled can be
    /// executed. Does nothing if the cache is already enabled.
    fn enable_icache(&mut self) {
        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if !sctlr.is_set(SCTLR::I) {
            self.invalidate_all_icache();
            sctlr.modify(SCTLR::I::ENABLE);
            self.write_sctlr(sctlr.get());
            self.isb();
        }
    }

    /// Disable the instruction cache and invalidate it afterwards. Does nothing if the cache is already disabled.
    fn disable_icache(&mut self) {
        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if sctlr.is_set(SCTLR::I) {
            sctlr.modify(SCTLR::I::DISABLE);
            self.write_sctlr(sctlr.get());
            self.isb();
            self.invalidate_all_icache();
        }
    }

    /// Enable the data cache. It is invalidated right before, so no stale line becomes visible. Does nothing if the
    /// cache is already enabled.
    fn enable_dcache(&mut self) {
        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if !sctlr.is_set(SCTLR::C) {
            self.invalidate_all_dcache();
            sctlr.modify(SCTLR::C::ENABLE);
            self.write_sctlr(sctlr.get());
            self.isb();
        }
    }

    /// Disable the data cache. Dirty lines are written back while the cache is still on, once it is off every line is
    /// discarded so nothing stale shows up when it gets enabled again. Does nothing if the cache is already disabled.
    fn disable_dcache(&mut self) {
        let mut sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.read_sctlr());
        if sctlr.is_set(SCTLR::C) {
            self.clean_all_dcache();
            sctlr.modify(SCTLR::C::DISABLE);
            self.write_sctlr(sctlr.get());
            self.isb();
            self.invalidate_all_dcache();
        }
    }

    /// Discard the data cache lines covering `len` bytes starting at `addr`. Lines only partially covered by the
    /// range are discarded as a whole, including any dirty data outside the range.
    fn invalidate_range(&mut self, addr: usize, len: usize) {
        dcache_range(self, LineOp::Invalidate, addr, len);
    }

    /// Write the data cache lines covering `len` bytes starting at `addr` back to memory
    fn clean_range(&mut self, addr: usize, len: usize) {
        dcache_range(self, LineOp::Clean, addr, len);
    }

    fn clean_invalidate_range(&mut self, addr: usize, len: usize) {
        dcache_range(self, LineOp::CleanInvalidate, addr, len);
    }
}

impl<T: Cp15 + ?Sized> CacheMaintenance for T {}

/// The set/way operand for the data cache line at `set` in `way`
pub(crate) const fn set_way(set: u32, way: u32) -> u32 {
    (way << DCACHE_WAY_SHIFT) | (set << CACHE_LINE_SHIFT)
}

fn dcache_all<C: Cp15 + ?Sized>(cp15: &mut C, op: LineOp) {
    cp15.dmb();
    for way in 0..DCACHE_WAYS {
        for set in 0..DCACHE_SETS {
            cp15.dcache_by_set_way(op, set_way(set, way));
        }
    }
    cp15.dsb();
}

fn dcache_range<C: Cp15 + ?Sized>(cp15: &mut C, op: LineOp, addr: usize, len: usize) {
    trace!("{:?} data cache {:#x}..+{:#x}", op, addr, len);
    // a range reaching past the top of the address space ends at the top
    let end = addr.saturating_add(len);
    let mut mva = cache_line_align(addr);

    while mva < end {
        cp15.dcache_by_mva(op, mva);
        cp15.dmb();
        mva = match mva.checked_add(CACHE_LINE_SIZE) {
            Some(next) => next,
            None => break,
        };
    }
    cp15.dsb();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CACHE_LINE_MASK;
    use crate::testing::{Op, Recorder};
    use proptest::prelude::*;

    #[test]
    fn unaligned_range_is_widened_to_full_lines() {
        let mut cp15 = Recorder::new();
        cp15.invalidate_range(17, 40);

        assert_eq!(
            cp15.ops(),
            &[
                Op::DcacheMva(LineOp::Invalidate, 0),
                Op::Dmb,
                Op::DcacheMva(LineOp::Invalidate, 32),
                Op::Dmb,
                Op::Dsb,
            ]
        );
    }

    #[test]
    fn range_operations_use_their_own_line_op() {
        let mut cp15 = Recorder::new();
        cp15.clean_range(0x2000_0040, 64);
        assert_eq!(cp15.mva_ops(), [(LineOp::Clean, 0x2000_0040), (LineOp::Clean, 0x2000_0060)]);

        let mut cp15 = Recorder::new();
        cp15.clean_invalidate_range(0x2000_005F, 2);
        assert_eq!(
            cp15.mva_ops(),
            [(LineOp::CleanInvalidate, 0x2000_0040), (LineOp::CleanInvalidate, 0x2000_0060)]
        );
    }

    #[test]
    fn empty_range_only_synchronizes() {
        let mut cp15 = Recorder::new();
        cp15.invalidate_range(0x2000_0010, 0);
        assert_eq!(cp15.ops(), &[Op::Dsb]);
    }

    #[test]
    fn range_at_top_of_address_space_terminates() {
        let mut cp15 = Recorder::new();
        cp15.clean_range(usize::MAX - 40, 100);
        let lines = cp15.mva_ops();
        assert_eq!(lines.first().map(|line| line.1), Some((usize::MAX - 40) & !CACHE_LINE_MASK));
        assert_eq!(lines.last().map(|line| line.1), Some(usize::MAX & !CACHE_LINE_MASK));
    }

    #[test]
    fn whole_cache_operations_visit_every_set_and_way() {
        let mut cp15 = Recorder::new();
        cp15.clean_all_dcache();

        let ops = cp15.ops();
        assert_eq!(ops.first(), Some(&Op::Dmb));
        assert_eq!(ops.last(), Some(&Op::Dsb));
        assert_eq!(ops.len(), (DCACHE_SETS * DCACHE_WAYS) as usize + 2);
        assert!(ops.contains(&Op::DcacheSetWay(LineOp::Clean, set_way(0, 0))));
        assert!(ops.contains(&Op::DcacheSetWay(LineOp::Clean, 0xC000_1FE0)));
    }

    #[test]
    fn icache_invalidate_is_synchronized() {
        let mut cp15 = Recorder::new();
        cp15.invalidate_all_icache();
        assert_eq!(cp15.ops(), &[Op::IcacheInvalidateAll, Op::Dsb, Op::Isb]);
    }

    #[test]
    fn enabling_icache_twice_invalidates_once() {
        let mut cp15 = Recorder::new();
        cp15.enable_icache();
        cp15.enable_icache();

        assert_eq!(cp15.icache_state(), CacheState::Enabled);
        assert_eq!(cp15.summary(), [Op::IcacheInvalidateAll, Op::SctlrSet(1 << 12)]);
    }

    #[test]
    fn enabling_dcache_twice_invalidates_once() {
        let mut cp15 = Recorder::new();
        cp15.enable_dcache();
        cp15.enable_dcache();

        assert_eq!(cp15.dcache_state(), CacheState::Enabled);
        assert_eq!(cp15.summary(), [Op::DcacheAll(LineOp::Invalidate), Op::SctlrSet(1 << 2)]);
    }

    #[test]
    fn disabling_dcache_cleans_before_and_invalidates_after() {
        let mut cp15 = Recorder::with_sctlr(1 << 2);
        cp15.disable_dcache();

        assert_eq!(cp15.dcache_state(), CacheState::Disabled);
        assert_eq!(
            cp15.summary(),
            [
                Op::DcacheAll(LineOp::Clean),
                Op::SctlrClear(1 << 2),
                Op::DcacheAll(LineOp::Invalidate)
            ]
        );
    }

    #[test]
    fn disabling_a_disabled_cache_does_nothing() {
        let mut cp15 = Recorder::new();
        cp15.disable_dcache();
        cp15.disable_icache();
        assert!(cp15.ops().is_empty());
    }

    #[test]
    fn icache_enable_disable_enable() {
        let mut cp15 = Recorder::new();
        cp15.enable_icache();
        cp15.disable_icache();
        cp15.enable_icache();

        assert_eq!(cp15.icache_state(), CacheState::Enabled);
        assert_eq!(
            cp15.summary(),
            [
                Op::IcacheInvalidateAll,
                Op::SctlrSet(1 << 12),
                Op::SctlrClear(1 << 12),
                Op::IcacheInvalidateAll,
                Op::IcacheInvalidateAll,
                Op::SctlrSet(1 << 12),
            ]
        );
    }

    #[test]
    fn cache_switches_keep_other_sctlr_bits() {
        let mut cp15 = Recorder::with_sctlr((1 << 11) | 1);
        cp15.enable_dcache();
        cp15.enable_icache();
        assert_eq!(cp15.sctlr(), (1 << 12) | (1 << 11) | (1 << 2) | 1);

        cp15.disable_dcache();
        assert_eq!(cp15.sctlr(), (1 << 12) | (1 << 11) | 1);
    }

    proptest! {
        #[test]
        fn range_lines_cover_exactly_the_range(addr in 0usize..0x1000_0000, len in 1usize..0x2000) {
            let mut cp15 = Recorder::new();
            cp15.invalidate_range(addr, len);
            let lines = cp15.mva_ops();

            let first = addr & !CACHE_LINE_MASK;
            let last = (addr + len - 1) & !CACHE_LINE_MASK;
            prop_assert_eq!(lines.len(), (last - first) / CACHE_LINE_SIZE + 1);
            for (idx, (op, mva)) in lines.iter().enumerate() {
                prop_assert_eq!(*op, LineOp::Invalidate);
                prop_assert_eq!(*mva, first + idx * CACHE_LINE_SIZE);
            }

            // every line write is followed by a barrier and the whole operation by a final dsb
            let ops = cp15.ops();
            prop_assert_eq!(ops.last(), Some(&Op::Dsb));
            for pair in ops.chunks(2).take(lines.len()) {
                prop_assert_eq!(&pair[1], &Op::Dmb);
            }
        }
    }
}
