/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # CP15 System Control Coprocessor
//!
//! Access to the system control registers and maintenance operations the MMU and cache handling is built on. The
//! [Cp15] trait is the only place where the hardware is touched. Everything on top of it - the enable sequence and
//! the cache maintenance - is expressed in terms of these primitives.

use tock_registers::register_bitfields;

register_bitfields! {
    u32,

    /// System Control Register
    pub SCTLR [
        /// MMU enable
        M OFFSET(0) NUMBITS(1) [
            DISABLE = 0,
            ENABLE = 1
        ],
        /// Alignment check enable
        A OFFSET(1) NUMBITS(1) [
            DISABLE = 0,
            ENABLE = 1
        ],
        /// Data and unified cache enable
        C OFFSET(2) NUMBITS(1) [
            DISABLE = 0,
            ENABLE = 1
        ],
        /// Instruction cache enable
        I OFFSET(12) NUMBITS(1) [
            DISABLE = 0,
            ENABLE = 1
        ]
    ],

    /// Domain Access Control Register
    pub DACR [
        D15 OFFSET(30) NUMBITS(2) [
            NOACCESS = 0b00,
            CLIENT = 0b01,
            MANAGER = 0b11
        ]
    ],

    /// Translation Table Base Control Register
    pub TTBCR [
        /// Width of the TTBR0 base address field, 0 selects TTBR0 for the whole address space
        N OFFSET(0) NUMBITS(3) []
    ]
}

/// The data cache maintenance operation to perform on a line, either addressed by its virtual address or by set/way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    /// discard the line (DCIMVAC / DCISW)
    Invalidate,
    /// write the line back to memory if it is dirty (DCCMVAC / DCCSW)
    Clean,
    /// write back then discard the line (DCCIMVAC / DCCISW)
    CleanInvalidate,
}

/// The CP15 registers and instructions used to set up the MMU and maintain the L1 caches.
///
/// All operations take `&mut self`: the maintenance interface is a single per core resource without any locking,
/// whoever owns the implementation is the only one allowed to use it.
pub trait Cp15 {
    fn read_sctlr(&mut self) -> u32;
    fn write_sctlr(&mut self, value: u32);
    fn write_ttbcr(&mut self, value: u32);
    fn write_ttbr0(&mut self, value: u32);
    fn write_dacr(&mut self, value: u32);

    /// data synchronization barrier
    fn dsb(&mut self);
    /// data memory barrier
    fn dmb(&mut self);
    /// instruction synchronization barrier
    fn isb(&mut self);

    /// invalidate all instruction cache lines to the point of unification (ICIALLU)
    fn icache_invalidate_all(&mut self);
    /// invalidate all unified TLB entries (TLBIALL)
    fn tlb_invalidate_all(&mut self);
    /// data cache maintenance of the line containing the virtual address `mva` to the point of coherency
    fn dcache_by_mva(&mut self, op: LineOp, mva: usize);
    /// data cache maintenance of a single line given as set/way operand
    fn dcache_by_set_way(&mut self, op: LineOp, set_way: u32);
}

#[cfg(target_arch = "arm")]
pub use self::armv7a::Armv7a;

#[cfg(target_arch = "arm")]
mod armv7a {
    use super::{Cp15, LineOp};
    use core::arch::asm;

    /// The CP15 of the ARMv7-A core this code is running on
    pub struct Armv7a {
        _private: (),
    }

    impl Armv7a {
        /// # Safety
        /// There must be only one instance per core. Each of them gives unrestricted access to the system control
        /// registers and cache maintenance of the current core.
        pub unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl Cp15 for Armv7a {
        fn read_sctlr(&mut self) -> u32 {
            let value: u32;
            unsafe { asm!("mrc p15, 0, {}, c1, c0, 0", out(reg) value, options(nostack, preserves_flags)) };
            value
        }

        fn write_sctlr(&mut self, value: u32) {
            unsafe { asm!("mcr p15, 0, {}, c1, c0, 0", in(reg) value, options(nostack, preserves_flags)) };
        }

        fn write_ttbcr(&mut self, value: u32) {
            unsafe { asm!("mcr p15, 0, {}, c2, c0, 2", in(reg) value, options(nostack, preserves_flags)) };
        }

        fn write_ttbr0(&mut self, value: u32) {
            unsafe { asm!("mcr p15, 0, {}, c2, c0, 0", in(reg) value, options(nostack, preserves_flags)) };
        }

        fn write_dacr(&mut self, value: u32) {
            unsafe { asm!("mcr p15, 0, {}, c3, c0, 0", in(reg) value, options(nostack, preserves_flags)) };
        }

        // the barriers must not be `nomem`, they also keep the compiler from moving memory accesses across them
        fn dsb(&mut self) {
            unsafe { asm!("dsb", options(nostack, preserves_flags)) };
        }

        fn dmb(&mut self) {
            unsafe { asm!("dmb", options(nostack, preserves_flags)) };
        }

        fn isb(&mut self) {
            unsafe { asm!("isb", options(nostack, preserves_flags)) };
        }

        fn icache_invalidate_all(&mut self) {
            unsafe { asm!("mcr p15, 0, {}, c7, c5, 0", in(reg) 0u32, options(nostack, preserves_flags)) };
        }

        fn tlb_invalidate_all(&mut self) {
            unsafe { asm!("mcr p15, 0, {}, c8, c7, 0", in(reg) 0u32, options(nostack, preserves_flags)) };
        }

        fn dcache_by_mva(&mut self, op: LineOp, mva: usize) {
            unsafe {
                match op {
                    LineOp::Invalidate => {
                        asm!("mcr p15, 0, {}, c7, c6, 1", in(reg) mva, options(nostack, preserves_flags))
                    }
                    LineOp::Clean => asm!("mcr p15, 0, {}, c7, c10, 1", in(reg) mva, options(nostack, preserves_flags)),
                    LineOp::CleanInvalidate => {
                        asm!("mcr p15, 0, {}, c7, c14, 1", in(reg) mva, options(nostack, preserves_flags))
                    }
                }
            }
        }

        fn dcache_by_set_way(&mut self, op: LineOp, set_way: u32) {
            unsafe {
                match op {
                    LineOp::Invalidate => {
                        asm!("mcr p15, 0, {}, c7, c6, 2", in(reg) set_way, options(nostack, preserves_flags))
                    }
                    LineOp::Clean => {
                        asm!("mcr p15, 0, {}, c7, c10, 2", in(reg) set_way, options(nostack, preserves_flags))
                    }
                    LineOp::CleanInvalidate => {
                        asm!("mcr p15, 0, {}, c7, c14, 2", in(reg) set_way, options(nostack, preserves_flags))
                    }
                }
            }
        }
    }
}
