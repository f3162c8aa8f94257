/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! A [Cp15] that records what would have been sent to the hardware, used by the unit tests.
//! Written by hand rather than with a mocking crate as the tests check the folded trace of whole set/way walks.

use crate::cache::set_way;
use crate::config::{DCACHE_SETS, DCACHE_WAYS};
use crate::cp15::{Cp15, LineOp};
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    SctlrWrite(u32),
    TtbcrWrite(u32),
    Ttbr0Write(u32),
    DacrWrite(u32),
    Dsb,
    Dmb,
    Isb,
    IcacheInvalidateAll,
    TlbInvalidateAll,
    DcacheMva(LineOp, usize),
    DcacheSetWay(LineOp, u32),
    // only produced by `Recorder::summary`
    SctlrSet(u32),
    SctlrClear(u32),
    DcacheAll(LineOp),
}

pub struct Recorder {
    initial_sctlr: u32,
    sctlr: u32,
    ops: Vec<Op>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_sctlr(0)
    }

    pub fn with_sctlr(sctlr: u32) -> Self {
        Self {
            initial_sctlr: sctlr,
            sctlr,
            ops: Vec::new(),
        }
    }

    pub fn sctlr(&self) -> u32 {
        self.sctlr
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn mva_ops(&self) -> Vec<(LineOp, usize)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::DcacheMva(line_op, mva) => Some((*line_op, *mva)),
                _ => None,
            })
            .collect()
    }

    /// The recorded operations without barriers, SCTLR writes turned into the bits they set and cleared and every
    /// complete walk over all sets/ways of the data cache folded into a single `DcacheAll`.
    pub fn summary(&self) -> Vec<Op> {
        let mut summary = Vec::new();
        let mut sctlr = self.initial_sctlr;
        let mut idx = 0;

        while idx < self.ops.len() {
            match self.ops[idx] {
                Op::Dsb | Op::Dmb | Op::Isb => {}
                Op::SctlrWrite(value) => {
                    if value & !sctlr != 0 {
                        summary.push(Op::SctlrSet(value & !sctlr));
                    }
                    if sctlr & !value != 0 {
                        summary.push(Op::SctlrClear(sctlr & !value));
                    }
                    sctlr = value;
                }
                Op::DcacheSetWay(op, _) => {
                    let walk = self.ops[idx..]
                        .iter()
                        .take_while(|recorded| matches!(recorded, Op::DcacheSetWay(o, _) if *o == op))
                        .count();
                    assert!(is_full_walk(&self.ops[idx..idx + walk], op), "partial set/way walk");
                    summary.push(Op::DcacheAll(op));
                    idx += walk;
                    continue;
                }
                other => summary.push(other),
            }
            idx += 1;
        }

        summary
    }
}

fn is_full_walk(ops: &[Op], op: LineOp) -> bool {
    let mut expected = Vec::new();
    for way in 0..DCACHE_WAYS {
        for set in 0..DCACHE_SETS {
            expected.push(Op::DcacheSetWay(op, set_way(set, way)));
        }
    }
    ops == &expected[..]
}

impl Cp15 for Recorder {
    fn read_sctlr(&mut self) -> u32 {
        self.sctlr
    }

    fn write_sctlr(&mut self, value: u32) {
        self.sctlr = value;
        self.ops.push(Op::SctlrWrite(value));
    }

    fn write_ttbcr(&mut self, value: u32) {
        self.ops.push(Op::TtbcrWrite(value));
    }

    fn write_ttbr0(&mut self, value: u32) {
        self.ops.push(Op::Ttbr0Write(value));
    }

    fn write_dacr(&mut self, value: u32) {
        self.ops.push(Op::DacrWrite(value));
    }

    fn dsb(&mut self) {
        self.ops.push(Op::Dsb);
    }

    fn dmb(&mut self) {
        self.ops.push(Op::Dmb);
    }

    fn isb(&mut self) {
        self.ops.push(Op::Isb);
    }

    fn icache_invalidate_all(&mut self) {
        self.ops.push(Op::IcacheInvalidateAll);
    }

    fn tlb_invalidate_all(&mut self) {
        self.ops.push(Op::TlbInvalidateAll);
    }

    fn dcache_by_mva(&mut self, op: LineOp, mva: usize) {
        self.ops.push(Op::DcacheMva(op, mva));
    }

    fn dcache_by_set_way(&mut self, op: LineOp, set_way: u32) {
        self.ops.push(Op::DcacheSetWay(op, set_way));
    }
}
