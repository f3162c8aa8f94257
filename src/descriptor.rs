/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # Section Descriptor
//!
//! The flat mapping only uses first level section entries of the ARMv7-A short descriptor format. Each of them maps a
//! 1MB aligned region of physical memory with a single set of attributes.
//!
//! |Entry type - Bits |31     20|19  16|15 |14 12|11 10| 9 |8     5| 4 | 3 | 2 |1 0|
//! |------------------|---------|------|---|-----|-----|---|------|---|---|---|---|
//! | Fault            |                   ignored                                |0 0|
//! | Section          | BASE    |      |APX| TEX | AP  |   |DOMAIN|XN | C | B |1 0|
//!
//! Bit    | Description
//! -------|-------------
//!  BASE  | Section base address, bits \[31:20\] of the physical address
//!  APX   | Access permission extension bit AP\[2\]
//!  AP    | Access permission bits AP\[1:0\]
//!  DOMAIN| Domain the section belongs to. The domain access rights are configured in the DACR register
//!  XN    | eXecute Never bit determining whether the memory region is executable or not.
//!  C, B  | Cacheable and Bufferable bits, with TEX = 0b000 they select the memory type
//!
//! The policy of a section is described with the strongly typed [SectionAttributes]. The only place where this policy
//! is turned into bits is [encode], the only place where bits are turned back into policy is
//! [SectionDescriptor::attributes].

use crate::config::{SECTION_SHIFT, SECTION_SIZE};
use tock_registers::fields::FieldValue;
use tock_registers::{register_bitfields, LocalRegisterCopy};

register_bitfields! {
    u32,

    /// First level section entry
    pub SECTION [
        /// Entry type
        TYPE OFFSET(0) NUMBITS(2) [
            Fault = 0b00,
            Section = 0b10
        ],
        /// Bufferable
        B OFFSET(2) NUMBITS(1) [],
        /// Cacheable
        C OFFSET(3) NUMBITS(1) [],
        /// eXecute Never
        XN OFFSET(4) NUMBITS(1) [],
        DOMAIN OFFSET(5) NUMBITS(4) [],
        /// Access permission AP\[1:0\]
        AP OFFSET(10) NUMBITS(2) [],
        /// Access permission AP\[2\]
        APX OFFSET(15) NUMBITS(1) [],
        /// Section base address \[31:20\]
        BASE OFFSET(20) NUMBITS(12) []
    ]
}

/// Data access permission class of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    /// read/write from privileged modes, no user access
    PrivilegedOnly,
    /// read/write from privileged modes, read only from user mode
    NoUserWrite,
    /// read/write from any mode
    FullAccess,
    /// read only from privileged modes, no user access
    PrivilegedReadOnly,
    /// read only from any mode
    ReadOnly,
}

impl AccessClass {
    /// The (APX, AP) encoding of this access class
    const fn bits(self) -> (u32, u32) {
        match self {
            AccessClass::PrivilegedOnly => (0, 0b01),
            AccessClass::NoUserWrite => (0, 0b10),
            AccessClass::FullAccess => (0, 0b11),
            AccessClass::PrivilegedReadOnly => (1, 0b01),
            AccessClass::ReadOnly => (1, 0b10),
        }
    }

    fn from_bits(apx: u32, ap: u32) -> Option<Self> {
        match (apx, ap) {
            (0, 0b01) => Some(AccessClass::PrivilegedOnly),
            (0, 0b10) => Some(AccessClass::NoUserWrite),
            (0, 0b11) => Some(AccessClass::FullAccess),
            (1, 0b01) => Some(AccessClass::PrivilegedReadOnly),
            (1, 0b10) => Some(AccessClass::ReadOnly),
            _ => None,
        }
    }
}

/// Memory type and cacheability of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// not cached, not buffered, accesses strictly in program order. Use this for memory shared with DMA masters
    /// that is not maintained by hand
    StronglyOrdered,
    /// device memory, not cached but write buffered
    SharedDevice,
    /// cacheable, write through
    WriteThrough,
    /// cacheable, write back
    WriteBack,
}

impl CachePolicy {
    /// The (C, B) encoding of this policy, TEX is always 0b000
    const fn bits(self) -> (u32, u32) {
        match self {
            CachePolicy::StronglyOrdered => (0, 0),
            CachePolicy::SharedDevice => (0, 1),
            CachePolicy::WriteThrough => (1, 0),
            CachePolicy::WriteBack => (1, 1),
        }
    }

    fn from_bits(c: u32, b: u32) -> Self {
        match (c, b) {
            (0, 0) => CachePolicy::StronglyOrdered,
            (0, _) => CachePolicy::SharedDevice,
            (_, 0) => CachePolicy::WriteThrough,
            _ => CachePolicy::WriteBack,
        }
    }

    /// Whether the CPU data cache may hold copies of memory with this policy. Only such memory requires cache
    /// maintenance around DMA transfers.
    pub const fn is_cacheable(self) -> bool {
        matches!(self, CachePolicy::WriteThrough | CachePolicy::WriteBack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execute {
    Allowed,
    Never,
}

/// The complete policy of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionAttributes {
    pub access: AccessClass,
    pub domain: u8,
    pub execute: Execute,
    pub cache: CachePolicy,
}

impl SectionAttributes {
    /// Attributes of a section assigned to the flat (unchecked) domain
    pub const fn new(access: AccessClass, execute: Execute, cache: CachePolicy) -> Self {
        Self {
            access,
            domain: crate::config::FLAT_DOMAIN,
            execute,
            cache,
        }
    }

    /// Same attributes, different domain. Only the lower 4 bits of `domain` are used when encoding.
    pub const fn with_domain(self, domain: u8) -> Self {
        Self { domain, ..self }
    }
}

/// Encode the first level section entry mapping the 1MB section at `base` with the given attributes.
///
/// `base` is expected to be 1MB aligned, the lower 20 bits are masked off and never validated. The `domain` is
/// truncated to its lower 4 bits.
pub fn encode(base: u32, access: AccessClass, domain: u8, execute: Execute, cache: CachePolicy) -> u32 {
    let (apx, ap) = access.bits();
    let (c, b) = cache.bits();
    let xn = match execute {
        Execute::Allowed => 0,
        Execute::Never => 1,
    };

    let entry: FieldValue<u32, SECTION::Register> = SECTION::BASE.val(base >> SECTION_SHIFT)
        + SECTION::APX.val(apx)
        + SECTION::AP.val(ap)
        + SECTION::DOMAIN.val(u32::from(domain) & 0xF)
        + SECTION::XN.val(xn)
        + SECTION::C.val(c)
        + SECTION::B.val(b)
        + SECTION::TYPE::Section;

    entry.value
}

/// A single entry of the first level translation table
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor(u32);

impl SectionDescriptor {
    /// The fault entry. Any access to a section described by it raises a translation fault.
    pub const FAULT: Self = Self(0);

    pub fn new(base: u32, attributes: &SectionAttributes) -> Self {
        Self(encode(
            base,
            attributes.access,
            attributes.domain,
            attributes.execute,
            attributes.cache,
        ))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn is_section(self) -> bool {
        let entry = LocalRegisterCopy::<u32, SECTION::Register>::new(self.0);
        entry.matches_all(SECTION::TYPE::Section)
    }

    /// The physical base address this entry maps to, if it is a section entry
    pub fn base_address(self) -> Option<u32> {
        if !self.is_section() {
            return None;
        }
        let entry = LocalRegisterCopy::<u32, SECTION::Register>::new(self.0);
        Some(entry.read(SECTION::BASE) << SECTION_SHIFT)
    }

    /// Decode the attributes of this entry. Fault entries and access permission encodings this crate never writes
    /// yield `None`.
    pub fn attributes(self) -> Option<SectionAttributes> {
        if !self.is_section() {
            return None;
        }
        let entry = LocalRegisterCopy::<u32, SECTION::Register>::new(self.0);
        let access = AccessClass::from_bits(entry.read(SECTION::APX), entry.read(SECTION::AP))?;
        let execute = if entry.is_set(SECTION::XN) {
            Execute::Never
        } else {
            Execute::Allowed
        };

        Some(SectionAttributes {
            access,
            domain: entry.read(SECTION::DOMAIN) as u8,
            execute,
            cache: CachePolicy::from_bits(entry.read(SECTION::C), entry.read(SECTION::B)),
        })
    }
}

impl core::fmt::Debug for SectionDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.attributes() {
            Some(attributes) => f
                .debug_struct("SectionDescriptor")
                .field("base", &format_args!("{:#010x}", self.0 & !(SECTION_SIZE as u32 - 1)))
                .field("attributes", &attributes)
                .finish(),
            None => write!(f, "SectionDescriptor({:#010x})", self.0),
        }
    }
}
