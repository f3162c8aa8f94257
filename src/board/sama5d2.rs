/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # SAMA5D2 Memory Map
//!
//! Flat mapping of the SAMA5D2 address space. The upper 16MB of the DDR chip select are mapped strongly ordered. This
//! is the no-cache window buffers shared with DMA masters without explicit cache maintenance are placed in (linker
//! section `.region_nocache`).
//!
//! Sections between the listed regions (e.g. 0x0090_0000..0x00A0_0000 or 0xE000_0000..0xF000_0000) are not mapped.

use crate::descriptor::{AccessClass, CachePolicy, Execute, SectionAttributes};
use crate::region::{Region, RegionTable};

const ROM: SectionAttributes = SectionAttributes::new(AccessClass::ReadOnly, Execute::Allowed, CachePolicy::WriteBack);
const RAM: SectionAttributes =
    SectionAttributes::new(AccessClass::FullAccess, Execute::Allowed, CachePolicy::WriteBack);
/// on-chip RAM accessed by bus masters other than the CPU
const SHARED_RAM: SectionAttributes =
    SectionAttributes::new(AccessClass::FullAccess, Execute::Allowed, CachePolicy::SharedDevice);
const DEVICE: SectionAttributes =
    SectionAttributes::new(AccessClass::FullAccess, Execute::Never, CachePolicy::SharedDevice);
const STRONGLY_ORDERED: SectionAttributes =
    SectionAttributes::new(AccessClass::FullAccess, Execute::Never, CachePolicy::StronglyOrdered);
/// memory mapped flash and uncached DDR code may execute from
const STRONGLY_ORDERED_EXEC: SectionAttributes =
    SectionAttributes::new(AccessClass::FullAccess, Execute::Allowed, CachePolicy::StronglyOrdered);

/// DDR chip select, the first 112MB are cached
pub const DDR_START: usize = 0x200;
pub const DDR_NOCACHE_START: usize = 0x270;
pub const DDR_END: usize = 0x280;

/// All regions of the SAMA5D2, in the order they are applied
pub static MEMORY_MAP: RegionTable<'static> = RegionTable::new(&REGIONS);

static REGIONS: [Region; 27] = [
    Region::section("IROM", 0x000, ROM),
    Region::section("NFC RAM", 0x001, SHARED_RAM),
    Region::section("SRAM", 0x002, RAM),
    Region::section("UDPHS RAM", 0x003, DEVICE),
    Region::section("UHPHS OHCI", 0x004, DEVICE),
    Region::section("UHPHS EHCI", 0x005, DEVICE),
    Region::section("AXIMX", 0x006, DEVICE),
    Region::section("DAP", 0x007, DEVICE),
    Region::section("PTC MEM", 0x008, DEVICE),
    Region::new("L2CC", 0x00A, 0x00C, DEVICE),
    Region::new("EBI CS0", 0x100, 0x200, STRONGLY_ORDERED),
    Region::new("DDR AES CS", 0x400, 0x600, RAM),
    Region::new("EBI CS1", 0x600, 0x700, STRONGLY_ORDERED),
    Region::new("EBI CS2", 0x700, 0x800, STRONGLY_ORDERED),
    Region::new("EBI CS3", 0x800, 0x900, STRONGLY_ORDERED),
    Region::new("QSPI AES0", 0x900, 0x980, STRONGLY_ORDERED_EXEC),
    Region::new("QSPI AES1", 0x980, 0xA00, STRONGLY_ORDERED_EXEC),
    Region::section("SDMMC0", 0xA00, STRONGLY_ORDERED),
    Region::section("SDMMC1", 0xB00, STRONGLY_ORDERED),
    Region::new("NFC", 0xC00, 0xD00, STRONGLY_ORDERED),
    Region::new("QSPI0 MEM", 0xD00, 0xD80, STRONGLY_ORDERED_EXEC),
    Region::new("QSPI1 MEM", 0xD80, 0xE00, STRONGLY_ORDERED_EXEC),
    Region::section("PERIPHERALS 0", 0xF00, STRONGLY_ORDERED),
    Region::section("PERIPHERALS 1", 0xF80, STRONGLY_ORDERED),
    Region::section("PERIPHERALS 2", 0xFC0, STRONGLY_ORDERED),
    Region::new("DDR", DDR_START, DDR_NOCACHE_START, RAM),
    Region::new("DDR NOCACHE", DDR_NOCACHE_START, DDR_END, STRONGLY_ORDERED_EXEC),
];
