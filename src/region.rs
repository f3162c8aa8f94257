/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # Region Policy Table
//!
//! The memory map of a board is given as a list of section ranges, each with the attributes all sections within this
//! range shall be mapped with. Ranges are given in section index units (physical address >> 20) with an exclusive
//! end. Sections not covered by any region stay unmapped.

use crate::config::SECTION_COUNT;
use crate::descriptor::SectionAttributes;
use core::fmt;
use core::ops::Range;

/// A range of sections sharing the same attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    /// first section index
    pub start: usize,
    /// section index past the last one
    pub end: usize,
    pub attributes: SectionAttributes,
}

impl Region {
    pub const fn new(name: &'static str, start: usize, end: usize, attributes: SectionAttributes) -> Self {
        Self {
            name,
            start,
            end,
            attributes,
        }
    }

    /// A region covering exactly one section
    pub const fn section(name: &'static str, index: usize, attributes: SectionAttributes) -> Self {
        Self::new(name, index, index + 1, attributes)
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }

    fn overlaps(&self, other: &Region) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Configuration defects [RegionTable::validate] reports. They are never detected while building the translation
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    Empty { name: &'static str },
    OutOfRange { name: &'static str, end: usize },
    Overlap { first: &'static str, second: &'static str },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Empty { name } => write!(f, "region {} does not cover any section", name),
            RegionError::OutOfRange { name, end } => write!(
                f,
                "region {} ends at section {:#x}, past the last section {:#x}",
                name,
                end,
                SECTION_COUNT - 1
            ),
            RegionError::Overlap { first, second } => write!(f, "regions {} and {} overlap", first, second),
        }
    }
}

/// The ordered list of regions describing the memory map of a board
#[derive(Debug, Clone, Copy)]
pub struct RegionTable<'a> {
    regions: &'a [Region],
}

impl<'a> RegionTable<'a> {
    pub const fn new(regions: &'a [Region]) -> Self {
        Self { regions }
    }

    pub fn iter(&self) -> core::slice::Iter<'a, Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region a section index belongs to. With overlapping regions the last one wins, the same way the
    /// translation table builder resolves them.
    pub fn find(&self, index: usize) -> Option<&'a Region> {
        self.regions.iter().rev().find(|region| region.contains(index))
    }

    /// Check the table for configuration defects: empty regions, regions reaching past the 4GB address space and
    /// overlapping regions. Meant for tests and static review of a board memory map, the boot path never calls it.
    pub fn validate(&self) -> Result<(), RegionError> {
        for (idx, region) in self.regions.iter().enumerate() {
            if region.start >= region.end {
                return Err(RegionError::Empty { name: region.name });
            }
            if region.end > SECTION_COUNT {
                return Err(RegionError::OutOfRange {
                    name: region.name,
                    end: region.end,
                });
            }
            if let Some(other) = self.regions[..idx].iter().find(|other| other.overlaps(region)) {
                return Err(RegionError::Overlap {
                    first: other.name,
                    second: region.name,
                });
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for RegionTable<'a> {
    type Item = &'a Region;
    type IntoIter = core::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
