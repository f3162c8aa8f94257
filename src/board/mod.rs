/***********************************************************************************************************************
 * Copyright (c) 2020 by the authors
 *
 * Author: André Borrmann <pspwizard@gmx.de>
 * License: Apache License 2.0 / MIT
 **********************************************************************************************************************/

//! # Board Memory Maps
//!
//! The region policy tables of the supported boards. Each board is enabled with the cargo feature of the same name.

#[cfg(feature = "sama5d2")]
pub mod sama5d2;
