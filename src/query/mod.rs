// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - ranked search command

pub mod search;
