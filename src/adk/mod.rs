// SPDX-License-Identifier: MIT

//! Agent development kit: models, tools and reasoning loops

pub mod agent;
pub mod error;
pub mod model;
pub mod tool;
