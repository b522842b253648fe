// SPDX-License-Identifier: MIT

pub mod builder;
pub mod executor;

pub use builder::{GraphBuilder, Responder};
pub use executor::{CompiledGraph, Edge, Node, StateGraph, END};
