//! UI hierarchy acquisition and parsing
//!
//! - `bounds`: pixel rectangle to fractional coordinates
//! - `parser`: hierarchy markup to a [`crate::model::Node`] tree
//! - `strategy`: ordered, self-promoting list of dump strategies

mod bounds;
mod parser;
mod strategy;

pub use bounds::normalize_bounds;
pub use parser::parse_xml;
pub use strategy::{DumpFuture, Strategy, StrategyChain};
