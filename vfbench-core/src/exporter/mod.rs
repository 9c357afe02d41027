//! Graph exporters for visual inspection.

pub mod dot;
