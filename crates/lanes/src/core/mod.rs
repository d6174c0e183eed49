//! Core data types.
//!
//! - [`lane::Lane`]: Element types a vector can hold (`u8`, `i8`, `u16`, `u32`, `i32`, `f32`)
//! - [`vector::Vector`]: Immutable fixed-width vector of lanes
//! - [`indices::Indices`]: Index vector naming a source lane per output lane
//! - [`error::LaneError`]: Construction and configuration errors

pub mod error;
pub mod indices;
pub mod lane;
pub mod vector;
