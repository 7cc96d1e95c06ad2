#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// The index-chained map and its default hasher wiring.
///
/// This module provides [`SlimMap`], a flat-storage map with a fused
/// get-or-insert operation and a configurable hasher builder.
pub mod map;

pub use map::DefaultHashBuilder;
pub use map::SlimMap;
