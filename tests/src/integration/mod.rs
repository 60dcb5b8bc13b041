//! Integration flows across render strategies and state persistence.

#[cfg(test)]
pub(crate) mod fixtures;

pub mod fallback;
pub mod lifecycle;
pub mod round_trip;
