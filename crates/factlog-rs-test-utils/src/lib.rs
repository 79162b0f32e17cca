//! Test helpers shared across FactLog crates.

pub mod files;
pub mod store;

pub use files::{canonical, touch};
pub use store::TempStore;
