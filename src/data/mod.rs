//! Data module - CSV loading and pattern filtering

pub mod filter;
pub mod loader;

pub use filter::apply_filter;
pub use loader::LoaderError;
