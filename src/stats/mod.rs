//! Stats module - field profiling for data-informed spec building

mod profiler;

pub use profiler::{profile_field, profile_fields, FieldProfile, NumericProfile};
