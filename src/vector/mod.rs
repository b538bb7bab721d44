//! Input vector handling
//!
//! Callers hand over arrays in whatever element type the query produced; the
//! engine accepts only `f32` components.

pub mod normalize;

pub use normalize::{to_float4_array, to_float4_array_with_dims, ArrayData, ElementType};
