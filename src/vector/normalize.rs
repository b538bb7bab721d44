//! Conversion of typed input arrays into the engine's `f32` layout

use crate::error::{LdbError, Result};

use std::borrow::Cow;

/// Element type of an input array, identified by its type oid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Bool,
    Int8,
    Int2,
    Int4,
    Text,
    Float4,
    Float8,
}

impl ElementType {
    pub fn oid(&self) -> u32 {
        match self {
            ElementType::Bool => 16,
            ElementType::Int8 => 20,
            ElementType::Int2 => 21,
            ElementType::Int4 => 23,
            ElementType::Text => 25,
            ElementType::Float4 => 700,
            ElementType::Float8 => 701,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Bool => "bool",
            ElementType::Int8 => "int8",
            ElementType::Int2 => "int2",
            ElementType::Int4 => "int4",
            ElementType::Text => "text",
            ElementType::Float4 => "float4",
            ElementType::Float8 => "float8",
        }
    }
}

/// Borrowed array contents tagged with their element layout
#[derive(Debug, Clone, Copy)]
pub enum ArrayData<'a> {
    Bool(&'a [bool]),
    Int8(&'a [i64]),
    Int2(&'a [i16]),
    Int4(&'a [i32]),
    Text(&'a [String]),
    Float4(&'a [f32]),
    Float8(&'a [f64]),
}

impl ArrayData<'_> {
    pub fn element_type(&self) -> ElementType {
        match self {
            ArrayData::Bool(_) => ElementType::Bool,
            ArrayData::Int8(_) => ElementType::Int8,
            ArrayData::Int2(_) => ElementType::Int2,
            ArrayData::Int4(_) => ElementType::Int4,
            ArrayData::Text(_) => ElementType::Text,
            ArrayData::Float4(_) => ElementType::Float4,
            ArrayData::Float8(_) => ElementType::Float8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Int8(v) => v.len(),
            ArrayData::Int2(v) => v.len(),
            ArrayData::Int4(v) => v.len(),
            ArrayData::Text(v) => v.len(),
            ArrayData::Float4(v) => v.len(),
            ArrayData::Float8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// View `arr` as `f32` values.
///
/// `float4` input is returned as-is without copying; `int4` input is widened
/// into a new buffer. Any other element type is rejected before any output
/// is produced.
pub fn to_float4_array<'a>(arr: &ArrayData<'a>) -> Result<Cow<'a, [f32]>> {
    match *arr {
        ArrayData::Float4(values) => Ok(Cow::Borrowed(values)),
        ArrayData::Int4(values) => Ok(Cow::Owned(values.iter().map(|&v| v as f32).collect())),
        other => {
            let element_type = other.element_type();
            Err(LdbError::UnsupportedElementType {
                name: element_type.name(),
                oid: element_type.oid(),
            })
        }
    }
}

/// Like [`to_float4_array`], but also require `dimensions` elements.
/// A `dimensions` of 0 accepts any length.
pub fn to_float4_array_with_dims<'a>(
    arr: &ArrayData<'a>,
    dimensions: usize,
) -> Result<Cow<'a, [f32]>> {
    if dimensions != 0 && arr.len() != dimensions {
        return Err(LdbError::DimensionMismatch {
            expected: dimensions,
            actual: arr.len(),
        });
    }
    to_float4_array(arr)
}
