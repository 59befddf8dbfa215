//! Floating-point element types supported by the harness

use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::AddAssign;

use bytemuck::Pod;
use num_traits::Float;

use crate::device::{DataType, ScalarValue};

/// A real floating-point element that can be staged on an accelerator
///
/// Implemented for `f32` and `f64`. The associated [`DataType`] is the tag
/// passed to the device when binding buffers of this element type.
pub trait Element:
    Float + Pod + AddAssign + Sum + Debug + Display + Default + Send + Sync + 'static
{
    /// Device data-type tag for this element
    const DATA_TYPE: DataType;

    /// Wraps the value as a device scalar (alpha/beta)
    fn to_scalar(self) -> ScalarValue;
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    fn to_scalar(self) -> ScalarValue {
        ScalarValue::F32(self)
    }
}

impl Element for f64 {
    const DATA_TYPE: DataType = DataType::F64;

    fn to_scalar(self) -> ScalarValue {
        ScalarValue::F64(self)
    }
}
