//! Accelerator dispatch for sparse matrix-vector multiplication
//!
//! The accelerator runtime is an external collaborator. [`SparseDevice`]
//! captures exactly the calls the harness makes on it: a compute handle,
//! linear device buffers, host/device copies, opaque matrix and vector
//! descriptors, and the two-phase SpMV (workspace size query, then
//! execution). Every call is synchronous and fallible.
//!
//! [`HostDevice`] implements the trait in-process so the harness can run
//! end to end without vendor hardware. [`AcceleratedSpmv`] drives any
//! implementation through a full staging/compute/retrieve cycle with
//! scoped resource ownership.

pub mod accelerated;
pub mod host;
pub mod resource;

pub use accelerated::{accelerated_spmv, AcceleratedSpmv};
pub use host::{HostDevice, HostDeviceConfig};
pub use resource::{DeviceBuffer, DeviceHandle, DnVecDescr, SpMatDescr};

use crate::error::DeviceError;

/// Opaque compute-context handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// Opaque device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Opaque matrix or vector descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(pub u64);

/// Element data type of device buffers and of the computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    F32,
    F64,
}

impl DataType {
    /// Size of one element in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }
}

/// Host-side scalar passed by value to the device (alpha, beta)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::F32(_) => DataType::F32,
            ScalarValue::F64(_) => DataType::F64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::F32(v) => v as f64,
            ScalarValue::F64(v) => v,
        }
    }
}

/// SpMV algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpmvAlgorithm {
    /// Rows grouped into blocks of similar nonzero count; the block
    /// boundaries live in the scratch workspace
    #[default]
    Adaptive,
    /// One task per row, no workspace
    RowSplit,
}

/// Device-side layout of a CSR matrix with 32-bit indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrLayout {
    pub rows: usize,
    pub cols: usize,
    pub nnz: usize,
    pub row_ptr: BufferId,
    pub col_idx: BufferId,
    pub values: BufferId,
    pub data_type: DataType,
}

/// Operands of `y = alpha * A * x + beta * y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpmvArgs {
    pub alpha: ScalarValue,
    pub matrix: DescriptorId,
    pub x: DescriptorId,
    pub beta: ScalarValue,
    pub y: DescriptorId,
    pub compute_type: DataType,
    pub algorithm: SpmvAlgorithm,
}

/// The accelerator runtime as seen by the harness
///
/// Implementations are driven from a single host thread; every call blocks
/// until the device has finished the requested work.
pub trait SparseDevice {
    /// Human-readable device identification
    fn name(&self) -> String;

    fn create_handle(&self) -> Result<HandleId, DeviceError>;
    fn destroy_handle(&self, handle: HandleId) -> Result<(), DeviceError>;

    /// Allocates `bytes` of device memory
    fn malloc(&self, bytes: usize) -> Result<BufferId, DeviceError>;
    fn free(&self, buffer: BufferId) -> Result<(), DeviceError>;

    /// Copies `src` into the start of `dst`
    fn copy_to_device(&self, dst: BufferId, src: &[u8]) -> Result<(), DeviceError>;
    /// Copies the start of `src` into `dst`
    fn copy_to_host(&self, dst: &mut [u8], src: BufferId) -> Result<(), DeviceError>;

    fn create_csr_descr(&self, layout: &CsrLayout) -> Result<DescriptorId, DeviceError>;
    fn destroy_spmat_descr(&self, descr: DescriptorId) -> Result<(), DeviceError>;

    fn create_dnvec_descr(
        &self,
        len: usize,
        values: BufferId,
        data_type: DataType,
    ) -> Result<DescriptorId, DeviceError>;
    fn destroy_dnvec_descr(&self, descr: DescriptorId) -> Result<(), DeviceError>;

    /// Phase one: bytes of scratch workspace the multiply needs
    fn spmv_buffer_size(&self, handle: HandleId, args: &SpmvArgs) -> Result<usize, DeviceError>;

    /// Phase two: runs the multiply, writing into the `y` descriptor's buffer
    fn spmv(&self, handle: HandleId, args: &SpmvArgs, workspace: BufferId)
        -> Result<(), DeviceError>;
}
