//! Accelerated SpMV: staging, compute and retrieval on a [`SparseDevice`]

use log::debug;

use crate::device::resource::{DeviceBuffer, DeviceHandle, DnVecDescr, SpMatDescr};
use crate::device::{CsrLayout, SparseDevice, SpmvAlgorithm, SpmvArgs};
use crate::element::Element;
use crate::error::DeviceError;
use crate::matrix::SparseMatrixCSR;

fn to_device_indices(indices: &[usize]) -> Result<Vec<u32>, DeviceError> {
    indices
        .iter()
        .map(|&i| u32::try_from(i).map_err(|_| DeviceError::IndexOverflow(i)))
        .collect()
}

/// Computes `y = A * x` for one matrix on a device
///
/// Construction allocates the device buffers and binds the matrix and
/// vector descriptors once. Each [`run`](Self::run) then copies every array
/// to the device again, queries and allocates the scratch workspace, runs
/// the multiply and copies `y` back, so a timed run covers the whole
/// transfer/compute/retrieve cycle.
///
/// All device resources are released when the value is dropped.
pub struct AcceleratedSpmv<'a, D: SparseDevice + ?Sized, T: Element> {
    // Field order is drop order: descriptors, then the buffers they bind, then the handle
    mat_descr: SpMatDescr<'a, D>,
    x_descr: DnVecDescr<'a, D>,
    y_descr: DnVecDescr<'a, D>,
    row_ptr_buf: DeviceBuffer<'a, D>,
    col_idx_buf: DeviceBuffer<'a, D>,
    values_buf: DeviceBuffer<'a, D>,
    x_buf: DeviceBuffer<'a, D>,
    y_buf: DeviceBuffer<'a, D>,
    handle: DeviceHandle<'a, D>,
    device: &'a D,
    matrix: &'a SparseMatrixCSR<T>,
    row_ptr: Vec<u32>,
    col_idx: Vec<u32>,
    algorithm: SpmvAlgorithm,
}

impl<'a, D: SparseDevice + ?Sized, T: Element> AcceleratedSpmv<'a, D, T> {
    pub fn new(
        device: &'a D,
        matrix: &'a SparseMatrixCSR<T>,
        algorithm: SpmvAlgorithm,
    ) -> Result<Self, DeviceError> {
        let row_ptr = to_device_indices(&matrix.row_ptr)?;
        let col_idx = to_device_indices(&matrix.col_idx)?;
        let n_rows = matrix.n_rows;
        let n_cols = matrix.n_cols;
        let nnz = matrix.nnz();

        let handle = DeviceHandle::create(device)?;
        let row_ptr_buf = DeviceBuffer::alloc_for::<u32>(device, n_rows + 1)?;
        let col_idx_buf = DeviceBuffer::alloc_for::<u32>(device, nnz)?;
        let values_buf = DeviceBuffer::alloc_for::<T>(device, nnz)?;
        let x_buf = DeviceBuffer::alloc_for::<T>(device, n_cols)?;
        let y_buf = DeviceBuffer::alloc_for::<T>(device, n_rows)?;

        let layout = CsrLayout {
            rows: n_rows,
            cols: n_cols,
            nnz,
            row_ptr: row_ptr_buf.id(),
            col_idx: col_idx_buf.id(),
            values: values_buf.id(),
            data_type: T::DATA_TYPE,
        };
        let mat_descr = SpMatDescr::create_csr(device, &layout)?;
        let x_descr = DnVecDescr::create(device, n_cols, &x_buf, T::DATA_TYPE)?;
        let y_descr = DnVecDescr::create(device, n_rows, &y_buf, T::DATA_TYPE)?;

        debug!(
            "bound {}x{} matrix with {} nonzeros on {}",
            n_rows,
            n_cols,
            nnz,
            device.name()
        );

        Ok(Self {
            mat_descr,
            x_descr,
            y_descr,
            row_ptr_buf,
            col_idx_buf,
            values_buf,
            x_buf,
            y_buf,
            handle,
            device,
            matrix,
            row_ptr,
            col_idx,
            algorithm,
        })
    }

    pub fn device_name(&self) -> String {
        self.device.name()
    }

    pub fn algorithm(&self) -> SpmvAlgorithm {
        self.algorithm
    }

    /// Runs one full cycle, overwriting `y` with `A * x`
    pub fn run(&self, x: &[T], y: &mut [T]) -> Result<(), DeviceError> {
        if x.len() != self.matrix.n_cols {
            return Err(DeviceError::DimensionMismatch(format!(
                "x has {} entries, matrix has {} columns",
                x.len(),
                self.matrix.n_cols
            )));
        }
        if y.len() != self.matrix.n_rows {
            return Err(DeviceError::DimensionMismatch(format!(
                "y has {} entries, matrix has {} rows",
                y.len(),
                self.matrix.n_rows
            )));
        }

        self.row_ptr_buf.upload(&self.row_ptr)?;
        self.col_idx_buf.upload(&self.col_idx)?;
        self.values_buf.upload(&self.matrix.values)?;
        self.x_buf.upload(x)?;
        self.y_buf.upload(y)?;

        let args = SpmvArgs {
            alpha: T::one().to_scalar(),
            matrix: self.mat_descr.id(),
            x: self.x_descr.id(),
            beta: T::zero().to_scalar(),
            y: self.y_descr.id(),
            compute_type: T::DATA_TYPE,
            algorithm: self.algorithm,
        };

        let workspace_bytes = self.device.spmv_buffer_size(self.handle.id(), &args)?;
        debug!("SpMV workspace: {} bytes", workspace_bytes);
        let workspace = DeviceBuffer::alloc(self.device, workspace_bytes)?;

        self.device.spmv(self.handle.id(), &args, workspace.id())?;
        self.y_buf.download(y)
    }
}

/// One-shot accelerated multiply returning a fresh `y`
pub fn accelerated_spmv<D, T>(
    device: &D,
    matrix: &SparseMatrixCSR<T>,
    x: &[T],
    algorithm: SpmvAlgorithm,
) -> Result<Vec<T>, DeviceError>
where
    D: SparseDevice + ?Sized,
    T: Element,
{
    let spmv = AcceleratedSpmv::new(device, matrix, algorithm)?;
    let mut y = vec![T::zero(); matrix.n_rows];
    spmv.run(x, &mut y)?;
    Ok(y)
}
