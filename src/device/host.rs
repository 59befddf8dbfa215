//! In-process accelerator backed by host memory and a rayon thread pool
//!
//! `HostDevice` behaves like a discrete device from the harness's point of
//! view: data only reaches it through explicit copies into its own aligned
//! allocations, matrices and vectors are referenced through descriptors, and
//! the multiply runs on a dedicated pool of worker threads rather than on the
//! calling thread.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use aligned_vec::AVec;
use bytemuck::Pod;
use log::debug;
use num_traits::NumCast;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::constants::{ADAPTIVE_BLOCK_NNZ, ADAPTIVE_BOUNDARY_BYTES, DEVICE_BUFFER_ALIGNMENT};
use crate::device::{
    BufferId, CsrLayout, DataType, DescriptorId, HandleId, ScalarValue, SparseDevice,
    SpmvAlgorithm, SpmvArgs,
};
use crate::element::Element;
use crate::error::DeviceError;

/// Parameters of a [`HostDevice`]
#[derive(Debug, Clone)]
pub struct HostDeviceConfig {
    /// Number of worker threads executing kernels
    pub n_threads: usize,
    /// Total bytes that may be allocated at once; `None` is unlimited
    pub memory_limit: Option<usize>,
}

impl Default for HostDeviceConfig {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
            memory_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Descriptor {
    Csr(CsrLayout),
    DnVec {
        len: usize,
        values: BufferId,
        data_type: DataType,
    },
}

#[derive(Default)]
struct DeviceState {
    next_id: u64,
    handles: HashSet<HandleId>,
    buffers: HashMap<BufferId, AVec<u8>>,
    descriptors: HashMap<DescriptorId, Descriptor>,
    allocated: usize,
}

impl DeviceState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_handle(&self, handle: HandleId) -> Result<(), DeviceError> {
        if self.handles.contains(&handle) {
            Ok(())
        } else {
            Err(DeviceError::InvalidHandle(handle))
        }
    }

    fn buffer(&self, id: BufferId) -> Result<&AVec<u8>, DeviceError> {
        self.buffers.get(&id).ok_or(DeviceError::InvalidBuffer(id))
    }

    fn csr(&self, id: DescriptorId) -> Result<CsrLayout, DeviceError> {
        match self.descriptors.get(&id) {
            Some(Descriptor::Csr(layout)) => Ok(*layout),
            _ => Err(DeviceError::InvalidDescriptor(id)),
        }
    }

    fn dnvec(&self, id: DescriptorId) -> Result<(usize, BufferId, DataType), DeviceError> {
        match self.descriptors.get(&id) {
            Some(&Descriptor::DnVec {
                len,
                values,
                data_type,
            }) => Ok((len, values, data_type)),
            _ => Err(DeviceError::InvalidDescriptor(id)),
        }
    }

    /// Checks that `id` exists and holds at least `bytes` bytes
    fn require_capacity(&self, id: BufferId, bytes: usize) -> Result<(), DeviceError> {
        let actual = self.buffer(id)?.len();
        if actual < bytes {
            return Err(DeviceError::SizeMismatch {
                expected: bytes,
                actual,
            });
        }
        Ok(())
    }
}

/// Operands of one SpMV call after descriptor lookup and type checks
struct Operands {
    layout: CsrLayout,
    x: BufferId,
    y: BufferId,
}

/// A simulated accelerator executing on host threads
pub struct HostDevice {
    config: HostDeviceConfig,
    pool: ThreadPool,
    state: Mutex<DeviceState>,
}

impl HostDevice {
    /// Creates a device using every available core
    pub fn new() -> Result<Self, DeviceError> {
        Self::with_config(HostDeviceConfig::default())
    }

    pub fn with_config(config: HostDeviceConfig) -> Result<Self, DeviceError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.n_threads.max(1))
            .thread_name(|i| format!("spmv-device-{}", i))
            .build()
            .map_err(|e| DeviceError::Init(e.to_string()))?;

        Ok(Self {
            config,
            pool,
            state: Mutex::new(DeviceState::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of handles not yet destroyed
    pub fn live_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Number of buffers not yet freed
    pub fn live_buffers(&self) -> usize {
        self.state().buffers.len()
    }

    /// Number of descriptors not yet destroyed
    pub fn live_descriptors(&self) -> usize {
        self.state().descriptors.len()
    }

    /// Bytes currently allocated
    pub fn allocated_bytes(&self) -> usize {
        self.state().allocated
    }

    fn resolve(
        state: &DeviceState,
        handle: HandleId,
        args: &SpmvArgs,
    ) -> Result<Operands, DeviceError> {
        state.check_handle(handle)?;
        let layout = state.csr(args.matrix)?;
        let (x_len, x, x_type) = state.dnvec(args.x)?;
        let (y_len, y, y_type) = state.dnvec(args.y)?;

        for found in [
            layout.data_type,
            x_type,
            y_type,
            args.alpha.data_type(),
            args.beta.data_type(),
        ] {
            if found != args.compute_type {
                return Err(DeviceError::TypeMismatch {
                    expected: args.compute_type,
                    found,
                });
            }
        }

        if x_len != layout.cols {
            return Err(DeviceError::DimensionMismatch(format!(
                "x has {} entries, matrix has {} columns",
                x_len, layout.cols
            )));
        }
        if y_len != layout.rows {
            return Err(DeviceError::DimensionMismatch(format!(
                "y has {} entries, matrix has {} rows",
                y_len, layout.rows
            )));
        }

        Ok(Operands { layout, x, y })
    }

    fn workspace_size(
        state: &DeviceState,
        layout: &CsrLayout,
        algorithm: SpmvAlgorithm,
    ) -> Result<usize, DeviceError> {
        match algorithm {
            SpmvAlgorithm::RowSplit => Ok(0),
            SpmvAlgorithm::Adaptive => {
                let row_ptr: &[u32] = typed_slice(state.buffer(layout.row_ptr)?, layout.rows + 1)?;
                Ok(row_blocks(row_ptr, ADAPTIVE_BLOCK_NNZ).len() * ADAPTIVE_BOUNDARY_BYTES)
            }
        }
    }

    fn execute<T: Element>(
        &self,
        state: &DeviceState,
        ops: &Operands,
        args: &SpmvArgs,
        scratch: &mut [u8],
    ) -> Result<Vec<T>, DeviceError> {
        let layout = &ops.layout;
        let row_ptr: &[u32] = typed_slice(state.buffer(layout.row_ptr)?, layout.rows + 1)?;
        let col_idx: &[u32] = typed_slice(state.buffer(layout.col_idx)?, layout.nnz)?;
        let values: &[T] = typed_slice(state.buffer(layout.values)?, layout.nnz)?;
        let x: &[T] = typed_slice(state.buffer(ops.x)?, layout.cols)?;
        check_structure(row_ptr, col_idx, layout)?;

        let alpha: T = scalar(args.alpha)?;
        let beta: T = scalar(args.beta)?;
        // beta == 0 means y is write-only, so stale contents (even NaN) never leak in
        let y_old: Option<&[T]> = if beta == T::zero() {
            None
        } else {
            Some(typed_slice(state.buffer(ops.y)?, layout.rows)?)
        };

        let row_value = |r: usize| -> T {
            let mut sum = T::zero();
            for k in row_ptr[r] as usize..row_ptr[r + 1] as usize {
                sum += values[k] * x[col_idx[k] as usize];
            }
            match y_old {
                Some(y) => alpha * sum + beta * y[r],
                None => alpha * sum,
            }
        };

        let mut y = vec![T::zero(); layout.rows];

        match args.algorithm {
            SpmvAlgorithm::RowSplit => self.pool.install(|| {
                y.par_iter_mut()
                    .enumerate()
                    .for_each(|(r, out)| *out = row_value(r));
            }),
            SpmvAlgorithm::Adaptive => {
                let slots: &mut [u32] = bytemuck::try_cast_slice_mut(scratch)
                    .map_err(|e| DeviceError::InvalidMatrix(format!("workspace: {}", e)))?;
                slots.copy_from_slice(&row_blocks(row_ptr, ADAPTIVE_BLOCK_NNZ));
                let bounds: &[u32] = slots;

                let mut blocks = Vec::with_capacity(bounds.len().saturating_sub(1));
                let mut rest = y.as_mut_slice();
                for w in bounds.windows(2) {
                    let (head, tail) = std::mem::take(&mut rest).split_at_mut((w[1] - w[0]) as usize);
                    blocks.push((w[0] as usize, head));
                    rest = tail;
                }
                debug!("adaptive SpMV over {} row blocks", blocks.len());

                self.pool.install(|| {
                    blocks.into_par_iter().for_each(|(first, block)| {
                        for (i, out) in block.iter_mut().enumerate() {
                            *out = row_value(first + i);
                        }
                    });
                });
            }
        }

        Ok(y)
    }
}

impl SparseDevice for HostDevice {
    fn name(&self) -> String {
        format!("Host SpMV device ({} threads)", self.pool.current_num_threads())
    }

    fn create_handle(&self) -> Result<HandleId, DeviceError> {
        let mut state = self.state();
        let id = HandleId(state.next_id());
        state.handles.insert(id);
        Ok(id)
    }

    fn destroy_handle(&self, handle: HandleId) -> Result<(), DeviceError> {
        if self.state().handles.remove(&handle) {
            Ok(())
        } else {
            Err(DeviceError::InvalidHandle(handle))
        }
    }

    fn malloc(&self, bytes: usize) -> Result<BufferId, DeviceError> {
        let mut state = self.state();
        if let Some(limit) = self.config.memory_limit {
            let available = limit.saturating_sub(state.allocated);
            if bytes > available {
                return Err(DeviceError::OutOfMemory {
                    requested: bytes,
                    available,
                });
            }
        }

        let id = BufferId(state.next_id());
        let buffer = AVec::from_iter(DEVICE_BUFFER_ALIGNMENT, std::iter::repeat(0u8).take(bytes));
        state.buffers.insert(id, buffer);
        state.allocated += bytes;
        debug!("malloc {:?}: {} bytes", id, bytes);
        Ok(id)
    }

    fn free(&self, buffer: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state();
        let freed = state
            .buffers
            .remove(&buffer)
            .ok_or(DeviceError::InvalidBuffer(buffer))?;
        state.allocated -= freed.len();
        Ok(())
    }

    fn copy_to_device(&self, dst: BufferId, src: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.state();
        let buffer = state
            .buffers
            .get_mut(&dst)
            .ok_or(DeviceError::InvalidBuffer(dst))?;
        if src.len() > buffer.len() {
            return Err(DeviceError::SizeMismatch {
                expected: buffer.len(),
                actual: src.len(),
            });
        }
        buffer[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_to_host(&self, dst: &mut [u8], src: BufferId) -> Result<(), DeviceError> {
        let state = self.state();
        let buffer = state.buffer(src)?;
        if dst.len() > buffer.len() {
            return Err(DeviceError::SizeMismatch {
                expected: buffer.len(),
                actual: dst.len(),
            });
        }
        dst.copy_from_slice(&buffer[..dst.len()]);
        Ok(())
    }

    fn create_csr_descr(&self, layout: &CsrLayout) -> Result<DescriptorId, DeviceError> {
        let max_index = u32::MAX as usize;
        for extent in [layout.rows, layout.cols, layout.nnz] {
            if extent > max_index {
                return Err(DeviceError::IndexOverflow(extent));
            }
        }

        let index_bytes = std::mem::size_of::<u32>();
        let mut state = self.state();
        state.require_capacity(layout.row_ptr, (layout.rows + 1) * index_bytes)?;
        state.require_capacity(layout.col_idx, layout.nnz * index_bytes)?;
        state.require_capacity(layout.values, layout.nnz * layout.data_type.size_bytes())?;

        let id = DescriptorId(state.next_id());
        state.descriptors.insert(id, Descriptor::Csr(*layout));
        Ok(id)
    }

    fn destroy_spmat_descr(&self, descr: DescriptorId) -> Result<(), DeviceError> {
        let mut state = self.state();
        state.csr(descr)?;
        state.descriptors.remove(&descr);
        Ok(())
    }

    fn create_dnvec_descr(
        &self,
        len: usize,
        values: BufferId,
        data_type: DataType,
    ) -> Result<DescriptorId, DeviceError> {
        let mut state = self.state();
        state.require_capacity(values, len * data_type.size_bytes())?;

        let id = DescriptorId(state.next_id());
        state.descriptors.insert(
            id,
            Descriptor::DnVec {
                len,
                values,
                data_type,
            },
        );
        Ok(id)
    }

    fn destroy_dnvec_descr(&self, descr: DescriptorId) -> Result<(), DeviceError> {
        let mut state = self.state();
        state.dnvec(descr)?;
        state.descriptors.remove(&descr);
        Ok(())
    }

    fn spmv_buffer_size(&self, handle: HandleId, args: &SpmvArgs) -> Result<usize, DeviceError> {
        let state = self.state();
        let ops = Self::resolve(&state, handle, args)?;
        Self::workspace_size(&state, &ops.layout, args.algorithm)
    }

    fn spmv(
        &self,
        handle: HandleId,
        args: &SpmvArgs,
        workspace: BufferId,
    ) -> Result<(), DeviceError> {
        let mut state = self.state();
        let ops = Self::resolve(&state, handle, args)?;

        let required = Self::workspace_size(&state, &ops.layout, args.algorithm)?;
        let provided = state.buffer(workspace)?.len();
        if provided < required {
            return Err(DeviceError::WorkspaceTooSmall { required, provided });
        }
        let operands = [
            ops.layout.row_ptr,
            ops.layout.col_idx,
            ops.layout.values,
            ops.x,
            ops.y,
        ];
        if operands.contains(&workspace) {
            return Err(DeviceError::InvalidBuffer(workspace));
        }

        // Taken out of the table so the kernel can write it while reading the operands
        let mut scratch = state
            .buffers
            .remove(&workspace)
            .ok_or(DeviceError::InvalidBuffer(workspace))?;
        let result = match args.compute_type {
            DataType::F32 => self
                .execute::<f32>(&state, &ops, args, &mut scratch[..required])
                .map(|y| bytemuck::cast_slice::<f32, u8>(&y).to_vec()),
            DataType::F64 => self
                .execute::<f64>(&state, &ops, args, &mut scratch[..required])
                .map(|y| bytemuck::cast_slice::<f64, u8>(&y).to_vec()),
        };
        state.buffers.insert(workspace, scratch);
        let y_bytes = result?;

        let y = state
            .buffers
            .get_mut(&ops.y)
            .ok_or(DeviceError::InvalidBuffer(ops.y))?;
        y[..y_bytes.len()].copy_from_slice(&y_bytes);
        Ok(())
    }
}

/// Splits rows into consecutive blocks of roughly `target_nnz` nonzeros
///
/// Returns the block boundaries: first entry 0, last entry the row count,
/// strictly increasing in between. A row longer than the target forms a
/// block on its own.
pub fn row_blocks(row_ptr: &[u32], target_nnz: usize) -> Vec<u32> {
    let rows = row_ptr.len().saturating_sub(1);
    let mut bounds = vec![0u32];
    let mut start = 0usize;

    for r in 0..rows {
        let block_nnz = row_ptr[r + 1].saturating_sub(row_ptr[start]) as usize;
        if block_nnz >= target_nnz {
            bounds.push((r + 1) as u32);
            start = r + 1;
        }
    }
    if start < rows {
        bounds.push(rows as u32);
    }

    bounds
}

fn typed_slice<T: Pod>(buffer: &[u8], count: usize) -> Result<&[T], DeviceError> {
    let bytes = count * std::mem::size_of::<T>();
    if buffer.len() < bytes {
        return Err(DeviceError::SizeMismatch {
            expected: bytes,
            actual: buffer.len(),
        });
    }
    bytemuck::try_cast_slice(&buffer[..bytes]).map_err(|e| DeviceError::InvalidMatrix(e.to_string()))
}

fn check_structure(row_ptr: &[u32], col_idx: &[u32], layout: &CsrLayout) -> Result<(), DeviceError> {
    if row_ptr[0] != 0 || row_ptr[layout.rows] as usize != layout.nnz {
        return Err(DeviceError::InvalidMatrix(format!(
            "row_ptr spans {}..{}, expected 0..{}",
            row_ptr[0], row_ptr[layout.rows], layout.nnz
        )));
    }
    if let Some(row) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
        return Err(DeviceError::InvalidMatrix(format!("row_ptr decreases at row {}", row)));
    }
    if let Some(&col) = col_idx.iter().find(|&&c| c as usize >= layout.cols) {
        return Err(DeviceError::InvalidMatrix(format!(
            "column index {} out of bounds ({} columns)",
            col, layout.cols
        )));
    }
    Ok(())
}

fn scalar<T: Element>(value: ScalarValue) -> Result<T, DeviceError> {
    <T as NumCast>::from(value.as_f64()).ok_or(DeviceError::TypeMismatch {
        expected: T::DATA_TYPE,
        found: value.data_type(),
    })
}
