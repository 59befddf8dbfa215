//! Scoped ownership of device resources
//!
//! Each wrapper releases its resource when dropped, so every exit path of a
//! run (including early `?` returns) gives memory and handles back to the
//! device. Release failures are logged; they cannot be propagated from
//! `drop`.

use bytemuck::Pod;
use log::warn;

use crate::device::{BufferId, CsrLayout, DataType, DescriptorId, HandleId, SparseDevice};
use crate::error::DeviceError;

/// A compute-context handle
pub struct DeviceHandle<'d, D: SparseDevice + ?Sized> {
    device: &'d D,
    id: HandleId,
}

impl<'d, D: SparseDevice + ?Sized> DeviceHandle<'d, D> {
    pub fn create(device: &'d D) -> Result<Self, DeviceError> {
        let id = device.create_handle()?;
        Ok(Self { device, id })
    }

    pub fn id(&self) -> HandleId {
        self.id
    }
}

impl<D: SparseDevice + ?Sized> Drop for DeviceHandle<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_handle(self.id) {
            warn!("failed to destroy handle {:?}: {}", self.id, err);
        }
    }
}

/// A linear device allocation of a fixed byte length
pub struct DeviceBuffer<'d, D: SparseDevice + ?Sized> {
    device: &'d D,
    id: BufferId,
    len: usize,
}

impl<'d, D: SparseDevice + ?Sized> DeviceBuffer<'d, D> {
    /// Allocates exactly `len` bytes
    pub fn alloc(device: &'d D, len: usize) -> Result<Self, DeviceError> {
        let id = device.malloc(len)?;
        Ok(Self { device, id, len })
    }

    /// Allocates room for `count` elements of `T`
    pub fn alloc_for<T: Pod>(device: &'d D, count: usize) -> Result<Self, DeviceError> {
        Self::alloc(device, count * std::mem::size_of::<T>())
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies a host slice that exactly fills the buffer
    pub fn upload<T: Pod>(&self, src: &[T]) -> Result<(), DeviceError> {
        let bytes: &[u8] = bytemuck::cast_slice(src);
        if bytes.len() != self.len {
            return Err(DeviceError::SizeMismatch {
                expected: self.len,
                actual: bytes.len(),
            });
        }
        self.device.copy_to_device(self.id, bytes)
    }

    /// Copies the whole buffer into a host slice of the same byte length
    pub fn download<T: Pod>(&self, dst: &mut [T]) -> Result<(), DeviceError> {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
        if bytes.len() != self.len {
            return Err(DeviceError::SizeMismatch {
                expected: self.len,
                actual: bytes.len(),
            });
        }
        self.device.copy_to_host(bytes, self.id)
    }
}

impl<D: SparseDevice + ?Sized> Drop for DeviceBuffer<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.device.free(self.id) {
            warn!("failed to free buffer {:?}: {}", self.id, err);
        }
    }
}

/// A sparse matrix descriptor bound to device-resident CSR arrays
pub struct SpMatDescr<'d, D: SparseDevice + ?Sized> {
    device: &'d D,
    id: DescriptorId,
}

impl<'d, D: SparseDevice + ?Sized> SpMatDescr<'d, D> {
    pub fn create_csr(device: &'d D, layout: &CsrLayout) -> Result<Self, DeviceError> {
        let id = device.create_csr_descr(layout)?;
        Ok(Self { device, id })
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }
}

impl<D: SparseDevice + ?Sized> Drop for SpMatDescr<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_spmat_descr(self.id) {
            warn!("failed to destroy matrix descriptor {:?}: {}", self.id, err);
        }
    }
}

/// A dense vector descriptor bound to a device buffer
pub struct DnVecDescr<'d, D: SparseDevice + ?Sized> {
    device: &'d D,
    id: DescriptorId,
}

impl<'d, D: SparseDevice + ?Sized> DnVecDescr<'d, D> {
    pub fn create(
        device: &'d D,
        len: usize,
        values: &DeviceBuffer<'d, D>,
        data_type: DataType,
    ) -> Result<Self, DeviceError> {
        let id = device.create_dnvec_descr(len, values.id(), data_type)?;
        Ok(Self { device, id })
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }
}

impl<D: SparseDevice + ?Sized> Drop for DnVecDescr<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_dnvec_descr(self.id) {
            warn!("failed to destroy vector descriptor {:?}: {}", self.id, err);
        }
    }
}
