//! Integration tests for device dispatch and resource release

use spmv_bench::device::{DeviceBuffer, DeviceHandle, DnVecDescr, SpMatDescr};
use spmv_bench::device::{CsrLayout, SpmvArgs};
use spmv_bench::{
    accelerated_spmv, generate_vector, reference_spmv, AcceleratedSpmv, DataType, DeviceError,
    Element, HostDevice, HostDeviceConfig, SparseDevice, SparseMatrixCSR, SpmvAlgorithm,
};

fn device_with_limit(memory_limit: Option<usize>) -> HostDevice {
    HostDevice::with_config(HostDeviceConfig {
        n_threads: 4,
        memory_limit,
    })
    .unwrap()
}

fn assert_released(device: &HostDevice) {
    assert_eq!(device.live_handles(), 0, "handles leaked");
    assert_eq!(device.live_buffers(), 0, "buffers leaked");
    assert_eq!(device.live_descriptors(), 0, "descriptors leaked");
    assert_eq!(device.allocated_bytes(), 0);
}

/// Rows of wildly different lengths, so adaptive blocks are uneven
fn create_skewed_matrix(n: usize) -> SparseMatrixCSR<f64> {
    let mut row_ptr = vec![0];
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    for i in 0..n {
        let len = match i % 50 {
            0 => n,
            1..=9 => 0,
            _ => 1 + i % 5,
        };
        let stride = (n / len.max(1)).max(1);
        for j in (0..n).step_by(stride).take(len) {
            col_idx.push(j);
            values.push(1.0 + (i + j) as f64 * 1e-3);
        }
        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::new(n, n, row_ptr, col_idx, values)
}

#[test]
fn test_algorithms_agree_with_reference() {
    let device = device_with_limit(None);
    let a = create_skewed_matrix(3000);
    let x: Vec<f64> = generate_vector(3000, 54321);
    let y_ref = reference_spmv(&a, &x);

    for algorithm in [SpmvAlgorithm::Adaptive, SpmvAlgorithm::RowSplit] {
        let y = accelerated_spmv(&device, &a, &x, algorithm).unwrap();
        // Each row is summed in the same order as the reference
        assert_eq!(y, y_ref, "{:?}", algorithm);
    }
    assert_released(&device);
}

#[test]
fn test_single_precision() {
    let device = device_with_limit(None);
    let a = SparseMatrixCSR::new(
        3,
        3,
        vec![0, 2, 3, 5],
        vec![0, 2, 1, 0, 2],
        vec![0.5f32, 1.5, 2.0, -1.0, 4.0],
    );
    let x = [2.0f32, 3.0, 0.25];

    let y = accelerated_spmv(&device, &a, &x, SpmvAlgorithm::Adaptive).unwrap();
    assert_eq!(y, reference_spmv(&a, &x));
}

#[test]
fn test_out_of_memory_releases_everything() {
    let a = create_skewed_matrix(500);
    // Enough for the handle and some buffers, not for all five
    let device = device_with_limit(Some(a.nnz() * 8));

    let result = AcceleratedSpmv::new(&device, &a, SpmvAlgorithm::Adaptive);
    assert!(matches!(result, Err(DeviceError::OutOfMemory { .. })));
    assert_released(&device);
}

#[test]
fn test_workspace_allocation_failure_releases_everything() {
    let a = SparseMatrixCSR::<f32>::identity(16);
    // Exactly the five staged arrays, nothing left for the workspace
    let staged = 17 * 4 + 16 * 4 + 16 * 4 + 16 * 4 + 16 * 4;
    let device = device_with_limit(Some(staged));

    let mut y = vec![0.0f32; 16];
    {
        let spmv = AcceleratedSpmv::new(&device, &a, SpmvAlgorithm::Adaptive).unwrap();
        assert!(matches!(
            spmv.run(&[1.0; 16], &mut y),
            Err(DeviceError::OutOfMemory { .. })
        ));
    }
    assert_released(&device);

    // RowSplit needs no workspace and fits
    {
        let spmv = AcceleratedSpmv::new(&device, &a, SpmvAlgorithm::RowSplit).unwrap();
        spmv.run(&[1.0; 16], &mut y).unwrap();
        assert_eq!(y, vec![1.0; 16]);
    }
    assert_released(&device);
}

fn stage<'d, T: Element>(
    device: &'d HostDevice,
    a: &SparseMatrixCSR<T>,
) -> (DeviceBuffer<'d, HostDevice>, DeviceBuffer<'d, HostDevice>, DeviceBuffer<'d, HostDevice>) {
    let row_ptr: Vec<u32> = a.row_ptr.iter().map(|&p| p as u32).collect();
    let col_idx: Vec<u32> = a.col_idx.iter().map(|&c| c as u32).collect();

    let row_ptr_buf = DeviceBuffer::alloc_for::<u32>(device, row_ptr.len()).unwrap();
    let col_idx_buf = DeviceBuffer::alloc_for::<u32>(device, col_idx.len()).unwrap();
    let values_buf = DeviceBuffer::alloc_for::<T>(device, a.nnz()).unwrap();
    row_ptr_buf.upload(&row_ptr).unwrap();
    col_idx_buf.upload(&col_idx).unwrap();
    values_buf.upload(&a.values).unwrap();

    (row_ptr_buf, col_idx_buf, values_buf)
}

#[test]
fn test_two_phase_spmv_with_alpha_beta() {
    let device = device_with_limit(None);
    let a = SparseMatrixCSR::new(
        2,
        2,
        vec![0, 2, 3],
        vec![0, 1, 1],
        vec![1.0f64, 2.0, 3.0],
    );

    {
        let handle = DeviceHandle::create(&device).unwrap();
        let (row_ptr, col_idx, values) = stage(&device, &a);
        let layout = CsrLayout {
            rows: 2,
            cols: 2,
            nnz: 3,
            row_ptr: row_ptr.id(),
            col_idx: col_idx.id(),
            values: values.id(),
            data_type: DataType::F64,
        };
        let mat = SpMatDescr::create_csr(&device, &layout).unwrap();

        let x_buf = DeviceBuffer::alloc_for::<f64>(&device, 2).unwrap();
        let y_buf = DeviceBuffer::alloc_for::<f64>(&device, 2).unwrap();
        x_buf.upload(&[1.0f64, 1.0]).unwrap();
        y_buf.upload(&[10.0f64, 20.0]).unwrap();
        let x = DnVecDescr::create(&device, 2, &x_buf, DataType::F64).unwrap();
        let y = DnVecDescr::create(&device, 2, &y_buf, DataType::F64).unwrap();

        for algorithm in [SpmvAlgorithm::Adaptive, SpmvAlgorithm::RowSplit] {
            y_buf.upload(&[10.0f64, 20.0]).unwrap();
            let args = SpmvArgs {
                alpha: 2.0f64.to_scalar(),
                matrix: mat.id(),
                x: x.id(),
                beta: 0.5f64.to_scalar(),
                y: y.id(),
                compute_type: DataType::F64,
                algorithm,
            };

            let size = device.spmv_buffer_size(handle.id(), &args).unwrap();
            let workspace = DeviceBuffer::alloc(&device, size).unwrap();
            device.spmv(handle.id(), &args, workspace.id()).unwrap();

            let mut out = [0.0f64; 2];
            y_buf.download(&mut out).unwrap();
            // 2 * [3, 3] + 0.5 * [10, 20]
            assert_eq!(out, [11.0, 16.0]);
        }
    }
    assert_released(&device);
}

#[test]
fn test_spmv_rejects_bad_arguments() {
    let device = device_with_limit(None);
    let a = SparseMatrixCSR::<f32>::identity(4);

    let handle = DeviceHandle::create(&device).unwrap();
    let (row_ptr, col_idx, values) = stage(&device, &a);
    let layout = CsrLayout {
        rows: 4,
        cols: 4,
        nnz: 4,
        row_ptr: row_ptr.id(),
        col_idx: col_idx.id(),
        values: values.id(),
        data_type: DataType::F32,
    };
    let mat = SpMatDescr::create_csr(&device, &layout).unwrap();
    let x_buf = DeviceBuffer::alloc_for::<f32>(&device, 4).unwrap();
    let y_buf = DeviceBuffer::alloc_for::<f32>(&device, 4).unwrap();
    let x = DnVecDescr::create(&device, 4, &x_buf, DataType::F32).unwrap();
    let y = DnVecDescr::create(&device, 4, &y_buf, DataType::F32).unwrap();
    let short_y = DnVecDescr::create(&device, 3, &y_buf, DataType::F32).unwrap();

    let args = SpmvArgs {
        alpha: 1.0f32.to_scalar(),
        matrix: mat.id(),
        x: x.id(),
        beta: 0.0f32.to_scalar(),
        y: y.id(),
        compute_type: DataType::F32,
        algorithm: SpmvAlgorithm::Adaptive,
    };

    let size = device.spmv_buffer_size(handle.id(), &args).unwrap();
    assert!(size > 0);

    let too_small = DeviceBuffer::alloc(&device, size - 1).unwrap();
    assert!(matches!(
        device.spmv(handle.id(), &args, too_small.id()),
        Err(DeviceError::WorkspaceTooSmall { .. })
    ));

    let workspace = DeviceBuffer::alloc(&device, size).unwrap();
    let wrong_type = SpmvArgs {
        alpha: 1.0f64.to_scalar(),
        ..args
    };
    assert!(matches!(
        device.spmv(handle.id(), &wrong_type, workspace.id()),
        Err(DeviceError::TypeMismatch { .. })
    ));

    let wrong_dim = SpmvArgs {
        y: short_y.id(),
        ..args
    };
    assert!(matches!(
        device.spmv(handle.id(), &wrong_dim, workspace.id()),
        Err(DeviceError::DimensionMismatch(_))
    ));

    let swapped = SpmvArgs {
        matrix: x.id(),
        ..args
    };
    assert!(matches!(
        device.spmv(handle.id(), &swapped, workspace.id()),
        Err(DeviceError::InvalidDescriptor(_))
    ));

    assert!(device.spmv(handle.id(), &args, workspace.id()).is_ok());
}

#[test]
fn test_corrupted_device_matrix_rejected() {
    let device = device_with_limit(None);
    let a = SparseMatrixCSR::<f64>::identity(3);

    let handle = DeviceHandle::create(&device).unwrap();
    let (row_ptr, col_idx, values) = stage(&device, &a);
    col_idx.upload(&[0u32, 7, 2]).unwrap();

    let layout = CsrLayout {
        rows: 3,
        cols: 3,
        nnz: 3,
        row_ptr: row_ptr.id(),
        col_idx: col_idx.id(),
        values: values.id(),
        data_type: DataType::F64,
    };
    let mat = SpMatDescr::create_csr(&device, &layout).unwrap();
    let x_buf = DeviceBuffer::alloc_for::<f64>(&device, 3).unwrap();
    let y_buf = DeviceBuffer::alloc_for::<f64>(&device, 3).unwrap();
    let x = DnVecDescr::create(&device, 3, &x_buf, DataType::F64).unwrap();
    let y = DnVecDescr::create(&device, 3, &y_buf, DataType::F64).unwrap();

    let args = SpmvArgs {
        alpha: 1.0f64.to_scalar(),
        matrix: mat.id(),
        x: x.id(),
        beta: 0.0f64.to_scalar(),
        y: y.id(),
        compute_type: DataType::F64,
        algorithm: SpmvAlgorithm::RowSplit,
    };
    let workspace = DeviceBuffer::alloc(&device, 0).unwrap();
    assert!(matches!(
        device.spmv(handle.id(), &args, workspace.id()),
        Err(DeviceError::InvalidMatrix(_))
    ));
}

#[test]
fn test_device_name() {
    let device = device_with_limit(None);
    assert!(device.name().contains("4 threads"));
}
