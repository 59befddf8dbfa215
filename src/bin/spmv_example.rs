use std::process::ExitCode;

use anyhow::{Context, Result};

use spmv_bench::{run_fixed_example, HostDevice, SpmvAlgorithm};

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = HostDevice::new().context("initialising device")?;
    let outcome = run_fixed_example(&device, SpmvAlgorithm::default())?;

    println!("Device:   {}", outcome.device_name);
    println!("Computed: {:?}", outcome.computed);
    println!("Expected: {:?}", outcome.expected);

    match outcome.first_mismatch {
        None => {
            println!("PASSED");
            Ok(ExitCode::SUCCESS)
        }
        Some(i) => {
            println!(
                "FAILED at index {}: expected {}, got {}",
                i, outcome.expected[i], outcome.computed[i]
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
