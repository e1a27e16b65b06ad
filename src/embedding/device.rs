use std::fmt;
use std::str::FromStr;

use candle_core::Device;
use tracing::{debug, warn};

/// Where model weights should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use a compiled-in GPU backend when one is available, else CPU.
    #[default]
    Auto,
    /// Always run on CPU.
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "gpu" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown device '{other}' (expected 'auto' or 'cpu')")),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
        }
    }
}

/// Resolves a preference to a concrete device. Never fails: CPU is the floor.
pub fn select_device(preference: DevicePreference) -> Device {
    match preference {
        DevicePreference::Cpu => {
            debug!("CPU device requested");
            Device::Cpu
        }
        DevicePreference::Auto => accelerator().unwrap_or_else(|reason| {
            warn!(reason = %reason, "Falling back to CPU device");
            Device::Cpu
        }),
    }
}

#[allow(unused_mut)]
fn accelerator() -> Result<Device, String> {
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                tracing::info!("Using Metal GPU acceleration");
                return Ok(device);
            }
            Err(e) => failures.push(format!("metal failed: {e}")),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                tracing::info!("Using CUDA GPU acceleration");
                return Ok(device);
            }
            Err(e) => failures.push(format!("cuda failed: {e}")),
        }
    }

    if failures.is_empty() {
        Err("no GPU backend compiled".to_string())
    } else {
        Err(failures.join("; "))
    }
}
