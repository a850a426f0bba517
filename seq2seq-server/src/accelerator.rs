//! Accelerator detection.
//!
//! Probes the host once at startup and picks the device and numeric precision the
//! generation engine is asked to run on. No accelerator is a normal outcome.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Device the model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    Mps,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
        }
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric precision of the model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float32,
    Float16,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float32 => "float32",
            Precision::Float16 => "float16",
        }
    }
}

/// Configured device choice. `Auto` runs the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Cuda,
    Mps,
}

/// Result of the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accelerator {
    pub device: Device,
    pub precision: Precision,
}

impl Accelerator {
    /// Half precision on any accelerator, full precision on CPU.
    pub fn for_device(device: Device) -> Self {
        let precision = if device.is_accelerator() {
            Precision::Float16
        } else {
            Precision::Float32
        };
        Self { device, precision }
    }

    pub fn cpu() -> Self {
        Self::for_device(Device::Cpu)
    }
}

/// An NVIDIA GPU as reported by `nvidia-smi`.
#[derive(Debug, Clone, PartialEq)]
pub struct CudaDevice {
    pub name: String,
    pub compute_capability: String,
    pub free_gb: f64,
    pub total_gb: f64,
}

/// The integrated GPU of an Apple silicon machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AppleGpu {
    pub name: String,
    pub cores: Option<u32>,
}

/// Resolve the configured preference to a device, probing the host when `Auto`.
pub async fn select(preference: DevicePreference) -> Accelerator {
    let accelerator = match preference {
        DevicePreference::Auto => probe().await,
        DevicePreference::Cpu => Accelerator::cpu(),
        DevicePreference::Cuda => Accelerator::for_device(Device::Cuda),
        DevicePreference::Mps => Accelerator::for_device(Device::Mps),
    };

    tracing::info!(
        device = %accelerator.device,
        precision = accelerator.precision.as_str(),
        "Selected accelerator"
    );
    accelerator
}

/// Check for a GPU. An Apple GPU takes precedence over CUDA when both are reported.
pub async fn probe() -> Accelerator {
    let mut device = Device::Cpu;

    tracing::info!("Checking for the availability of a GPU...");
    if let Some(gpu) = probe_cuda().await {
        tracing::info!(
            "A GPU is available! [{} - {} - {:.2}/{:.2} GB VRAM]",
            gpu.name,
            gpu.compute_capability,
            gpu.free_gb,
            gpu.total_gb
        );
        device = Device::Cuda;
    }

    if cfg!(target_os = "macos") {
        if let Some(gpu) = probe_apple().await {
            let cores = gpu
                .cores
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::info!("Apple Device is available! [{} - {} Cores]", gpu.name, cores);
            device = Device::Mps;
        }
    }

    if device == Device::Cpu {
        tracing::info!("No accelerator found, running on CPU");
    }

    Accelerator::for_device(device)
}

async fn probe_cuda() -> Option<CudaDevice> {
    let output = run_command(
        "nvidia-smi",
        &[
            "--query-gpu=name,compute_cap,memory.free,memory.total",
            "--format=csv,noheader,nounits",
        ],
    )
    .await?;
    parse_nvidia_smi(&output)
}

async fn probe_apple() -> Option<AppleGpu> {
    if !cfg!(target_arch = "aarch64") {
        return None;
    }
    let output = run_command("system_profiler", &["SPDisplaysDataType"]).await?;
    parse_system_profiler(&output)
}

/// Run a probe command, treating any failure as "not present".
async fn run_command(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| tracing::debug!("{} not available: {}", program, e))
        .ok()?;

    if !output.status.success() {
        tracing::debug!("{} exited with {}", program, output.status);
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Parse the first GPU line of
/// `nvidia-smi --query-gpu=name,compute_cap,memory.free,memory.total --format=csv,noheader,nounits`.
/// Memory is reported in MiB.
fn parse_nvidia_smi(output: &str) -> Option<CudaDevice> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return None;
    }

    let free_mib: f64 = fields[2].parse().ok()?;
    let total_mib: f64 = fields[3].parse().ok()?;

    Some(CudaDevice {
        name: fields[0].to_string(),
        compute_capability: fields[1].to_string(),
        free_gb: free_mib / 1024.0,
        total_gb: total_mib / 1024.0,
    })
}

/// Extract chipset model and core count from `system_profiler SPDisplaysDataType`.
fn parse_system_profiler(output: &str) -> Option<AppleGpu> {
    let mut name = None;
    let mut cores = None;

    for line in output.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("Chipset Model:") {
            name.get_or_insert_with(|| value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Total Number of Cores:") {
            cores = cores.or_else(|| value.trim().parse().ok());
        }
    }

    let name = name?;
    if !name.starts_with("Apple") {
        return None;
    }
    Some(AppleGpu { name, cores })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_follows_device() {
        assert_eq!(Accelerator::cpu().precision, Precision::Float32);
        assert_eq!(Accelerator::for_device(Device::Cuda).precision, Precision::Float16);
        assert_eq!(Accelerator::for_device(Device::Mps).precision, Precision::Float16);
    }

    #[test]
    fn test_parse_nvidia_smi() {
        let output = "NVIDIA A100-SXM4-40GB, 8.0, 40000, 40960\n";
        let gpu = parse_nvidia_smi(output).unwrap();
        assert_eq!(gpu.name, "NVIDIA A100-SXM4-40GB");
        assert_eq!(gpu.compute_capability, "8.0");
        assert_eq!(gpu.total_gb, 40.0);
    }

    #[test]
    fn test_parse_nvidia_smi_multiple_gpus_takes_first() {
        let output = "Tesla T4, 7.5, 15000, 15360\nTesla T4, 7.5, 100, 15360\n";
        let gpu = parse_nvidia_smi(output).unwrap();
        assert_eq!(gpu.free_gb, 15000.0 / 1024.0);
    }

    #[test]
    fn test_parse_nvidia_smi_garbage() {
        assert!(parse_nvidia_smi("").is_none());
        assert!(parse_nvidia_smi("No devices were found").is_none());
        assert!(parse_nvidia_smi("GPU, 8.0, n/a, 100").is_none());
    }

    #[test]
    fn test_parse_system_profiler() {
        let output = r#"
Graphics/Displays:

    Apple M2 Pro:

      Chipset Model: Apple M2 Pro
      Type: GPU
      Bus: Built-In
      Total Number of Cores: 19
      Vendor: Apple (0x106b)
"#;
        let gpu = parse_system_profiler(output).unwrap();
        assert_eq!(gpu.name, "Apple M2 Pro");
        assert_eq!(gpu.cores, Some(19));
    }

    #[test]
    fn test_parse_system_profiler_intel_mac() {
        let output = "      Chipset Model: Intel Iris Plus Graphics\n";
        assert!(parse_system_profiler(output).is_none());
    }

    #[tokio::test]
    async fn test_forced_preferences_skip_probe() {
        assert_eq!(select(DevicePreference::Cpu).await, Accelerator::cpu());
        assert_eq!(
            select(DevicePreference::Cuda).await.device,
            Device::Cuda
        );
    }

    #[test]
    fn test_preference_parsing() {
        let pref: DevicePreference = serde_json::from_str(r#""mps""#).unwrap();
        assert_eq!(pref, DevicePreference::Mps);
        assert_eq!(DevicePreference::default(), DevicePreference::Auto);
    }
}
