use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sysinfo::{ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Sample payload hashed by the data security check
const DATA_SAMPLE: &str = "user_data_123456";

/// Point-in-time host metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub process_count: usize,
}

/// Source of live host metrics. Blocking; callers run it off the async
/// executor.
pub trait HostProbe: Send + Sync {
    fn snapshot(&self) -> Result<HostSnapshot>;
}

/// Reads metrics from the running system.
#[derive(Debug, Default)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn snapshot(&self) -> Result<HostSnapshot> {
        let mut sys = System::new();

        // CPU usage is a delta between two refreshes
        sys.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let total = sys.total_memory();
        if total == 0 {
            bail!("host reported zero total memory");
        }

        Ok(HostSnapshot {
            cpu_percent: f64::from(sys.global_cpu_usage()),
            memory_percent: sys.used_memory() as f64 / total as f64 * 100.0,
            process_count: sys.processes().len(),
        })
    }
}

/// Always returns the same snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub HostSnapshot);

impl HostProbe for StaticProbe {
    fn snapshot(&self) -> Result<HostSnapshot> {
        Ok(self.0)
    }
}

/// First 16 hex characters of the SHA-256 of the data sample.
pub fn data_sample_hash() -> String {
    let digest = Sha256::digest(DATA_SAMPLE.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..16].to_string()
}
