// Host identity via sysinfo, collected once so logs carry the hardware the
// numbers were measured on.

use sysinfo::System;

#[derive(Debug, Clone)]
pub struct HostInfo {
    pub cpu_model: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub total_memory_bytes: u64,
    pub os: String,
}

pub fn collect() -> HostInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    let cpu_model = sys
        .cpus()
        .first()
        .map(|c| c.brand().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".into());

    HostInfo {
        cpu_model,
        physical_cores: System::physical_core_count().unwrap_or(0),
        logical_cores: sys.cpus().len(),
        total_memory_bytes: sys.total_memory(),
        os: System::long_os_version().unwrap_or_else(|| "Unknown".into()),
    }
}
