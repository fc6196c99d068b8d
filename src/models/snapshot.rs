// Telemetry snapshot taken while a measured container runs

use chrono::{DateTime, Utc};

/// One point-in-time resource reading from the container runtime's stats
/// feed. CPU counters are cumulative nanoseconds and only ever grow within
/// one container's lifetime. Memory fields are `None` when the runtime
/// reported no memory section at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    /// Stamped when the reading was collected.
    pub timestamp: DateTime<Utc>,
    pub cpu_total_usage: u64,
    pub cpu_user_usage: u64,
    pub cpu_kernel_usage: u64,
    /// Cumulative counter per logical core, in core order.
    pub per_core_usage: Vec<u64>,
    pub memory_usage_bytes: Option<u64>,
    pub memory_max_usage_bytes: Option<u64>,
    pub memory_cache_bytes: Option<u64>,
}

impl ResourceSnapshot {
    /// True for the zero reading the runtime emits once the container has
    /// exited: no CPU time and no memory section. It marks end of stream
    /// and must never be recorded as telemetry.
    pub fn is_stream_end(&self) -> bool {
        self.cpu_total_usage == 0
            && self.memory_usage_bytes.is_none()
            && self.memory_max_usage_bytes.is_none()
            && self.memory_cache_bytes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> ResourceSnapshot {
        ResourceSnapshot {
            timestamp: Utc::now(),
            cpu_total_usage: 0,
            cpu_user_usage: 0,
            cpu_kernel_usage: 0,
            per_core_usage: Vec::new(),
            memory_usage_bytes: None,
            memory_max_usage_bytes: None,
            memory_cache_bytes: None,
        }
    }

    #[test]
    fn zero_cpu_and_no_memory_is_stream_end() {
        assert!(zeroed().is_stream_end());
    }

    #[test]
    fn nonzero_cpu_is_a_valid_reading() {
        let snap = ResourceSnapshot {
            cpu_total_usage: 1,
            ..zeroed()
        };
        assert!(!snap.is_stream_end());
    }

    #[test]
    fn zero_cpu_with_memory_populated_is_a_valid_reading() {
        let snap = ResourceSnapshot {
            memory_usage_bytes: Some(4096),
            ..zeroed()
        };
        assert!(!snap.is_stream_end());
    }
}
