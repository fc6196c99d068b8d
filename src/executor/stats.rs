// Convert a raw Docker stats API response into a ResourceSnapshot.

use crate::models::ResourceSnapshot;
use bollard::models::ContainerStatsResponse;
use chrono::Utc;

/// Map a raw stats response to a snapshot. Missing CPU counters become 0 and
/// missing memory sections stay `None`, so the exhausted-stream reading the
/// runtime emits after container exit maps onto the zero sentinel
/// (`ResourceSnapshot::is_stream_end`). No filtering happens here; deciding
/// what a sentinel means is the consumer's job. Exposed for unit tests.
pub(crate) fn process_snapshot(s: &ContainerStatsResponse) -> ResourceSnapshot {
    let cpu_usage = s.cpu_stats.as_ref().and_then(|c| c.cpu_usage.as_ref());
    let memory = s.memory_stats.as_ref();

    ResourceSnapshot {
        timestamp: Utc::now(),
        cpu_total_usage: cpu_usage.and_then(|u| u.total_usage).unwrap_or(0),
        cpu_user_usage: cpu_usage.and_then(|u| u.usage_in_usermode).unwrap_or(0),
        cpu_kernel_usage: cpu_usage.and_then(|u| u.usage_in_kernelmode).unwrap_or(0),
        per_core_usage: cpu_usage
            .and_then(|u| u.percpu_usage.clone())
            .unwrap_or_default(),
        memory_usage_bytes: memory.and_then(|m| m.usage),
        memory_max_usage_bytes: memory.and_then(|m| m.max_usage),
        memory_cache_bytes: memory
            .and_then(|m| m.stats.as_ref())
            .and_then(|stats| stats.get("cache").copied()),
    }
}
