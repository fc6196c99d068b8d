// Auto-skip cache tests: skip decision and the JSON file store

use isobench::cache::{CacheKey, FileCache, MemoryCache, RunCache, should_skip};
use isobench::config::AppConfig;

const CONFIG: &str = r#"
[benchmark]
sample_count = 5
change_threshold_pct = 5.0

[calibration]
image = "isobench_baseline:latest"
command = "./app"

[profile]
cpu_quota_fraction = 0.5

[results]
dir = "results"

[[targets]]
name = "merge_python"
image = "bench_python_merge:latest"
command = "python3 merge.py"
"#;

fn key() -> CacheKey {
    let config = AppConfig::load_from_str(CONFIG).unwrap();
    CacheKey::from_config(&config)
}

fn other_key() -> CacheKey {
    let config =
        AppConfig::load_from_str(&CONFIG.replace("sample_count = 5", "sample_count = 6")).unwrap();
    CacheKey::from_config(&config)
}

#[test]
fn skip_requires_matching_key_and_existing_outputs() {
    let current = key();
    assert!(should_skip(Some(&current.clone()), &current, true));
}

#[test]
fn no_skip_when_nothing_persisted() {
    assert!(!should_skip(None, &key(), true));
}

#[test]
fn no_skip_when_config_changed() {
    assert!(!should_skip(Some(&other_key()), &key(), true));
}

#[test]
fn no_skip_when_outputs_missing() {
    let current = key();
    assert!(!should_skip(Some(&current.clone()), &current, false));
}

#[test]
fn file_cache_roundtrips_the_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let mut cache = FileCache::new(&path);

    assert!(cache.get().is_none());
    let current = key();
    cache.put(&current).unwrap();
    assert_eq!(cache.get(), Some(current));
}

#[test]
fn file_cache_overwrite_replaces_previous_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let mut cache = FileCache::new(&path);

    cache.put(&key()).unwrap();
    cache.put(&other_key()).unwrap();
    assert_eq!(cache.get(), Some(other_key()));
}

#[test]
fn file_cache_treats_corrupt_state_as_absent() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{ not json").unwrap();
    let cache = FileCache::new(&path);
    assert!(cache.get().is_none());
}

#[test]
fn file_cache_creates_missing_parent_dirs() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cache.json");
    let mut cache = FileCache::new(&path);
    cache.put(&key()).unwrap();
    assert!(path.exists());
}

#[test]
fn memory_cache_roundtrips_the_key() {
    let mut cache = MemoryCache::default();
    assert!(cache.get().is_none());
    cache.put(&key()).unwrap();
    assert_eq!(cache.get(), Some(key()));
}
