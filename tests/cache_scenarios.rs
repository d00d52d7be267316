//! End-to-end cache behaviour over an in-memory container
//!
//! Covers eviction order, promotion, loader precedence and failure cleanup.

use resource_cache::{
    MemoryContainer, NamePattern, ResourceCache, ResourceContainer, ResourceError,
    ResourceLoader, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sized_container(sizes: &[(&str, usize)]) -> MemoryContainer {
    let mut container = MemoryContainer::new("scenarios");
    for (index, (name, size)) in sizes.iter().enumerate() {
        container.insert(name, vec![index as u8 + 1; *size]);
    }
    container
}

fn ready_cache(budget: usize, container: MemoryContainer) -> ResourceCache<MemoryContainer> {
    let mut cache = ResourceCache::with_budget(budget, container).unwrap();
    cache.initialize().unwrap();
    cache
}

/// Raw passthrough loader that records which names it was selected for
struct Recording {
    label: &'static str,
    pattern: NamePattern,
    hits: Arc<AtomicUsize>,
}

impl Recording {
    fn new(label: &'static str, glob: &str) -> (Self, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let loader = Recording {
            label,
            pattern: NamePattern::glob(glob).unwrap(),
            hits: Arc::clone(&hits),
        };
        (loader, hits)
    }
}

impl ResourceLoader for Recording {
    fn name(&self) -> &str {
        self.label
    }

    fn matches(&self, resource: &str) -> bool {
        let matched = self.pattern.matches(resource);
        if matched {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        matched
    }

    fn use_raw(&self) -> bool {
        true
    }

    fn decode(&self, _raw: &[u8], _target: &mut [u8]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Decoding loader that fails on demand
struct Picky;

impl ResourceLoader for Picky {
    fn name(&self) -> &str {
        "picky"
    }

    fn matches(&self, resource: &str) -> bool {
        resource.ends_with(".pak")
    }

    fn use_raw(&self) -> bool {
        false
    }

    fn decoded_size(&self, raw: &[u8]) -> usize {
        raw.len() * 2
    }

    fn decode(&self, raw: &[u8], target: &mut [u8]) -> anyhow::Result<()> {
        if raw.first() == Some(&0xFF) {
            anyhow::bail!("bad header byte");
        }
        for (pair, byte) in target.chunks_mut(2).zip(raw) {
            pair[0] = *byte;
            pair[1] = *byte;
        }
        Ok(())
    }
}

/// Container that advertises sizes it cannot deliver for some entries
struct Unreliable {
    inner: MemoryContainer,
    truncated: &'static str,
    broken: &'static str,
}

impl ResourceContainer for Unreliable {
    fn location(&self) -> &str {
        self.inner.location()
    }

    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn size_of(&self, name: &str) -> Option<usize> {
        self.inner.size_of(name)
    }

    fn read_into(&mut self, name: &str, buffer: &mut [u8]) -> Result<usize> {
        if name == self.truncated {
            return Ok(0);
        }
        if name == self.broken {
            return Err(ResourceError::ContainerRead {
                name: name.to_string(),
                reason: "checksum mismatch".to_string(),
            });
        }
        self.inner.read_into(name, buffer)
    }

    fn entry_count(&self) -> usize {
        self.inner.entry_count()
    }

    fn entry_name(&self, index: usize) -> Option<&str> {
        self.inner.entry_name(index)
    }
}

#[test]
fn test_budget_scenario() -> Result<()> {
    let container = sized_container(&[("a.bin", 400), ("b.bin", 400), ("c.bin", 400)]);
    let mut cache = ready_cache(1000, container);

    cache.get_handle("a.bin")?;
    cache.get_handle("b.bin")?;
    cache.get_handle("a.bin")?;
    cache.get_handle("c.bin")?;

    assert!(!cache.contains("b.bin"));
    assert!(cache.contains("a.bin"));
    assert!(cache.contains("c.bin"));
    assert_eq!(cache.allocated_bytes(), 800);
    Ok(())
}

#[test]
fn test_lru_eviction_order() -> Result<()> {
    let container = sized_container(&[
        ("r1.bin", 100),
        ("r2.bin", 100),
        ("r3.bin", 100),
        ("r4.bin", 100),
        ("r5.bin", 100),
    ]);
    let mut cache = ready_cache(300, container);

    cache.get_handle("r1.bin")?;
    cache.get_handle("r2.bin")?;
    cache.get_handle("r3.bin")?;

    // Touch r1 so r2 becomes the next victim
    cache.get_handle("r1.bin")?;
    cache.get_handle("r4.bin")?;
    assert_eq!(cache.resident_names(), vec!["r4.bin", "r1.bin", "r3.bin"]);

    cache.get_handle("r5.bin")?;
    assert_eq!(cache.resident_names(), vec!["r5.bin", "r4.bin", "r1.bin"]);
    assert_eq!(cache.stats().evictions, 2);
    Ok(())
}

#[test]
fn test_large_load_evicts_several() -> Result<()> {
    let container = sized_container(&[
        ("small1.bin", 100),
        ("small2.bin", 100),
        ("small3.bin", 100),
        ("large.bin", 250),
    ]);
    let mut cache = ready_cache(300, container);

    cache.get_handle("small1.bin")?;
    cache.get_handle("small2.bin")?;
    cache.get_handle("small3.bin")?;
    cache.get_handle("large.bin")?;

    assert_eq!(cache.resident_names(), vec!["large.bin"]);
    assert_eq!(cache.allocated_bytes(), 250);
    Ok(())
}

#[test]
fn test_miss_then_hit_loads_once() -> Result<()> {
    let container = sized_container(&[("x.bin", 64)]);
    let mut cache = ready_cache(1000, container);
    let (loader, selections) = Recording::new("bin", "*.bin");
    cache.register_loader(loader);

    let first = cache.get_handle("x.bin")?;
    let second = cache.get_handle("x.bin")?;

    assert_eq!(cache.container().read_count(), 1);
    assert_eq!(selections.load(Ordering::SeqCst), 1);
    assert_eq!(first.to_vec(), second.to_vec());
    assert!(Arc::ptr_eq(&first, &second));
    Ok(())
}

#[test]
fn test_loader_precedence() -> Result<()> {
    let container = sized_container(&[("sprite.png", 10), ("data.bin", 10)]);
    let mut cache = ready_cache(1000, container);

    let (png, png_hits) = Recording::new("png", "*.png");
    let (any, any_hits) = Recording::new("any", "*");
    cache.register_loader(png);
    cache.register_loader(any);

    cache.get_handle("sprite.png")?;
    assert_eq!(png_hits.load(Ordering::SeqCst), 1);
    assert_eq!(any_hits.load(Ordering::SeqCst), 0);

    cache.get_handle("data.bin")?;
    assert_eq!(png_hits.load(Ordering::SeqCst), 1);
    assert_eq!(any_hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_oversized_request_leaves_cache_unchanged() -> Result<()> {
    let container = sized_container(&[("a.bin", 300), ("b.bin", 300), ("huge.bin", 2000)]);
    let mut cache = ready_cache(1000, container);

    cache.get_handle("a.bin")?;
    cache.get_handle("b.bin")?;
    let before = cache.resident_names();

    let err = cache.get_handle("huge.bin").unwrap_err();
    assert!(matches!(err, ResourceError::AllocationFailure { .. }));
    assert_eq!(cache.resident_names(), before);
    assert_eq!(cache.allocated_bytes(), 600);
    Ok(())
}

#[test]
fn test_decode_failure_releases_everything() -> Result<()> {
    let mut container = MemoryContainer::new("decode");
    container.insert("good.pak", vec![1u8, 2, 3]);
    container.insert("bad.pak", vec![0xFFu8, 2, 3]);
    let mut cache = ready_cache(1000, container);
    cache.register_loader(Picky);

    let good = cache.get_handle("good.pak")?;
    assert_eq!(good.to_vec(), vec![1, 1, 2, 2, 3, 3]);
    assert_eq!(cache.allocated_bytes(), 6);

    let err = cache.get_handle("bad.pak").unwrap_err();
    assert!(matches!(err, ResourceError::DecodeFailed { .. }));
    assert!(err.to_string().contains("bad header byte"));
    assert_eq!(cache.allocated_bytes(), 6);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn test_failed_load_can_be_retried() -> Result<()> {
    let container = sized_container(&[("a.bin", 600), ("b.bin", 600)]);
    let mut cache = ResourceCache::with_budget(1000, container)?;
    cache.initialize()?;

    cache.get_handle("a.bin")?;
    // Fits only after "a" is evicted
    cache.get_handle("b.bin")?;
    assert_eq!(cache.resident_names(), vec!["b.bin"]);

    assert!(cache.get_handle("missing.bin").is_err());
    assert!(cache.get_handle("a.bin").is_ok());
    assert_eq!(cache.resident_names(), vec!["a.bin"]);
    Ok(())
}

#[test]
fn test_preload_counts_matches_and_reports_progress() {
    let container = sized_container(&[
        ("textures/a.png", 10),
        ("textures/b.png", 10),
        ("sounds/c.ogg", 10),
        ("textures/d.png", 10),
    ]);
    let mut cache = ready_cache(1000, container);
    let mut reports = Vec::new();

    let matched = cache.preload(&NamePattern::glob("textures/*.png").unwrap(), |percent, _| {
        reports.push(percent)
    });

    assert_eq!(matched, 3);
    assert_eq!(reports, vec![25, 50, 75, 100]);
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains("sounds/c.ogg"));
}

#[test]
fn test_preload_cancel_stops_early() {
    let container = sized_container(&[
        ("a.bin", 10),
        ("b.bin", 10),
        ("c.bin", 10),
        ("d.bin", 10),
    ]);
    let mut cache = ready_cache(1000, container);

    let matched = cache.preload(&NamePattern::any(), |percent, cancel| {
        *cancel = percent >= 50;
    });

    assert_eq!(matched, 2);
    assert_eq!(cache.resident_names(), vec!["b.bin", "a.bin"]);
}

#[test]
fn test_clear_empties_index() -> Result<()> {
    let container = sized_container(&[("a.bin", 10), ("b.bin", 10), ("c.bin", 10)]);
    let mut cache = ready_cache(1000, container);

    let kept = cache.get_handle("a.bin")?;
    cache.get_handle("b.bin")?;
    cache.get_handle("c.bin")?;

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.resident_names().is_empty());
    assert_eq!(cache.allocated_bytes(), 0);

    // External holders keep their buffers
    assert_eq!(kept.to_vec(), vec![1u8; 10]);
    Ok(())
}

#[test]
fn test_container_read_failures_leave_cache_unchanged() -> Result<()> {
    let container = Unreliable {
        inner: sized_container(&[("a.bin", 600), ("torn.bin", 300), ("corrupt.bin", 300)]),
        truncated: "torn.bin",
        broken: "corrupt.bin",
    };
    let mut cache = ResourceCache::with_budget(800, container)?;
    cache.initialize()?;
    cache.get_handle("a.bin")?;

    // Both would need "a.bin" evicted if they were charged before reading
    for name in ["torn.bin", "corrupt.bin"] {
        let err = cache.get_handle(name).unwrap_err();
        assert!(matches!(err, ResourceError::ContainerRead { .. }));
        assert_eq!(cache.resident_names(), vec!["a.bin"]);
        assert_eq!(cache.allocated_bytes(), 600);
    }
    assert_eq!(cache.stats().evictions, 0);
    Ok(())
}

#[test]
fn test_short_read_on_empty_cache_releases_charge() -> Result<()> {
    let container = Unreliable {
        inner: sized_container(&[("torn.bin", 64)]),
        truncated: "torn.bin",
        broken: "",
    };
    let mut cache = ResourceCache::with_budget(1000, container)?;
    cache.initialize()?;

    assert!(matches!(
        cache.get_handle("torn.bin"),
        Err(ResourceError::ContainerRead { .. })
    ));
    assert_eq!(cache.allocated_bytes(), 0);
    assert!(cache.is_empty());
    Ok(())
}
