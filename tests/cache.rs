//! Named-resource cache: uniqueness under concurrency, weak retention and
//! the `name@Nx.webp` lookup.

use std::sync::{Arc, Barrier};
use std::thread;

use webpbridge::{BitmapCache, CacheKey};

#[test]
fn concurrent_builders_share_one_instance() {
    let cache = Arc::new(BitmapCache::<Vec<u8>>::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_try_insert_with(CacheKey::new("shared", 2), || {
                        Ok::<_, ()>(vec![i; 16])
                    })
                    .unwrap()
            })
        })
        .collect();

    let values: Vec<Arc<Vec<u8>>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for value in &values[1..] {
        assert!(Arc::ptr_eq(&values[0], value));
    }
    assert_eq!(cache.len(), 1);

    drop(values);
    assert!(cache.get(&CacheKey::new("shared", 2)).is_none());
}

#[test]
fn readers_and_writers_interleave() {
    let cache = Arc::new(BitmapCache::<u64>::new());
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut held = Vec::new();
                for i in 0..200u64 {
                    let key = CacheKey::new(format!("k{}", i % 16), 1);
                    let v = cache
                        .get_or_try_insert_with(key.clone(), || Ok::<_, ()>(t * 1000 + i))
                        .unwrap();
                    if let Some(seen) = cache.get(&key) {
                        // Anything visible is a fully inserted value.
                        assert!(*seen < 4000);
                    }
                    if i % 3 == 0 {
                        held.push(v);
                    }
                }
                held.len()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap() > 0);
    }
    cache.purge();
    assert!(cache.is_empty());
}

#[cfg(feature = "libwebp")]
mod named {
    use super::*;
    use imgref::ImgVec;
    use rgb::RGB8;
    use webpbridge::{Bitmap, EncodeRequest, NamedLoader};

    fn write_webp(dir: &std::path::Path, name: &str, width: usize, height: usize) {
        let img = ImgVec::new(vec![RGB8::new(9, 8, 7); width * height], width, height);
        let webp = EncodeRequest::lossless(1).encode(&img).unwrap();
        std::fs::write(dir.join(name), &webp).unwrap();
    }

    #[test]
    fn prefers_scaled_variant() {
        let dir = tempfile::tempdir().unwrap();
        write_webp(dir.path(), "logo.webp", 8, 8);
        write_webp(dir.path(), "logo@2x.webp", 16, 16);

        let cache = Arc::new(BitmapCache::new());
        let retina = NamedLoader::new(dir.path(), 2, Arc::clone(&cache));
        let plain = NamedLoader::new(dir.path(), 1, Arc::clone(&cache));

        let big = retina.load("logo").unwrap();
        assert_eq!(big.width(), 16);
        let small = plain.load("logo.webp").unwrap();
        assert_eq!(small.width(), 8);

        // Same key, same instance while alive.
        assert!(Arc::ptr_eq(&big, &retina.load("logo").unwrap()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn falls_back_to_unscaled_file() {
        let dir = tempfile::tempdir().unwrap();
        write_webp(dir.path(), "icon.webp", 4, 2);
        let loader = NamedLoader::new(dir.path(), 3, Arc::new(BitmapCache::new()));
        let bitmap = loader.load("icon").unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 2));
    }

    #[test]
    fn corrupt_scaled_variant_falls_back_to_plain() {
        let dir = tempfile::tempdir().unwrap();
        write_webp(dir.path(), "logo.webp", 6, 3);
        std::fs::write(dir.path().join("logo@2x.webp"), b"RIFF\0\0\0\0WEBPbroken").unwrap();

        let cache = Arc::new(BitmapCache::new());
        let loader = NamedLoader::new(dir.path(), 2, Arc::clone(&cache));
        let bitmap = loader.load("logo").unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (6, 3));
        assert!(cache.get(&CacheKey::new("logo.webp", 2)).is_some());
        assert!(cache.get(&CacheKey::new("logo@2x.webp", 2)).is_none());
    }

    #[test]
    fn missing_or_corrupt_resources_are_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.webp"), b"RIFF\0\0\0\0WEBPnope").unwrap();
        let cache = Arc::new(BitmapCache::new());
        let loader = NamedLoader::new(dir.path(), 1, Arc::clone(&cache));
        assert!(loader.load("absent").is_none());
        assert!(loader.load("broken").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_expire_with_their_owners() {
        let dir = tempfile::tempdir().unwrap();
        write_webp(dir.path(), "a.webp", 2, 2);
        let cache = Arc::new(BitmapCache::new());
        let loader = NamedLoader::new(dir.path(), 1, Arc::clone(&cache));
        let first = loader.load("a").unwrap();
        let weak = Arc::downgrade(&first);
        drop(first);
        assert!(weak.upgrade().is_none());
        assert!(cache.is_empty());
        assert!(loader.load("a").is_some());
    }
}
