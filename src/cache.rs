//! Weak, name-keyed bitmap cache and a loader for named resources.
//!
//! The cache never keeps a bitmap alive on its own: entries are [`Weak`], so
//! a bitmap is reclaimed as soon as its last external owner drops it. At
//! most one live instance exists per (name, scale) key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use alloc::format;
use alloc::string::String;

use tracing::{debug, trace, warn};

use crate::bitmap::OwnedBitmap;
use crate::codecs::WebpBackend;
use crate::decode::DecodeRequest;
use crate::format::WEBP_EXTENSION;

#[cfg(feature = "libwebp")]
use crate::codecs::LibWebp;

/// Cache key: resource name plus display scale.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub scale: u32,
}

impl CacheKey {
    pub fn new(name: impl Into<String>, scale: u32) -> Self {
        Self {
            name: name.into(),
            scale,
        }
    }
}

/// Thread-safe cache of weakly held values.
///
/// A single lock guards the map, so readers never observe a half-inserted
/// entry.
#[derive(Debug)]
pub struct BitmapCache<T> {
    entries: Mutex<HashMap<CacheKey, Weak<T>>>,
}

impl<T> Default for BitmapCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BitmapCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Weak<T>>> {
        // A panic while holding the lock cannot leave the map inconsistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The live value for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.lock().get(key).and_then(Weak::upgrade)
    }

    /// Store `value` under `key` unless a live value is already resident, and
    /// return whichever value is now cached.
    pub fn insert(&self, key: CacheKey, value: Arc<T>) -> Arc<T> {
        let mut entries = self.lock();
        if let Some(live) = entries.get(&key).and_then(Weak::upgrade) {
            return live;
        }
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.insert(key, Arc::downgrade(&value));
        value
    }

    /// Return the live value for `key`, or build, cache and return one.
    ///
    /// `build` runs without the lock held. If another thread caches a value
    /// for the same key meanwhile, that value wins and the freshly built one
    /// is dropped.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: CacheKey,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(live) = self.get(&key) {
            trace!(name = %key.name, scale = key.scale, "cache hit");
            return Ok(live);
        }
        let value = Arc::new(build()?);
        Ok(self.insert(key, value))
    }

    /// Drop entries whose values have been reclaimed.
    pub fn purge(&self) {
        self.lock().retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads `name.webp` style resources from a directory, preferring
/// `name@{scale}x` variants, through a shared [`BitmapCache`].
#[derive(Debug, Clone)]
pub struct NamedLoader {
    root: PathBuf,
    scale: u32,
    cache: Arc<BitmapCache<OwnedBitmap>>,
}

impl NamedLoader {
    pub fn new(root: impl Into<PathBuf>, scale: u32, cache: Arc<BitmapCache<OwnedBitmap>>) -> Self {
        Self {
            root: root.into(),
            scale: scale.max(1),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn cache(&self) -> &Arc<BitmapCache<OwnedBitmap>> {
        &self.cache
    }

    /// File names tried for `name`, most specific first.
    ///
    /// The name's own extension is kept; names without one get `.webp`.
    pub fn candidates(&self, name: &str) -> alloc::vec::Vec<String> {
        let split = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| Some((name.strip_suffix(ext)?.strip_suffix('.')?, ext)));
        let (stem, ext) = split.unwrap_or((name, WEBP_EXTENSION));
        let mut out = alloc::vec::Vec::with_capacity(2);
        if self.scale > 1 {
            out.push(format!("{stem}@{}x.{ext}", self.scale));
        }
        out.push(format!("{stem}.{ext}"));
        out
    }

    /// Load `name` with libwebp.
    #[cfg(feature = "libwebp")]
    pub fn load(&self, name: &str) -> Option<Arc<OwnedBitmap>> {
        self.load_with(&LibWebp, name)
    }

    /// Load `name` with an explicit backend.
    ///
    /// Candidates are tried in order; one that is missing or fails to decode
    /// falls through to the next. Errors are logged and the result is `None`
    /// only when no candidate yields a bitmap.
    pub fn load_with<B: WebpBackend>(&self, backend: &B, name: &str) -> Option<Arc<OwnedBitmap>> {
        let request = DecodeRequest::default();
        for candidate in self.candidates(name) {
            let path = self.root.join(&candidate);
            let key = CacheKey::new(candidate, self.scale);
            if let Some(hit) = self.cache.get(&key) {
                return Some(hit);
            }
            if !path.is_file() {
                continue;
            }
            match self
                .cache
                .get_or_try_insert_with(key, || request.decode_file_with(backend, &path))
            {
                Ok(bitmap) => return Some(bitmap),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load named resource");
                }
            }
        }
        debug!(name, root = %self.root.display(), "no resource found");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_entries_are_reclaimed() {
        let cache = BitmapCache::new();
        let key = CacheKey::new("a", 1);
        let value = cache
            .get_or_try_insert_with(key.clone(), || Ok::<_, ()>(5u32))
            .unwrap();
        assert_eq!(cache.get(&key).as_deref(), Some(&5));
        assert_eq!(cache.len(), 1);
        drop(value);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
        cache.purge();
        assert_eq!(cache.lock().len(), 0);
    }

    #[test]
    fn resident_value_wins() {
        let cache = BitmapCache::new();
        let key = CacheKey::new("a", 2);
        let first = cache.insert(key.clone(), Arc::new(1u32));
        let second = cache.insert(key.clone(), Arc::new(2u32));
        assert!(Arc::ptr_eq(&first, &second));
        let third = cache
            .get_or_try_insert_with(key, || -> Result<u32, ()> { panic!("must not build") })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn scale_is_part_of_the_key() {
        let cache = BitmapCache::new();
        let one = cache.insert(CacheKey::new("a", 1), Arc::new(1u32));
        let two = cache.insert(CacheKey::new("a", 2), Arc::new(2u32));
        assert!(!Arc::ptr_eq(&one, &two));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn build_errors_are_not_cached() {
        let cache: BitmapCache<u32> = BitmapCache::new();
        let key = CacheKey::new("a", 1);
        assert!(cache.get_or_try_insert_with(key.clone(), || Err("boom")).is_err());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn candidate_names() {
        let cache = Arc::new(BitmapCache::new());
        let loader = NamedLoader::new("/res", 2, cache.clone());
        assert_eq!(loader.candidates("logo"), ["logo@2x.webp", "logo.webp"]);
        assert_eq!(loader.candidates("logo.WEBP"), ["logo@2x.WEBP", "logo.WEBP"]);
        assert_eq!(loader.candidates("icons/a.b.webp"), ["icons/a.b@2x.webp", "icons/a.b.webp"]);

        let loader = NamedLoader::new("/res", 1, cache);
        assert_eq!(loader.candidates("logo"), ["logo.webp"]);
    }
}
