//! Reference-counted interning cache.
//!
//! A [`Cache`] deduplicates short byte strings into owned values produced by
//! a caller-supplied `form` callback. Entries live in a power-of-two array of
//! buckets, each a singly linked chain of [`Slot`]s. The table quadruples once
//! it holds more than four entries per bucket.
//!
//! Eviction is driven by the embedder: every call to [`Cache::tick`] decays
//! the usage counter of each slot, unlinking the ones that reach zero. Retired
//! slots go to a bounded free list and are reused by later misses.
//!
//! [`SyncCache`] wraps the same table in a mutex so that it can be shared by
//! parsers running on several threads.

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, iter};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bstr::BStr;
use smallvec::SmallVec;

use crate::hash::murmur64;

/// Longest byte string that is cached; longer ones bypass the cache.
pub const DEFAULT_MAX_LEN: usize = 35;
/// Maximum number of retired slots kept for reuse.
pub const DEFAULT_FREE_LIST_CAP: usize = 8192;
pub const DEFAULT_BUCKETS: usize = 1024;
/// Average chain length above which the table grows.
pub const REHASH_LOAD: usize = 4;
/// Factor by which the bucket count grows.
pub const GROWTH_FACTOR: usize = 4;
/// Keys up to this many bytes are stored inline in their slot.
pub const INLINE_KEY: usize = 32;

/// Tuning for a [`Cache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Initial bucket count, rounded up to a power of two.
    ///
    /// # Default
    ///
    /// [`DEFAULT_BUCKETS`]
    pub initial_buckets: usize,

    /// Longest cache-eligible byte string.
    ///
    /// # Default
    ///
    /// [`DEFAULT_MAX_LEN`]
    pub max_len: usize,

    /// Maximum number of retired slots kept for reuse.
    ///
    /// # Default
    ///
    /// [`DEFAULT_FREE_LIST_CAP`]
    pub free_list_cap: usize,

    /// Amount subtracted from every usage counter on [`Cache::tick`]. Zero
    /// disables eviction.
    ///
    /// # Default
    ///
    /// `1`
    pub decay_rate: u32,

    /// Ceiling of the usage counter.
    ///
    /// # Default
    ///
    /// `64`
    pub max_usage: u32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
            max_len: DEFAULT_MAX_LEN,
            free_list_cap: DEFAULT_FREE_LIST_CAP,
            decay_rate: 1,
            max_usage: 64,
        }
    }
}

/// Counters describing the cache's activity since creation or the last
/// [`Cache::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub len: usize,
    pub buckets: usize,
    pub free: usize,
    pub hits: u64,
    pub misses: u64,
    pub bypassed: u64,
    pub evictions: u64,
    pub rehashes: u64,
}

struct Slot<V> {
    key: SmallVec<[u8; INLINE_KEY]>,
    hash: u64,
    /// `None` only while the slot sits on the free list.
    value: Option<V>,
    usage: u32,
    next: Option<Box<Slot<V>>>,
}

impl<V: fmt::Debug> fmt::Debug for Slot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("key", &BStr::new(&self.key))
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("value", &self.value)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// An unsynchronized interning cache.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use jsonstack::{Cache, CacheOptions};
///
/// let mut cache: Cache<Arc<str>> = Cache::new(CacheOptions::default());
/// let form = |b: &[u8]| Ok::<_, ()>(Arc::from(std::str::from_utf8(b).unwrap()));
/// let a = cache.intern(b"name", form).unwrap();
/// let b = cache.intern(b"name", form).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct Cache<V> {
    buckets: Vec<Option<Box<Slot<V>>>>,
    len: usize,
    free: Vec<Box<Slot<V>>>,
    options: CacheOptions,
    stats: CacheStats,
}

fn empty_buckets<V>(count: usize) -> Vec<Option<Box<Slot<V>>>> {
    iter::repeat_with(|| None).take(count).collect()
}

impl<V: Clone> Cache<V> {
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        let count = options.initial_buckets.max(1).next_power_of_two();
        Self {
            buckets: empty_buckets(count),
            len: 0,
            free: Vec::new(),
            options,
            stats: CacheStats::default(),
        }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    /// Returns `true` if `bytes` is short enough to be cached.
    #[must_use]
    pub fn is_eligible(&self, bytes: &[u8]) -> bool {
        bytes.len() <= self.options.max_len
    }

    /// Returns the cached value for `bytes`, forming and caching it on a miss.
    ///
    /// Byte strings longer than [`CacheOptions::max_len`] are formed without
    /// being cached.
    ///
    /// # Errors
    ///
    /// Propagates the error of `form`; nothing is cached in that case.
    pub fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        if !self.is_eligible(bytes) {
            self.stats.bypassed += 1;
            return form(bytes);
        }

        let hash = murmur64(bytes);
        let idx = self.bucket_index(hash);
        let max_usage = self.options.max_usage;

        let mut cur = self.buckets[idx].as_deref_mut();
        while let Some(slot) = cur {
            if slot.hash == hash && slot.key.as_slice() == bytes {
                if let Some(value) = slot.value.clone() {
                    slot.usage = slot.usage.saturating_add(1).min(max_usage);
                    self.stats.hits += 1;
                    return Ok(value);
                }
            }
            cur = slot.next.as_deref_mut();
        }

        let value = form(bytes)?;
        self.stats.misses += 1;
        let mut slot = match self.free.pop() {
            Some(mut slot) => {
                slot.key.clear();
                slot.key.extend_from_slice(bytes);
                slot.hash = hash;
                slot.value = Some(value.clone());
                slot.usage = 1;
                slot
            }
            None => Box::new(Slot {
                key: SmallVec::from_slice(bytes),
                hash,
                value: Some(value.clone()),
                usage: 1,
                next: None,
            }),
        };
        slot.next = self.buckets[idx].take();
        self.buckets[idx] = Some(slot);
        self.len += 1;

        if self.len > self.buckets.len() * REHASH_LOAD {
            self.rehash();
        }
        Ok(value)
    }

    fn rehash(&mut self) {
        let count = self.buckets.len() * GROWTH_FACTOR;
        let old = core::mem::replace(&mut self.buckets, empty_buckets(count));
        for head in old {
            let mut chain = head;
            while let Some(mut slot) = chain {
                chain = slot.next.take();
                let idx = self.bucket_index(slot.hash);
                slot.next = self.buckets[idx].take();
                self.buckets[idx] = Some(slot);
            }
        }
        self.stats.rehashes += 1;
        tracing::debug!(buckets = count, len = self.len, "interning cache rehashed");
    }

    /// Decays every usage counter and evicts the slots that reach zero.
    ///
    /// Returns the number of evicted entries.
    pub fn tick(&mut self) -> usize {
        let rate = self.options.decay_rate;
        if rate == 0 {
            return 0;
        }
        let mut evicted = 0;
        for idx in 0..self.buckets.len() {
            let mut chain = self.buckets[idx].take();
            let mut kept = None;
            while let Some(mut slot) = chain {
                chain = slot.next.take();
                slot.usage = slot.usage.saturating_sub(rate);
                if slot.usage == 0 {
                    self.retire(slot);
                    evicted += 1;
                } else {
                    slot.next = kept;
                    kept = Some(slot);
                }
            }
            self.buckets[idx] = kept;
        }
        self.len -= evicted;
        self.stats.evictions += evicted as u64;
        tracing::trace!(evicted, len = self.len, free = self.free.len(), "interning cache swept");
        evicted
    }

    fn retire(&mut self, mut slot: Box<Slot<V>>) {
        slot.value = None;
        if self.free.len() < self.options.free_list_cap {
            self.free.push(slot);
        }
    }

    /// Drops every entry and returns the table to its initial size.
    pub fn clear(&mut self) {
        let count = self.options.initial_buckets.max(1).next_power_of_two();
        self.buckets = empty_buckets(count);
        self.free.clear();
        self.len = 0;
        self.stats = CacheStats::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.len,
            buckets: self.buckets.len(),
            free: self.free.len(),
            ..self.stats
        }
    }
}

impl<V: Clone> Default for Cache<V> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<V: fmt::Debug> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for head in &self.buckets {
            let mut cur = head.as_deref();
            while let Some(slot) = cur {
                list.entry(slot);
                cur = slot.next.as_deref();
            }
        }
        list.finish()
    }
}

/// A [`Cache`] guarded by a mutex, for sharing between threads.
///
/// Every operation, including the `form` callback of a miss, runs while the
/// lock is held.
pub struct SyncCache<V> {
    inner: Mutex<Cache<V>>,
}

impl<V: Clone> SyncCache<V> {
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        Self {
            inner: Mutex::new(Cache::new(options)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cache<V>> {
        // A panicking `form` leaves the table consistent: the slot is only
        // linked after `form` returns.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Cache::intern`].
    ///
    /// # Errors
    ///
    /// Propagates the error of `form`.
    pub fn intern<E, F>(&self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        self.lock().intern(bytes, form)
    }

    /// See [`Cache::tick`].
    pub fn tick(&self) -> usize {
        self.lock().tick()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.lock().options().max_len
    }
}

impl<V: Clone> Default for SyncCache<V> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<V: fmt::Debug> fmt::Debug for SyncCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(cache) => f.debug_tuple("SyncCache").field(&*cache).finish(),
            Err(_) => f.write_str("SyncCache(<locked>)"),
        }
    }
}

/// Forms owned values, possibly through a cache.
///
/// Implemented by both cache variants so that the value builder can be used
/// with either, and by [`NoCache`] which forms every value afresh.
pub trait Interner<V> {
    /// Returns the value for `bytes`, calling `form` if it is not cached.
    ///
    /// # Errors
    ///
    /// Propagates the error of `form`.
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>;

    /// Longest byte string worth offering to [`Interner::intern`].
    fn max_len(&self) -> usize;
}

impl<V: Clone> Interner<V> for Cache<V> {
    #[inline]
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        Cache::intern(self, bytes, form)
    }

    fn max_len(&self) -> usize {
        self.options.max_len
    }
}

impl<V: Clone> Interner<V> for SyncCache<V> {
    #[inline]
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        // Exclusive access: no need to lock.
        self.inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .intern(bytes, form)
    }

    fn max_len(&self) -> usize {
        SyncCache::max_len(self)
    }
}

impl<V: Clone> Interner<V> for &SyncCache<V> {
    #[inline]
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        SyncCache::intern(self, bytes, form)
    }

    fn max_len(&self) -> usize {
        SyncCache::max_len(self)
    }
}

impl<V, T: Interner<V>> Interner<V> for &mut T {
    #[inline]
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        (**self).intern(bytes, form)
    }

    fn max_len(&self) -> usize {
        (**self).max_len()
    }
}

/// An [`Interner`] that never caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<V> Interner<V> for NoCache {
    #[inline]
    fn intern<E, F>(&mut self, bytes: &[u8], form: F) -> Result<V, E>
    where
        F: FnOnce(&[u8]) -> Result<V, E>,
    {
        form(bytes)
    }

    fn max_len(&self) -> usize {
        0
    }
}
