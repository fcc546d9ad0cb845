// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Bucketed buffer pooling for image and audio storage.
//!
//! - fixed size buckets (by element count)
//! - bounded buffers per bucket
//! - `PooledFrameData<T>` returns its backing buffer to the pool on drop
//!
//! Test cards, silence and conversion outputs are allocated from the
//! process-wide [`BytePool`] returned by [`byte_pool`], so repeated pulls of
//! same-sized frames stop hitting the allocator after warm-up.

use std::collections::TryReserveError;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, OnceLock, Weak};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub buckets: Vec<BucketStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStats {
    pub bucket_size: usize,
    pub available: usize,
    pub max_per_bucket: usize,
}

#[derive(Clone)]
pub struct PoolHandle<T>(Weak<Mutex<PoolInner<T>>>);

impl<T> PoolHandle<T> {
    fn upgrade(&self) -> Option<Arc<Mutex<PoolInner<T>>>> {
        self.0.upgrade()
    }
}

struct PoolInner<T> {
    bucket_sizes: Vec<usize>,
    max_per_bucket: usize,
    buckets: Vec<Vec<Vec<T>>>,
    hits: u64,
    misses: u64,
}

impl<T> PoolInner<T> {
    fn bucket_index_for_min_len(&self, min_len: usize) -> Option<usize> {
        self.bucket_sizes.iter().position(|&size| size >= min_len)
    }

    fn bucket_index_for_storage_len(&self, storage_len: usize) -> Option<usize> {
        self.bucket_sizes.iter().position(|&size| size == storage_len)
    }

    /// Take a recycled buffer for `min_len`, updating hit/miss counters.
    fn take(&mut self, min_len: usize) -> Option<(usize, usize, Option<Vec<T>>)> {
        let Some(bucket_idx) = self.bucket_index_for_min_len(min_len) else {
            self.misses += 1;
            return None;
        };
        let buf = self.buckets[bucket_idx].pop();
        if buf.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        Some((bucket_idx, self.bucket_sizes[bucket_idx], buf))
    }
}

/// Thread-safe pool for `Vec<T>` buffers.
pub struct FramePool<T> {
    inner: Arc<Mutex<PoolInner<T>>>,
}

impl<T> Clone for FramePool<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> std::fmt::Debug for FramePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePool").finish_non_exhaustive()
    }
}

impl<T> FramePool<T> {
    /// Create a pool with fixed buckets. Buckets start empty and fill as
    /// buffers are returned.
    pub fn with_buckets(mut bucket_sizes: Vec<usize>, max_per_bucket: usize) -> Self {
        bucket_sizes.sort_unstable();
        bucket_sizes.dedup();
        let buckets = (0..bucket_sizes.len()).map(|_| Vec::new()).collect();
        Self {
            inner: Arc::new(Mutex::new(PoolInner {
                bucket_sizes,
                max_per_bucket,
                buckets,
                hits: 0,
                misses: 0,
            })),
        }
    }

    pub fn handle(&self) -> PoolHandle<T> {
        PoolHandle(Arc::downgrade(&self.inner))
    }

    pub fn stats(&self) -> PoolStats {
        let Ok(guard) = self.inner.lock() else {
            return PoolStats { hits: 0, misses: 0, buckets: Vec::new() };
        };
        PoolStats {
            hits: guard.hits,
            misses: guard.misses,
            buckets: guard
                .bucket_sizes
                .iter()
                .enumerate()
                .map(|(idx, &bucket_size)| BucketStats {
                    bucket_size,
                    available: guard.buckets[idx].len(),
                    max_per_bucket: guard.max_per_bucket,
                })
                .collect(),
        }
    }
}

fn try_filled<T: Clone + Default>(len: usize) -> Result<Vec<T>, TryReserveError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::default());
    Ok(data)
}

impl<T: Clone + Default> FramePool<T> {
    pub fn preallocated(bucket_sizes: &[usize], buffers_per_bucket: usize) -> Self {
        let pool = Self::with_buckets(bucket_sizes.to_vec(), buffers_per_bucket);
        let Ok(mut guard) = pool.inner.lock() else {
            return pool;
        };

        for idx in 0..guard.bucket_sizes.len() {
            let bucket_size = guard.bucket_sizes[idx];
            for _ in 0..buffers_per_bucket {
                guard.buckets[idx].push(vec![T::default(); bucket_size]);
            }
        }
        drop(guard);
        pool
    }

    /// Get pooled storage for at least `min_len` elements.
    ///
    /// If `min_len` doesn't fit in any bucket, returns a non-pooled buffer of
    /// exact size. Recycled buffers keep their previous contents; callers
    /// that need zeroed storage use [`PooledFrameData::fill`].
    ///
    /// # Errors
    ///
    /// Returns the allocator's error when a fresh buffer cannot be reserved.
    pub fn try_get(&self, min_len: usize) -> Result<PooledFrameData<T>, TryReserveError> {
        let taken = match self.inner.lock() {
            Ok(mut guard) => guard.take(min_len),
            Err(_) => None,
        };
        let Some((bucket_idx, bucket_size, maybe_buf)) = taken else {
            return Ok(PooledFrameData::from_vec(try_filled(min_len)?));
        };

        let data = match maybe_buf {
            Some(buf) => buf,
            None => try_filled(bucket_size)?,
        };
        Ok(PooledFrameData::from_pool(data, min_len, self.handle(), bucket_idx))
    }
}

/// A pooled buffer with a logical length.
///
/// For pooled instances, `data.len()` is the bucket size and `len` is the logical slice length.
pub struct PooledFrameData<T> {
    data: Vec<T>,
    len: usize,
    pool: Option<PoolHandle<T>>,
    bucket_idx: Option<usize>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for PooledFrameData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFrameData")
            .field("len", &self.len)
            .field("storage_len", &self.data.len())
            .field("pooled", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> PooledFrameData<T> {
    pub const fn from_vec(data: Vec<T>) -> Self {
        let len = data.len();
        Self { data, len, pool: None, bucket_idx: None }
    }

    fn from_pool(data: Vec<T>, len: usize, pool: PoolHandle<T>, bucket_idx: usize) -> Self {
        let len = len.min(data.len());
        Self { data, len, pool: Some(pool), bucket_idx: Some(bucket_idx) }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn storage_len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }

    /// Consume into a detached Vec of exactly the logical length.
    pub fn into_vec(mut self) -> Vec<T> {
        self.pool = None;
        self.bucket_idx = None;
        let logical_len = self.len;
        let mut data = std::mem::take(&mut self.data);
        data.truncate(logical_len);
        data
    }
}

impl<T: Clone> PooledFrameData<T> {
    /// Overwrite the logical slice with `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }
}

impl<T: Clone + Default> Clone for PooledFrameData<T> {
    fn clone(&self) -> Self {
        // Prefer a recycled bucket when the pool is still alive.
        if let Some(pool) = &self.pool {
            if let Some(inner) = pool.upgrade() {
                let taken = inner.lock().ok().and_then(|mut guard| guard.take(self.len));
                if let Some((bucket_idx, bucket_size, buf)) = taken {
                    let mut data = buf.unwrap_or_else(|| vec![T::default(); bucket_size]);
                    data[..self.len].clone_from_slice(self.as_slice());
                    return Self::from_pool(data, self.len, pool.clone(), bucket_idx);
                }
            }
        }

        Self::from_vec(self.as_slice().to_vec())
    }
}

impl<T> Deref for PooledFrameData<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for PooledFrameData<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T> Drop for PooledFrameData<T> {
    fn drop(&mut self) {
        let Some(pool) = self.pool.take() else { return };
        let Some(bucket_idx) = self.bucket_idx.take() else { return };
        let Some(inner) = pool.upgrade() else { return };
        let Ok(mut guard) = inner.lock() else { return };

        // Only return buffers that match an existing bucket exactly.
        let Some(expected_bucket_idx) = guard.bucket_index_for_storage_len(self.data.len()) else {
            return;
        };
        if expected_bucket_idx != bucket_idx {
            return;
        }

        if guard.buckets[bucket_idx].len() >= guard.max_per_bucket {
            return;
        }

        self.len = self.data.len();
        guard.buckets[bucket_idx].push(std::mem::take(&mut self.data));
    }
}

pub type BytePool = FramePool<u8>;
pub type PooledBytes = PooledFrameData<u8>;

/// Bucket sizes (bytes) for the process-wide pool: audio blocks up to 8
/// channels of 1920 float samples, then SD and HD images in 4:2:2 and RGBA.
pub const DEFAULT_BYTE_BUCKET_SIZES: &[usize] = &[
    16 * 1024,
    64 * 1024,
    720 * 576 * 2,
    720 * 576 * 4,
    1920 * 1080 * 2,
    1920 * 1080 * 4,
];
pub const DEFAULT_BUFFERS_PER_BUCKET: usize = 8;

impl FramePool<u8> {
    pub fn media_default() -> Self {
        Self::with_buckets(DEFAULT_BYTE_BUCKET_SIZES.to_vec(), DEFAULT_BUFFERS_PER_BUCKET)
    }
}

/// The process-wide byte pool used for frame buffers.
pub fn byte_pool() -> &'static BytePool {
    static POOL: OnceLock<BytePool> = OnceLock::new();
    POOL.get_or_init(BytePool::media_default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn returns_to_pool_on_drop() {
        let pool = FramePool::<u8>::preallocated(&[10], 1);
        assert_eq!(pool.stats().buckets[0].available, 1);

        {
            let mut buf = pool.try_get(5).unwrap();
            assert_eq!(buf.len(), 5);
            assert_eq!(buf.storage_len(), 10);
            buf.fill(7);
            assert_eq!(pool.stats().buckets[0].available, 0);
        }

        assert_eq!(pool.stats().buckets[0].available, 1);
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn oversized_requests_are_not_pooled() {
        let pool = FramePool::<u8>::with_buckets(vec![16], 2);
        let buf = pool.try_get(64).unwrap();
        assert!(!buf.is_pooled());
        assert_eq!(buf.len(), 64);
        drop(buf);
        assert_eq!(pool.stats().buckets[0].available, 0);
        assert_eq!(pool.stats().misses, 1);
    }

    #[test]
    fn clone_prefers_pool_when_available() {
        let pool = FramePool::<u8>::preallocated(&[4], 2);
        let mut a = pool.try_get(3).unwrap();
        a.as_mut_slice().copy_from_slice(&[1, 2, 3]);
        let b = a.clone();
        assert_eq!(b.as_slice(), &[1, 2, 3]);
        drop(a);
        drop(b);
        assert_eq!(pool.stats().buckets[0].available, 2);
    }

    #[test]
    fn into_vec_detaches_from_pool() {
        let pool = FramePool::<u8>::preallocated(&[8], 1);
        let mut buf = pool.try_get(4).unwrap();
        buf.fill(9);
        let v = buf.into_vec();
        assert_eq!(v, vec![9, 9, 9, 9]);
        assert_eq!(pool.stats().buckets[0].available, 0);
    }

    #[test]
    fn impossible_allocation_is_reported() {
        let pool = FramePool::<u8>::with_buckets(Vec::new(), 1);
        assert!(pool.try_get(usize::MAX).is_err());
    }
}
