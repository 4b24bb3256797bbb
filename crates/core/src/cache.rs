use crate::models::{ImageHandle, PageImage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Bounded handle -> page image store with first-in-first-out eviction.
///
/// Reads never refresh an entry's position, and overwriting an existing
/// handle keeps the position of its first insertion. Clones share storage.
#[derive(Debug, Clone)]
pub struct ImageCache {
    state: Arc<Mutex<CacheState>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ImageHandle, PageImage>,
    order: VecDeque<ImageHandle>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ImageCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts or overwrites `handle`, returning the handle evicted to make room.
    pub fn put(&self, handle: ImageHandle, image: PageImage) -> Option<ImageHandle> {
        let mut state = self.state.lock();

        if let Some(existing) = state.entries.get_mut(&handle) {
            *existing = image;
            return None;
        }

        let mut evicted = None;
        if state.entries.len() >= self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                debug!(handle = %oldest, "evicted cached page image");
                evicted = Some(oldest);
            }
        }

        state.order.push_back(handle.clone());
        state.entries.insert(handle, image);
        evicted
    }

    pub fn get(&self, handle: &str) -> Option<PageImage> {
        self.state.lock().entries.get(handle).cloned()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.state.lock().entries.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles from oldest to newest insertion.
    pub fn handles(&self) -> Vec<ImageHandle> {
        self.state.lock().order.iter().cloned().collect()
    }
}
