//! A native heap that audits its allocations.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use curvelet_memory::{NativeHeap, SystemHeap};
use num_complex::Complex64;

/// Heap backed by [`SystemHeap`] that records every live region.
///
/// Releasing a pointer it never handed out, or releasing one twice, panics.
/// Zero-length regions may share an address, so live regions are counted per
/// `(address, len)`.
#[derive(Default)]
pub struct CountingHeap {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    live: Mutex<HashMap<(usize, usize), usize>>,
}

impl CountingHeap {
    pub fn new() -> CountingHeap {
        CountingHeap::default()
    }

    /// A new heap, ready to be cloned into a `NativeHeapRef`.
    pub fn shared() -> Arc<CountingHeap> {
        Arc::new(CountingHeap::new())
    }

    /// Number of `allocate` calls so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Number of `release` calls so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Number of regions allocated and not yet released.
    pub fn live(&self) -> usize {
        self.live.lock().unwrap().values().sum()
    }

    /// Panics unless every allocated region has been released.
    #[track_caller]
    pub fn assert_balanced(&self) {
        let live = self.live();
        assert_eq!(
            live,
            0,
            "{live} native regions still live ({} allocated, {} released)",
            self.allocations(),
            self.releases()
        );
    }
}

unsafe impl NativeHeap for CountingHeap {
    fn allocate(&self, len: usize) -> *mut Complex64 {
        let ptr = SystemHeap.allocate(len);
        self.allocations.fetch_add(1, Ordering::SeqCst);
        *self
            .live
            .lock()
            .unwrap()
            .entry((ptr as usize, len))
            .or_default() += 1;
        ptr
    }

    unsafe fn release(&self, ptr: *mut Complex64, len: usize) {
        {
            let mut live = self.live.lock().unwrap();
            let key = (ptr as usize, len);
            match live.get_mut(&key) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    live.remove(&key);
                }
                None => panic!("release of unknown or already released region {ptr:p} ({len})"),
            }
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
        unsafe { SystemHeap.release(ptr, len) };
    }

    fn name(&self) -> &str {
        "counting"
    }
}

impl std::fmt::Debug for CountingHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingHeap")
            .field("allocations", &self.allocations())
            .field("releases", &self.releases())
            .field("live", &self.live())
            .finish()
    }
}
