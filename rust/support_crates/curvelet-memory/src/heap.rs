//! The native allocator seam and the one-shot owner of a native allocation.

use std::{ptr::NonNull, sync::Arc};

use num_complex::Complex64;

use crate::state::BufferState;

/// Allocator used by the native library for its containers.
///
/// The bridge never frees native memory with its own allocator: every region the
/// native library hands over is returned to the heap that produced it.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `allocate(len)` returns a pointer valid for reads and writes of `len`
///   zero-initialized elements, suitably aligned for `Complex64`, and never null
///   (zero-length requests may return a dangling, well-aligned pointer);
/// - `release(ptr, len)` accepts exactly the pointers returned by `allocate` on
///   the same heap, each once, with the same `len`.
pub unsafe trait NativeHeap: Send + Sync {
    /// Allocates `len` zeroed elements.
    fn allocate(&self, len: usize) -> *mut Complex64;

    /// Returns a region to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `self.allocate(len)` and not released since.
    unsafe fn release(&self, ptr: *mut Complex64, len: usize);

    /// Short name used in log records.
    fn name(&self) -> &str {
        "native"
    }
}

/// Shared handle to the heap a native library allocates from.
pub type NativeHeapRef = Arc<dyn NativeHeap>;

/// Heap backed by the Rust global allocator, one boxed slice per allocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHeap;

impl SystemHeap {
    pub fn shared() -> NativeHeapRef {
        Arc::new(SystemHeap)
    }
}

unsafe impl NativeHeap for SystemHeap {
    fn allocate(&self, len: usize) -> *mut Complex64 {
        let boxed: Box<[Complex64]> = vec![Complex64::new(0.0, 0.0); len].into_boxed_slice();
        Box::into_raw(boxed).cast::<Complex64>()
    }

    unsafe fn release(&self, ptr: *mut Complex64, len: usize) {
        let slice = std::ptr::slice_from_raw_parts_mut(ptr, len);
        drop(unsafe { Box::from_raw(slice) });
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Describes an owned, immutable region of complex elements.
#[derive(Debug, Clone, Copy)]
pub struct MemoryAllocation {
    /// Pointer to the first element. Non-null and aligned, dangling when `len == 0`.
    pub ptr: *const Complex64,
    /// Number of elements.
    pub len: usize,
}

/// Trait for types that own the memory behind a caller-facing array.
///
/// # Safety
///
/// Implementors must guarantee that the memory returned by `memory()` stays valid,
/// immutable and at the same address for the entire lifetime of the owner.
pub unsafe trait MemoryOwner {
    /// Returns information about the owned memory block.
    fn memory(&self) -> MemoryAllocation;
}

unsafe impl MemoryOwner for Vec<Complex64> {
    fn memory(&self) -> MemoryAllocation {
        MemoryAllocation {
            ptr: self.as_ptr(),
            len: self.len(),
        }
    }
}

/// A region allocated by a [`NativeHeap`], detached from the native container that
/// produced it.
///
/// This is the release callback of a caller-facing array: dropping it returns the
/// region to its heap, exactly once. It cannot be cloned; sharing goes through an
/// `Arc` around it.
pub struct NativeAllocation {
    /// Null for regions the native side represented without memory (zero elements).
    ptr: *mut Complex64,
    len: usize,
    heap: NativeHeapRef,
    state: BufferState,
}

impl NativeAllocation {
    /// Takes responsibility for a native region.
    ///
    /// # Safety
    ///
    /// `ptr` must be null (then `len` must be 0) or have been returned by
    /// `heap.allocate(len)`, and no other value may release it.
    pub unsafe fn from_raw(ptr: *mut Complex64, len: usize, heap: NativeHeapRef) -> Self {
        assert!(!ptr.is_null() || len == 0, "null native region with {len} elements");
        NativeAllocation {
            ptr,
            len,
            heap,
            state: BufferState::BridgeOwned,
        }
    }

    /// Number of elements in the region.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Records that the region now backs a caller-facing array.
    pub fn hand_to_caller(&mut self) {
        self.state.advance(BufferState::CallerOwned);
    }

    #[inline]
    fn data_ptr(&self) -> *const Complex64 {
        if self.ptr.is_null() {
            NonNull::<Complex64>::dangling().as_ptr()
        } else {
            self.ptr
        }
    }
}

unsafe impl MemoryOwner for NativeAllocation {
    fn memory(&self) -> MemoryAllocation {
        MemoryAllocation {
            ptr: self.data_ptr(),
            len: self.len,
        }
    }
}

impl Drop for NativeAllocation {
    fn drop(&mut self) {
        self.state.advance(BufferState::Released);
        if !self.ptr.is_null() {
            log::trace!(
                "releasing {} elements at {:p} to {} heap",
                self.len,
                self.ptr,
                self.heap.name()
            );
            unsafe { self.heap.release(self.ptr, self.len) };
            self.ptr = std::ptr::null_mut();
        }
    }
}

// SAFETY: the region is uniquely owned by this value and never mutated through it;
// the heap itself is `Send + Sync`.
unsafe impl Send for NativeAllocation {}

unsafe impl Sync for NativeAllocation {}

impl std::fmt::Debug for NativeAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAllocation")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("heap", &self.heap.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct TallyHeap {
        allocated: AtomicUsize,
        released: AtomicUsize,
    }

    unsafe impl NativeHeap for TallyHeap {
        fn allocate(&self, len: usize) -> *mut Complex64 {
            self.allocated.fetch_add(1, Ordering::SeqCst);
            SystemHeap.allocate(len)
        }

        unsafe fn release(&self, ptr: *mut Complex64, len: usize) {
            self.released.fetch_add(1, Ordering::SeqCst);
            unsafe { SystemHeap.release(ptr, len) }
        }
    }

    #[test]
    fn test_system_heap_zeroed() {
        let heap = SystemHeap;
        let ptr = heap.allocate(16);
        assert!(!ptr.is_null());
        let slice = unsafe { std::slice::from_raw_parts(ptr, 16) };
        assert!(slice.iter().all(|c| *c == Complex64::new(0.0, 0.0)));
        unsafe { heap.release(ptr, 16) };

        let empty = heap.allocate(0);
        assert!(!empty.is_null());
        unsafe { heap.release(empty, 0) };
    }

    #[test]
    fn test_allocation_released_once() {
        let tally = Arc::new(TallyHeap::default());
        let heap: NativeHeapRef = tally.clone();
        let ptr = heap.allocate(8);
        let mut allocation = unsafe { NativeAllocation::from_raw(ptr, 8, heap) };
        assert_eq!(allocation.state(), BufferState::BridgeOwned);
        allocation.hand_to_caller();
        assert_eq!(allocation.memory().len, 8);
        drop(allocation);
        assert_eq!(tally.allocated.load(Ordering::SeqCst), 1);
        assert_eq!(tally.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_allocation_is_not_released() {
        let tally = Arc::new(TallyHeap::default());
        let allocation =
            unsafe { NativeAllocation::from_raw(std::ptr::null_mut(), 0, tally.clone()) };
        assert!(!allocation.memory().ptr.is_null());
        drop(allocation);
        assert_eq!(tally.released.load(Ordering::SeqCst), 0);
    }
}
