//! Memory primitives shared by the curvelet bridge: the native heap seam, native
//! container handles, caller-owned coefficient arrays and the ownership state
//! machine that moves buffers between them.
//!
//! Buffers flow through two lifecycles:
//! - inputs: `Unbound -> Borrowed -> Unbound` (caller memory, never freed here);
//! - outputs: `NativeOwned -> BridgeOwned -> CallerOwned -> Released`.
//!
//! Each step is a move of a non-`Clone` value ([`NativeArray`] ->
//! [`NativeAllocation`] -> [`CoeffArray`]), so at any point exactly one value is
//! responsible for releasing a region.

pub use num_complex::Complex64;

pub mod coeff_array;
pub mod heap;
pub mod layout;
pub mod native_array;
pub mod state;

pub use coeff_array::{CoeffArray, CoeffSource};
pub use heap::{
    MemoryAllocation, MemoryOwner, NativeAllocation, NativeHeap, NativeHeapRef, SystemHeap,
};
pub use layout::Layout;
pub use native_array::{CpxNumMat, CpxNumTns, NativeArray, NativeRagged};
pub use state::{BufferState, Ownership};
