//! Ownership tags carried by native handles and native allocations.

/// Who is responsible for releasing a buffer's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// A view over memory owned elsewhere; never freed by its holder.
    Borrowed,
    /// Its holder must eventually release the memory.
    Owned,
}

/// Position of a buffer in its lifecycle.
///
/// Inputs go `Unbound -> Borrowed -> Unbound`. Outputs go
/// `NativeOwned -> BridgeOwned -> CallerOwned -> Released`, with the shortcut
/// `NativeOwned | BridgeOwned -> Released` when a call is abandoned before the
/// buffer reached the caller. Transitions never go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferState {
    Unbound,
    Borrowed,
    NativeOwned,
    BridgeOwned,
    CallerOwned,
    Released,
}

impl BufferState {
    /// Returns `true` if `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: BufferState) -> bool {
        use BufferState::*;
        matches!(
            (self, next),
            (Unbound, Borrowed)
                | (Borrowed, Unbound)
                | (Unbound, NativeOwned)
                | (NativeOwned, BridgeOwned)
                | (NativeOwned, Released)
                | (BridgeOwned, CallerOwned)
                | (BridgeOwned, Released)
                | (CallerOwned, Released)
        )
    }

    /// Moves to `next`.
    ///
    /// # Panics
    ///
    /// Panics on an illegal transition.
    #[inline]
    pub fn advance(&mut self, next: BufferState) {
        assert!(
            self.can_advance_to(next),
            "illegal buffer state transition: {self:?} -> {next:?}"
        );
        *self = next;
    }

    /// Ownership mode implied by the state, if the buffer is bound to a holder.
    pub fn ownership(self) -> Option<Ownership> {
        match self {
            BufferState::Borrowed => Some(Ownership::Borrowed),
            BufferState::NativeOwned | BufferState::BridgeOwned | BufferState::CallerOwned => {
                Some(Ownership::Owned)
            }
            BufferState::Unbound | BufferState::Released => None,
        }
    }
}
