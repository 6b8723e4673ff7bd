//! Control transfer into the execution window
//!
//! Loaded code runs with full privileges and no memory protection. It can
//! read and write anything the host can; the capability table is a
//! convention, not a fence. If it never returns, neither does the caller.

#![allow(unsafe_code)]

use palimpsest_abi::{CapabilityTable, ModuleEntryFn};

/// Transfers control to freshly placed code
pub trait EntryPoint {
    /// Call the placed function with the capability table and module id
    fn enter(&mut self, table: &CapabilityTable, module_id: u32);
}

impl<T: EntryPoint + ?Sized> EntryPoint for &mut T {
    fn enter(&mut self, table: &CapabilityTable, module_id: u32) {
        (**self).enter(table, module_id)
    }
}

/// Calls the function at a fixed window address
#[derive(Debug, Clone, Copy)]
pub struct WindowEntry {
    address: u32,
}

impl WindowEntry {
    /// Create an entry for `address` (Thumb bit included where needed)
    ///
    /// # Safety
    ///
    /// Every call to [`EntryPoint::enter`] jumps to `address`. The caller
    /// must only enter after a load has succeeded, so that the window holds
    /// a verified function compiled for [`ModuleEntryFn`].
    pub const unsafe fn new(address: u32) -> Self {
        Self { address }
    }
}

impl EntryPoint for WindowEntry {
    fn enter(&mut self, table: &CapabilityTable, module_id: u32) {
        // SAFETY: the constructor's contract guarantees a verified function
        // of this signature lives at `address`.
        let entry: ModuleEntryFn =
            unsafe { core::mem::transmute::<usize, ModuleEntryFn>(self.address as usize) };
        entry(table as *const CapabilityTable, module_id);
    }
}
