/*!
Instances of views backed by memory this crate allocates.

Views normally describe memory someone else owns. [`Owned`] allocates zeroed storage of the
declared size instead and binds the view to it, which is useful for building objects that are
handed to foreign code, and for tests.
*/

use std::prelude::v1::*;

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::{fmt, slice};

use super::SizedView;
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::types::Address;

use log::trace;

/// Alignment of owned storage. Large enough for every scalar member.
const STORAGE_ALIGN: usize = 16;

/// Hooks run when an [`Owned`] instance is created and dropped.
pub trait Instantiate: SizedView {
    /// Runs after the storage was allocated and zeroed.
    fn construct(&mut self) {}

    /// Runs before the storage is freed.
    fn destruct(&mut self) {}
}

/// A view bound to zero initialized storage of `V::SIZE` bytes owned by this value.
pub struct Owned<V: Instantiate> {
    storage: NonNull<u8>,
    layout: Layout,
    view: V,
}

impl<V: Instantiate> Owned<V> {
    /// Allocates the storage and runs [`Instantiate::construct`].
    pub fn new() -> Result<Self> {
        Self::with(V::construct)
    }

    /// Allocates the storage and runs `init` instead of [`Instantiate::construct`].
    pub fn with<F: FnOnce(&mut V)>(init: F) -> Result<Self> {
        if V::SIZE == 0 {
            return Err(Error(ErrorOrigin::View, ErrorKind::ZeroSized));
        }

        let layout = Layout::from_size_align(V::SIZE, STORAGE_ALIGN)
            .map_err(|err| Error(ErrorOrigin::View, ErrorKind::OutOfBounds).log_debug(err))?;

        let storage = NonNull::new(unsafe { alloc_zeroed(layout) })
            .ok_or_else(|| Error(ErrorOrigin::View, ErrorKind::Unknown).log_error("allocation failed"))?;

        let view = unsafe { V::from_address(Address::from_ptr(storage.as_ptr())) };
        let mut owned = Self {
            storage,
            layout,
            view,
        };
        trace!("allocated {} bytes at {:x}", V::SIZE, owned.address());

        init(&mut owned.view);
        Ok(owned)
    }

    /// Address of the owned storage.
    pub fn address(&self) -> Address {
        Address::from_ptr(self.storage.as_ptr())
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), self.layout.size()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.storage.as_ptr(), self.layout.size()) }
    }
}

impl<V: Instantiate> Deref for Owned<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.view
    }
}

impl<V: Instantiate> DerefMut for Owned<V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

impl<V: Instantiate> Drop for Owned<V> {
    fn drop(&mut self) {
        self.view.destruct();
        unsafe { dealloc(self.storage.as_ptr(), self.layout) };
    }
}

impl<V: Instantiate> fmt::Debug for Owned<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Owned({} bytes @ {:x})", self.layout.size(), self.address())
    }
}
