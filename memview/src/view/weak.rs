/*!
Fixed size placeholders of views.
*/

use std::marker::PhantomData;
use std::{fmt, mem};

use super::View;
use crate::dataview::Pod;
use crate::types::Address;

/// The storage of a view declared as a member type.
///
/// A weak view is exactly `N` bytes large and knows nothing but its own location, which keeps
/// layouts finite even when views refer to each other. It becomes a strong view again through
/// [`to_strong`](Self::to_strong), which binds `V` to the address of the placeholder.
///
/// # Examples
///
/// ```
/// use memview::view::Weak;
/// use std::mem::size_of;
///
/// struct Node;
///
/// assert_eq!(size_of::<Weak<Node, 0x18>>(), 0x18);
/// assert_eq!(size_of::<[Weak<Node, 0x18>; 12]>(), 12 * 0x18);
/// ```
#[repr(C)]
pub struct Weak<V, const N: usize> {
    bytes: [u8; N],
    phantom_data: PhantomData<fn() -> V>,
}
unsafe impl<V: 'static, const N: usize> Pod for Weak<V, N> {}

impl<V, const N: usize> Weak<V, N> {
    /// Declared size of the view.
    pub const SIZE: usize = N;

    /// The address of this placeholder, which is the address of the wrapped object.
    #[inline]
    pub fn raw(&self) -> Address {
        Address::from_ptr(self as *const Self)
    }

    /// The bytes of the wrapped object.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<V: View, const N: usize> Weak<V, N> {
    /// Binds a strong view to the location of this placeholder.
    ///
    /// The placeholder stays usable afterwards.
    #[inline]
    pub fn to_strong(&self) -> V {
        // the identity resolver: the strong view starts where the placeholder lives
        unsafe { V::from_address(self.raw()) }
    }
}

impl<V, const N: usize> Copy for Weak<V, N> {}
impl<V, const N: usize> Clone for Weak<V, N> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, const N: usize> fmt::Debug for Weak<V, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Weak<{}, {:#x}> @ {:x}", mem::size_of::<Self>(), N, self.raw())
    }
}
