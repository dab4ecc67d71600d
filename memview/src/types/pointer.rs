/*!
Pointer stored inside foreign memory.
*/

use crate::dataview::Pod;
use crate::types::Address;

use std::marker::PhantomData;
use std::mem::size_of;
use std::{cmp, fmt, hash};

const _: [(); std::mem::size_of::<Ptr<()>>()] = [(); std::mem::size_of::<usize>()];
const _: [(); std::mem::size_of::<Ptr<[u8; 0x40]>>()] = [(); std::mem::size_of::<usize>()];

/// A pointer as it is laid out inside foreign memory.
///
/// `Ptr` is exactly pointer sized and carries its pointee type only as a phantom.
/// Element arithmetic uses `size_of::<T>()` as stride, which for pointers to views is the
/// declared size of the view (see [`Weak`](crate::view::Weak)).
///
/// # Examples
///
/// ```
/// use memview::types::Ptr;
///
/// let ptr = Ptr::<u16>::from(0x1000usize);
/// assert_eq!(ptr.add(3).to_usize(), 0x1006);
/// assert_eq!(ptr.add(3).offset_from(ptr), 3);
/// ```
#[repr(transparent)]
pub struct Ptr<T: ?Sized = ()> {
    pub inner: usize,
    phantom_data: PhantomData<fn() -> T>,
}
unsafe impl<T: ?Sized + 'static> Pod for Ptr<T> {}

impl<T: ?Sized> Ptr<T> {
    /// Returns a pointer with a value of zero.
    #[inline]
    pub const fn null() -> Self {
        Ptr {
            inner: 0,
            phantom_data: PhantomData,
        }
    }

    /// Returns `true` if the pointer is null.
    #[inline]
    pub fn is_null(self) -> bool {
        self.inner == 0
    }

    /// Converts the pointer to an Option that is None when it is null
    #[inline]
    pub fn non_null(self) -> Option<Ptr<T>> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self.inner
    }

    /// Returns the address this pointer holds.
    #[inline]
    pub fn address(&self) -> Address {
        Address::from(self.inner)
    }

    /// Reinterprets the pointee type.
    #[inline]
    pub fn cast<U: ?Sized>(self) -> Ptr<U> {
        Ptr {
            inner: self.inner,
            phantom_data: PhantomData,
        }
    }
}

impl<T: Sized> Ptr<T> {
    /// Calculates the offset from a pointer in units of `T`.
    ///
    /// A `count` of 3 represents a pointer offset of `3 * size_of::<T>()` bytes.
    /// Zero sized pointees never move the pointer.
    pub fn offset(self, count: isize) -> Self {
        let bytes = (size_of::<T>() as isize).wrapping_mul(count);
        Ptr {
            inner: self.inner.wrapping_add(bytes as usize),
            phantom_data: PhantomData,
        }
    }

    /// Calculates the distance between two pointers in units of `T`.
    ///
    /// This function is the inverse of [`offset`](Self::offset). Zero sized pointees yield 0.
    pub fn offset_from(self, origin: Self) -> isize {
        let pointee_size = size_of::<T>() as isize;
        if pointee_size == 0 {
            return 0;
        }
        (self.inner.wrapping_sub(origin.inner) as isize) / pointee_size
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, count: usize) -> Self {
        self.offset(count as isize)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, count: usize) -> Self {
        self.offset((count as isize).wrapping_neg())
    }

    /// Returns the address of the `i`-th element behind this pointer.
    #[inline]
    pub fn at(self, i: usize) -> Address {
        self.add(i).address()
    }

    /// Reinterprets the pointer as a raw mutable pointer.
    #[inline]
    pub fn as_mut_ptr(self) -> *mut T {
        self.address().as_mut_ptr()
    }
}

impl<T: ?Sized> Copy for Ptr<T> {}
impl<T: ?Sized> Clone for Ptr<T> {
    #[inline(always)]
    fn clone(&self) -> Ptr<T> {
        *self
    }
}
impl<T: ?Sized> Default for Ptr<T> {
    #[inline(always)]
    fn default() -> Ptr<T> {
        Ptr::null()
    }
}
impl<T: ?Sized> Eq for Ptr<T> {}
impl<T: ?Sized> PartialEq for Ptr<T> {
    #[inline(always)]
    fn eq(&self, rhs: &Ptr<T>) -> bool {
        self.inner == rhs.inner
    }
}
impl<T: ?Sized> PartialOrd for Ptr<T> {
    #[inline(always)]
    fn partial_cmp(&self, rhs: &Ptr<T>) -> Option<cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}
impl<T: ?Sized> Ord for Ptr<T> {
    #[inline(always)]
    fn cmp(&self, rhs: &Ptr<T>) -> cmp::Ordering {
        self.inner.cmp(&rhs.inner)
    }
}
impl<T: ?Sized> hash::Hash for Ptr<T> {
    #[inline(always)]
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}

impl<T: ?Sized> From<usize> for Ptr<T> {
    #[inline(always)]
    fn from(inner: usize) -> Ptr<T> {
        Ptr {
            inner,
            phantom_data: PhantomData,
        }
    }
}

impl<T: ?Sized> From<Address> for Ptr<T> {
    #[inline(always)]
    fn from(address: Address) -> Ptr<T> {
        Ptr::from(address.to_usize())
    }
}

impl<T> From<*const T> for Ptr<T> {
    #[inline(always)]
    fn from(ptr: *const T) -> Ptr<T> {
        Ptr::from(ptr as usize)
    }
}

impl<T> From<*mut T> for Ptr<T> {
    #[inline(always)]
    fn from(ptr: *mut T) -> Ptr<T> {
        Ptr::from(ptr as usize)
    }
}

impl<T: ?Sized> From<Ptr<T>> for Address {
    #[inline(always)]
    fn from(ptr: Ptr<T>) -> Address {
        ptr.address()
    }
}

impl<T: ?Sized> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.inner)
    }
}
impl<T: ?Sized> fmt::UpperHex for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}", self.inner)
    }
}
impl<T: ?Sized> fmt::LowerHex for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.inner)
    }
}
impl<T: ?Sized> fmt::Display for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.inner)
    }
}
