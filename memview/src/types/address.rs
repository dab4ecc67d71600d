/*!
Abstraction over an address in the memory a view describes.
*/

use std::default::Default;
use std::fmt;
use std::ops;

/// Size in bytes of a pointer inside foreign memory.
///
/// Views describe memory mapped into the current address space, so this always equals the host
/// pointer width.
pub const POINTER_SIZE: usize = core::mem::size_of::<usize>();

/// This type represents an address inside the memory a view operates on.
/// It internally holds a `usize` value and can be converted from raw pointers and integers.
///
/// Most operations on an `Address` are plain integer arithmetic and never touch the memory
/// the address points to. Only the explicitly `unsafe` accessors read from it.
///
/// # Examples
///
/// ```
/// use memview::types::Address;
///
/// let value = 0xcafe_u32;
/// let addr = Address::from_ptr(&value);
/// assert_eq!(unsafe { *addr.as_ptr::<u32>() }, 0xcafe);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(usize);

impl Address {
    /// A address with the value of zero.
    pub const NULL: Address = Address(0);

    /// A address with an invalid value.
    pub const INVALID: Address = Address(!0);

    /// Returns an address with a value of zero.
    #[inline]
    pub const fn null() -> Self {
        Address::NULL
    }

    /// Checks whether the address is zero or not.
    ///
    /// # Examples
    ///
    /// ```
    /// use memview::types::Address;
    ///
    /// assert!(Address::null().is_null());
    /// assert!(!Address::from(0x1000usize).is_null());
    /// ```
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Converts the address to an Option that is None when it is null
    #[inline]
    pub fn non_null(self) -> Option<Address> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    /// Checks whether the address is valid or not.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != !0
    }

    /// Creates an address from a reference or raw pointer.
    #[inline]
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Address(ptr as *const u8 as usize)
    }

    /// Converts the address into a usize value.
    #[inline]
    pub const fn to_usize(self) -> usize {
        self.0
    }

    /// Reinterprets the address as a const pointer to `T`.
    #[inline]
    pub fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Reinterprets the address as a mutable pointer to `T`.
    #[inline]
    pub fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    /// Moves the address by a signed amount of bytes, wrapping around on overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use memview::types::Address;
    ///
    /// assert_eq!(Address::from(0x100usize).offset(-0x10), Address::from(0xf0usize));
    /// ```
    #[inline]
    pub const fn offset(self, bytes: isize) -> Self {
        Address(self.0.wrapping_add(bytes as usize))
    }

    #[inline]
    pub const fn wrapping_add(self, other: usize) -> Self {
        Address(self.0.wrapping_add(other))
    }

    #[inline]
    pub const fn wrapping_sub(self, other: usize) -> Self {
        Address(self.0.wrapping_sub(other))
    }

    /// Checks whether the address is aligned for values of type `T`.
    #[inline]
    pub const fn is_aligned_for<T>(self) -> bool {
        self.0 % core::mem::align_of::<T>() == 0
    }

    /// Reads a pointer sized value stored at this address.
    ///
    /// # Safety
    ///
    /// The address has to point to at least `POINTER_SIZE` readable bytes.
    #[inline]
    pub unsafe fn read_address(self) -> Address {
        Address(core::ptr::read_unaligned(self.as_ptr::<usize>()))
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::null()
    }
}

macro_rules! impl_address_from {
    ($type_name:ident) => {
        impl From<$type_name> for Address {
            fn from(item: $type_name) -> Self {
                Self(item as usize)
            }
        }
    };
}

impl_address_from!(u8);
impl_address_from!(u16);
impl_address_from!(u32);
impl_address_from!(usize);

#[cfg(target_pointer_width = "64")]
impl_address_from!(u64);

impl<T> From<*const T> for Address {
    fn from(ptr: *const T) -> Self {
        Self::from_ptr(ptr)
    }
}

impl<T> From<*mut T> for Address {
    fn from(ptr: *mut T) -> Self {
        Self::from_ptr(ptr)
    }
}

impl From<Address> for usize {
    fn from(address: Address) -> usize {
        address.0
    }
}

impl ops::Add<usize> for Address {
    type Output = Self;

    fn add(self, other: usize) -> Self {
        self.wrapping_add(other)
    }
}

impl ops::AddAssign<usize> for Address {
    fn add_assign(&mut self, other: usize) {
        *self = self.wrapping_add(other)
    }
}

impl ops::Sub<usize> for Address {
    type Output = Self;

    fn sub(self, other: usize) -> Self {
        self.wrapping_sub(other)
    }
}

impl ops::SubAssign<usize> for Address {
    fn sub_assign(&mut self, other: usize) {
        *self = self.wrapping_sub(other)
    }
}

/// Subtracts a `Address` from a `Address` resulting in a signed byte distance.
///
/// # Examples
///
/// ```
/// use memview::types::Address;
///
/// assert_eq!(Address::from(5usize) - Address::from(10usize), -5);
/// ```
impl ops::Sub for Address {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        self.0.wrapping_sub(other.0) as isize
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}
impl fmt::UpperHex for Address {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}
impl fmt::LowerHex for Address {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}
