/*!
The per-member handle.
*/

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::{fmt, ptr};

use super::{Aggregate, Binding, Declare, Enumeration, Member, Parent, View};
use crate::dispatch::{compile, Specialization};
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::Address;

/// A member of a view with the declared type `T`.
///
/// The field holds nothing but its binding. Every access resolves the address again and
/// reinterprets it as `T::Storage`. The operations a field exposes depend on `T`: numeric
/// fields forward arithmetic, bitwise, comparison and logical operators, arrays and pointers
/// forward subscripting and pointer arithmetic, aggregates forward member access and view typed
/// fields can be turned into strong views.
///
/// Assigning one field to another with `=` rebinds the handle. Use [`set`](Self::set) or
/// [`assign`](Self::assign) to copy the foreign value instead.
pub struct Field<T> {
    binding: Binding,
    phantom_data: PhantomData<fn() -> T>,
}

impl<T> Copy for Field<T> {}
impl<T> Clone for Field<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Declare> Field<T> {
    /// Creates a field bound to `parent` through `resolver`.
    ///
    /// # Safety
    ///
    /// The resolved address must point to valid storage of `T::Storage` whenever the field is
    /// accessed.
    #[inline]
    pub unsafe fn new(parent: Parent, resolver: Resolver) -> Self {
        Self::from_binding(Binding::new(parent, resolver))
    }

    /// Creates a free standing field at a fixed address.
    ///
    /// # Safety
    ///
    /// See [`new`](Self::new).
    #[inline]
    pub unsafe fn at(address: Address) -> Self {
        Self::from_binding(Binding::absolute(address))
    }

    /// # Safety
    ///
    /// See [`new`](Self::new).
    #[inline]
    pub unsafe fn from_binding(binding: Binding) -> Self {
        Self {
            binding,
            phantom_data: PhantomData,
        }
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// The resolved address of the wrapped storage.
    #[inline]
    pub fn address(&self) -> Address {
        self.binding.resolve()
    }

    /// The address of this handle.
    pub fn address_of_field(&self) -> *const Self {
        self as *const Self
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T::Storage {
        self.address().as_mut_ptr()
    }

    /// A mutable reference to the wrapped storage.
    #[inline]
    pub fn value_ref(&mut self) -> &mut T::Storage {
        let address = self.address();
        debug_assert!(address.is_aligned_for::<T::Storage>());
        unsafe { &mut *address.as_mut_ptr() }
    }

    /// A shared reference to the wrapped storage.
    #[inline]
    pub fn value_cref(&self) -> &T::Storage {
        let address = self.address();
        debug_assert!(address.is_aligned_for::<T::Storage>());
        unsafe { &*address.as_ptr() }
    }

    /// Reads the wrapped value. Unaligned storage is supported.
    #[inline]
    pub fn get(&self) -> T::Storage {
        unsafe { ptr::read_unaligned(self.as_ptr()) }
    }

    /// Overwrites the wrapped value. Unaligned storage is supported.
    #[inline]
    pub fn set(&mut self, value: T::Storage) {
        unsafe { ptr::write_unaligned(self.as_ptr(), value) }
    }

    /// Copies the value behind `other` into this field.
    #[inline]
    pub fn assign(&mut self, other: &Field<T>) {
        self.set(other.get())
    }

    /// Rewritten descriptor and specialization of `T`.
    ///
    /// Typed fields cannot be declared with invalid types, so this only fails for views that
    /// are declared without a size through a manual [`Declare`] implementation.
    pub fn specialization() -> Result<Specialization> {
        compile(&T::declared()).map(|(_, specialization)| specialization)
    }
}

impl<T: Declare> Member for Field<T> {
    #[inline]
    unsafe fn bind(parent: Parent, resolver: Resolver) -> Self {
        Self::new(parent, resolver)
    }
}

impl<T: Declare> fmt::Debug for Field<T>
where
    T::Storage: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} @ {:x}", self.get(), self.address())
    }
}

/// Member access forwarding.
impl<T: Aggregate> Deref for Field<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value_cref()
    }
}

impl<T: Aggregate> DerefMut for Field<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.value_ref()
    }
}

impl<V: View + Declare> Field<V> {
    /// Binds a strong view to the weak placeholder of this field.
    #[inline]
    pub fn to_strong(&self) -> V {
        unsafe { V::from_address(self.address()) }
    }

    /// The address of the weak placeholder.
    #[inline]
    pub fn raw(&self) -> Address {
        self.address()
    }
}

impl<E: Enumeration> Field<E> {
    /// The same member viewed as its underlying integer.
    #[inline]
    pub fn as_repr(&self) -> Field<E::Repr> {
        unsafe { Field::from_binding(self.binding) }
    }

    /// Reads the enumeration. Returns `None` for values without a variant.
    pub fn value(&self) -> Option<E> {
        E::from_repr(self.as_repr().get())
    }

    pub fn set_value(&mut self, value: E) {
        self.as_repr().set(value.to_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Capabilities, Category};

    #[test]
    fn get_set_round_trip() {
        let mut backing = [0u32; 4];
        let base = Address::from_ptr(backing.as_mut_ptr());
        let mut field =
            unsafe { Field::<u32>::new(Parent::Object(base), Resolver::offset(8)) };

        field.set(0xdead_beef);
        assert_eq!(field.get(), 0xdead_beef);
        assert_eq!(*field.value_cref(), 0xdead_beef);
        *field.value_ref() = 7;
        assert_eq!(backing[2], 7);
    }

    #[test]
    fn every_access_resolves() {
        let backing = [1u16, 2, 3];
        let field = unsafe { Field::<u16>::at(Address::from_ptr(&backing[1])) };
        assert_eq!(field.address(), Address::from_ptr(&backing[1]));
        assert_eq!(field.get(), 2);
        assert_ne!(
            field.address_of_field() as usize,
            field.address().to_usize()
        );
    }

    #[test]
    fn unaligned_access() {
        let mut backing = [0u8; 9];
        let mut field = unsafe { Field::<u64>::at(Address::from_ptr(&mut backing[1])) };
        field.set(0x0102_0304_0506_0708);
        assert_eq!(field.get(), 0x0102_0304_0506_0708);
        assert_eq!(backing[0], 0);
        backing[0] = 0xff;
        assert_eq!(field.get(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn assign_copies_value() {
        let mut backing = [5i32, 9];
        let base = Address::from_ptr(backing.as_mut_ptr());
        let mut a = unsafe { Field::<i32>::new(Parent::Object(base), Resolver::offset(0)) };
        let b = unsafe { Field::<i32>::new(Parent::Object(base), Resolver::offset(4)) };

        a.assign(&b);
        assert_eq!(a.get(), 9);
        assert_eq!(a.address(), base);
        backing[1] = 1;
        assert_eq!(backing[0], 9);
    }

    #[test]
    fn typed_specializations() {
        let numeric = Field::<i16>::specialization().unwrap();
        assert_eq!(numeric.category(), Category::Numeric);

        let array = Field::<[u8; 12]>::specialization().unwrap();
        assert_eq!(array.category(), Category::Array);
        assert_eq!(array.size(), 12);

        let pointer = Field::<crate::types::Ptr<f64>>::specialization().unwrap();
        assert_eq!(pointer.stride(), 8);
        assert!(pointer.supports(Capabilities::INDIRECTION));

        let boolean = Field::<bool>::specialization().unwrap();
        assert!(!boolean.supports(Capabilities::BIT_NOT));
    }
}
