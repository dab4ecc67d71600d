/*!
Subscripting and pointer arithmetic for array and pointer fields.

Arrays are indexed from their own resolved address. Pointer fields hold a pointer value in
foreign memory; their elements are reached by following that value, which is why element access
on pointers is `unsafe` while element access on arrays is not.
*/

use std::mem::size_of;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use super::{Declare, Field};
use crate::types::{Address, Ptr};

impl<T: Declare, const N: usize> Field<[T; N]> {
    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Distance in bytes between consecutive elements.
    #[inline]
    pub const fn stride(&self) -> usize {
        size_of::<T::Storage>()
    }

    /// A pointer to the first element.
    #[inline]
    pub fn as_pointer(&self) -> Ptr<T::Storage> {
        Ptr::from(self.address())
    }

    /// The `i`-th element as a field of its own.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn element(&self, i: usize) -> Field<T> {
        assert!(i < N, "index {} out of bounds for array of length {}", i, N);
        unsafe { Field::at(self.as_pointer().at(i)) }
    }

    /// The first element.
    #[inline]
    pub fn indirection(&self) -> Field<T> {
        self.element(0)
    }

    /// Iterates over all elements as fields.
    pub fn elements(&self) -> impl Iterator<Item = Field<T>> {
        let first = self.as_pointer();
        (0..N).map(move |i| unsafe { Field::at(first.at(i)) })
    }
}

impl<T: Declare, const N: usize> Index<usize> for Field<[T; N]> {
    type Output = T::Storage;

    #[inline]
    fn index(&self, i: usize) -> &T::Storage {
        &self.value_cref()[i]
    }
}

impl<T: Declare, const N: usize> IndexMut<usize> for Field<[T; N]> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T::Storage {
        &mut self.value_ref()[i]
    }
}

impl<T: Declare, const N: usize> Add<usize> for Field<[T; N]> {
    type Output = Ptr<T::Storage>;

    #[inline]
    fn add(self, rhs: usize) -> Ptr<T::Storage> {
        self.as_pointer().add(rhs)
    }
}

impl<T: Declare, const N: usize> Sub<usize> for Field<[T; N]> {
    type Output = Ptr<T::Storage>;

    #[inline]
    fn sub(self, rhs: usize) -> Ptr<T::Storage> {
        self.as_pointer().sub(rhs)
    }
}

/// Element distance between two arrays.
impl<T: Declare, const N: usize> Sub for Field<[T; N]> {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Self) -> isize {
        self.as_pointer().offset_from(rhs.as_pointer())
    }
}

impl<T: Declare> Field<Ptr<T>> {
    /// The stored pointer value.
    #[inline]
    pub fn pointer(&self) -> Ptr<T::Storage> {
        self.get()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.get().is_null()
    }

    /// Distance in bytes between consecutive pointees.
    #[inline]
    pub const fn stride(&self) -> usize {
        size_of::<T::Storage>()
    }

    /// The `i`-th element behind the stored pointer.
    ///
    /// # Safety
    ///
    /// The stored pointer must point to at least `i + 1` valid elements whenever the returned
    /// field is accessed.
    #[inline]
    pub unsafe fn element(&self, i: usize) -> Field<T> {
        Field::at(self.get().at(i))
    }

    /// The element the stored pointer points to.
    ///
    /// # Safety
    ///
    /// See [`element`](Self::element).
    #[inline]
    pub unsafe fn indirection(&self) -> Field<T> {
        self.element(0)
    }

    /// Points the stored pointer at `address`.
    #[inline]
    pub fn point_to(&mut self, address: Address) {
        self.set(Ptr::from(address))
    }
}

impl<T: Declare> Add<usize> for Field<Ptr<T>> {
    type Output = Ptr<T::Storage>;

    #[inline]
    fn add(self, rhs: usize) -> Ptr<T::Storage> {
        self.get().add(rhs)
    }
}

impl<T: Declare> Sub<usize> for Field<Ptr<T>> {
    type Output = Ptr<T::Storage>;

    #[inline]
    fn sub(self, rhs: usize) -> Ptr<T::Storage> {
        self.get().sub(rhs)
    }
}

impl<T: Declare> Sub for Field<Ptr<T>> {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Self) -> isize {
        self.get().offset_from(rhs.get())
    }
}

impl<T: Declare> AddAssign<usize> for Field<Ptr<T>> {
    #[inline]
    fn add_assign(&mut self, rhs: usize) {
        let value = self.get().add(rhs);
        self.set(value);
    }
}

impl<T: Declare> SubAssign<usize> for Field<Ptr<T>> {
    #[inline]
    fn sub_assign(&mut self, rhs: usize) {
        let value = self.get().sub(rhs);
        self.set(value);
    }
}

impl<T: Declare> PartialEq for Field<Ptr<T>> {
    #[inline]
    fn eq(&self, rhs: &Self) -> bool {
        self.get() == rhs.get()
    }
}

impl<T: Declare> PartialEq<Ptr<T::Storage>> for Field<Ptr<T>> {
    #[inline]
    fn eq(&self, rhs: &Ptr<T::Storage>) -> bool {
        self.get() == *rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::view::Parent;

    #[test]
    fn array_subscript_addresses() {
        let mut backing = [0u32; 12];
        for (i, value) in backing.iter_mut().enumerate() {
            *value = (i * i) as u32;
        }
        let base = backing.as_mut_ptr() as usize;
        let view = unsafe { Field::<[u32; 12]>::at(Address::from(base)) };

        assert_eq!(view.len(), 12);
        assert_eq!(view.stride(), 4);
        for i in 0..12 {
            assert_eq!(&view[i] as *const u32 as usize, base + i * 4);
            assert_eq!(view[i], (i * i) as u32);
            assert_eq!(view.element(i).address(), Address::from(base + i * 4));
            assert_eq!(view.element(i).get(), (i * i) as u32);
        }
        assert_eq!(view.indirection().get(), 0);
        assert_eq!(view - view, 0);
        assert_eq!((view + 3).to_usize(), base + 12);
        assert_eq!(view.elements().count(), 12);
    }

    #[test]
    fn array_write_through() {
        let mut backing = [0i16; 4];
        let mut view = unsafe { Field::<[i16; 4]>::at(Address::from_ptr(backing.as_mut_ptr())) };
        view[2] = -7;
        let mut last = view.element(3);
        last += 9;
        assert_eq!(backing, [0, 0, -7, 9]);
    }

    #[test]
    #[should_panic]
    fn array_out_of_bounds() {
        let mut backing = [0u8; 4];
        let view = unsafe { Field::<[u8; 4]>::at(Address::from_ptr(backing.as_mut_ptr())) };
        view.element(4);
    }

    #[test]
    fn nested_arrays() {
        let mut backing = [[0u8; 3]; 2];
        backing[1][2] = 5;
        let view =
            unsafe { Field::<[[u8; 3]; 2]>::at(Address::from_ptr(backing.as_mut_ptr())) };
        assert_eq!(view.stride(), 3);
        assert_eq!(view.element(1).element(2).get(), 5);
        assert_eq!(view[1][2], 5);
    }

    #[test]
    fn pointer_fields() {
        let mut values = [10u64, 20, 30];
        let mut slot = [values.as_mut_ptr() as usize];
        let base = Address::from_ptr(slot.as_mut_ptr());
        let mut view = unsafe { Field::<Ptr<u64>>::new(Parent::Object(base), Resolver::offset(0)) };

        assert!(!view.is_null());
        assert_eq!(view.stride(), 8);
        assert_eq!(unsafe { view.indirection() }.get(), 10);
        assert_eq!(unsafe { view.element(2) }.get(), 30);
        assert_eq!((view + 1).to_usize(), values.as_ptr() as usize + 8);

        let origin = view.pointer();
        view += 2;
        assert_eq!(slot[0], values.as_ptr() as usize + 16);
        assert_eq!(view.pointer().offset_from(origin), 2);
        assert_eq!(unsafe { view.indirection() }.get(), 30);

        view -= 1;
        let mut middle = unsafe { view.indirection() };
        middle *= 3;
        assert_eq!(values[1], 60);

        view.point_to(Address::NULL);
        assert!(view.is_null());
        assert!(view == Ptr::null());
    }
}
