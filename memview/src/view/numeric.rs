/*!
Operator forwarding for numeric fields.

Every operator reads the current value through the field, computes with native semantics and,
for compound assignments, writes the result back. Mixed operands work in both directions:
`field + 1`, `1 + field` and `field + other_field` all yield a plain value.
*/

use std::cmp::Ordering;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div,
    DivAssign, Mul, MulAssign, Neg, Not, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};

use super::{Declare, Enumeration, Field};

/// Conversion to a truth value as used by the logical operators.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    #[inline]
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for Field<bool> {
    #[inline]
    fn is_truthy(&self) -> bool {
        self.get() != 0
    }
}

impl<T: Declare> Field<T>
where
    Field<T>: Truthy,
{
    #[inline]
    pub fn logical_not(&self) -> bool {
        !self.is_truthy()
    }

    /// Short circuits: `rhs` is not inspected when this field is falsy.
    #[inline]
    pub fn logical_and<R: Truthy>(&self, rhs: R) -> bool {
        self.is_truthy() && rhs.is_truthy()
    }

    /// Short circuits: `rhs` is not inspected when this field is truthy.
    #[inline]
    pub fn logical_or<R: Truthy>(&self, rhs: R) -> bool {
        self.is_truthy() || rhs.is_truthy()
    }
}

macro_rules! impl_binary {
    ($ty:ty, $trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<$ty> for Field<$ty> {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: $ty) -> $ty {
                self.get() $op rhs
            }
        }

        impl $trait<Field<$ty>> for Field<$ty> {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: Field<$ty>) -> $ty {
                self.get() $op rhs.get()
            }
        }

        impl $trait<Field<$ty>> for $ty {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: Field<$ty>) -> $ty {
                self $op rhs.get()
            }
        }

        impl $assign_trait<$ty> for Field<$ty> {
            #[inline]
            fn $assign_method(&mut self, rhs: $ty) {
                let value = self.get() $op rhs;
                self.set(value);
            }
        }

        impl $assign_trait<Field<$ty>> for Field<$ty> {
            #[inline]
            fn $assign_method(&mut self, rhs: Field<$ty>) {
                let value = self.get() $op rhs.get();
                self.set(value);
            }
        }
    };
}

macro_rules! impl_comparison {
    ($($ty:ty),*) => {
        $(
            impl PartialEq<$ty> for Field<$ty> {
                #[inline]
                fn eq(&self, rhs: &$ty) -> bool {
                    self.get() == *rhs
                }
            }

            impl PartialEq for Field<$ty> {
                #[inline]
                fn eq(&self, rhs: &Field<$ty>) -> bool {
                    self.get() == rhs.get()
                }
            }

            impl PartialEq<Field<$ty>> for $ty {
                #[inline]
                fn eq(&self, rhs: &Field<$ty>) -> bool {
                    *self == rhs.get()
                }
            }

            impl PartialOrd<$ty> for Field<$ty> {
                #[inline]
                fn partial_cmp(&self, rhs: &$ty) -> Option<Ordering> {
                    self.get().partial_cmp(rhs)
                }
            }

            impl PartialOrd for Field<$ty> {
                #[inline]
                fn partial_cmp(&self, rhs: &Field<$ty>) -> Option<Ordering> {
                    self.get().partial_cmp(&rhs.get())
                }
            }

            impl PartialOrd<Field<$ty>> for $ty {
                #[inline]
                fn partial_cmp(&self, rhs: &Field<$ty>) -> Option<Ordering> {
                    self.partial_cmp(&rhs.get())
                }
            }
        )*
    };
}

macro_rules! impl_arithmetic {
    ($($ty:ty => $zero:expr, $one:expr);* $(;)?) => {
        $(
            impl_binary!($ty, Add, add, AddAssign, add_assign, +);
            impl_binary!($ty, Sub, sub, SubAssign, sub_assign, -);
            impl_binary!($ty, Mul, mul, MulAssign, mul_assign, *);
            impl_binary!($ty, Div, div, DivAssign, div_assign, /);
            impl_binary!($ty, Rem, rem, RemAssign, rem_assign, %);
            impl_comparison!($ty);

            impl Truthy for $ty {
                #[inline]
                fn is_truthy(&self) -> bool {
                    *self != $zero
                }
            }

            impl Truthy for Field<$ty> {
                #[inline]
                fn is_truthy(&self) -> bool {
                    self.get() != $zero
                }
            }

            impl Field<$ty> {
                /// Returns the current value.
                #[inline]
                pub fn unary_plus(&self) -> $ty {
                    self.get()
                }

                /// Adds one and returns the field.
                #[inline]
                pub fn increment(&mut self) -> Self {
                    *self += $one;
                    *self
                }

                /// Subtracts one and returns the field.
                #[inline]
                pub fn decrement(&mut self) -> Self {
                    *self -= $one;
                    *self
                }

                /// Adds one and returns the previous value.
                #[inline]
                pub fn post_increment(&mut self) -> $ty {
                    let value = self.get();
                    *self += $one;
                    value
                }

                /// Subtracts one and returns the previous value.
                #[inline]
                pub fn post_decrement(&mut self) -> $ty {
                    let value = self.get();
                    *self -= $one;
                    value
                }
            }
        )*
    };
}

macro_rules! impl_bitwise {
    ($($ty:ty),*) => {
        $(
            impl_binary!($ty, BitOr, bitor, BitOrAssign, bitor_assign, |);
            impl_binary!($ty, BitAnd, bitand, BitAndAssign, bitand_assign, &);
            impl_binary!($ty, BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

            impl Shl<u32> for Field<$ty> {
                type Output = $ty;

                #[inline]
                fn shl(self, rhs: u32) -> $ty {
                    self.get() << rhs
                }
            }

            impl ShlAssign<u32> for Field<$ty> {
                #[inline]
                fn shl_assign(&mut self, rhs: u32) {
                    let value = self.get() << rhs;
                    self.set(value);
                }
            }

            impl Shr<u32> for Field<$ty> {
                type Output = $ty;

                #[inline]
                fn shr(self, rhs: u32) -> $ty {
                    self.get() >> rhs
                }
            }

            impl ShrAssign<u32> for Field<$ty> {
                #[inline]
                fn shr_assign(&mut self, rhs: u32) {
                    let value = self.get() >> rhs;
                    self.set(value);
                }
            }

            impl Not for Field<$ty> {
                type Output = $ty;

                #[inline]
                fn not(self) -> $ty {
                    !self.get()
                }
            }
        )*
    };
}

macro_rules! impl_neg {
    ($($ty:ty),*) => {
        $(
            impl Neg for Field<$ty> {
                type Output = $ty;

                #[inline]
                fn neg(self) -> $ty {
                    -self.get()
                }
            }
        )*
    };
}

impl_arithmetic!(
    i8 => 0, 1;
    i16 => 0, 1;
    i32 => 0, 1;
    i64 => 0, 1;
    i128 => 0, 1;
    isize => 0, 1;
    u8 => 0, 1;
    u16 => 0, 1;
    u32 => 0, 1;
    u64 => 0, 1;
    u128 => 0, 1;
    usize => 0, 1;
    f32 => 0.0, 1.0;
    f64 => 0.0, 1.0;
);

impl_bitwise!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl_neg!(i8, i16, i32, i64, i128, isize, f32, f64);

// booleans are stored as a byte. The bitwise operators stay boolean, arithmetic promotes to
// `i32` and compound assignments store whether the result is non zero.

macro_rules! impl_bool_binary {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<bool> for Field<bool> {
            type Output = bool;

            #[inline]
            fn $method(self, rhs: bool) -> bool {
                self.is_truthy() $op rhs
            }
        }

        impl $trait<Field<bool>> for Field<bool> {
            type Output = bool;

            #[inline]
            fn $method(self, rhs: Field<bool>) -> bool {
                self.is_truthy() $op rhs.is_truthy()
            }
        }

        impl $assign_trait<bool> for Field<bool> {
            #[inline]
            fn $assign_method(&mut self, rhs: bool) {
                let value = self.is_truthy() $op rhs;
                self.set_value(value);
            }
        }
    };
}

impl_bool_binary!(BitOr, bitor, BitOrAssign, bitor_assign, |);
impl_bool_binary!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
impl_bool_binary!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

macro_rules! impl_bool_arithmetic {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<i32> for Field<bool> {
            type Output = i32;

            #[inline]
            fn $method(self, rhs: i32) -> i32 {
                self.value() as i32 $op rhs
            }
        }

        impl $trait<Field<bool>> for Field<bool> {
            type Output = i32;

            #[inline]
            fn $method(self, rhs: Field<bool>) -> i32 {
                self.value() as i32 $op rhs.value() as i32
            }
        }

        impl $assign_trait<i32> for Field<bool> {
            #[inline]
            fn $assign_method(&mut self, rhs: i32) {
                let value = self.value() as i32 $op rhs;
                self.set_value(value != 0);
            }
        }
    };
}

impl_bool_arithmetic!(Add, add, AddAssign, add_assign, +);
impl_bool_arithmetic!(Sub, sub, SubAssign, sub_assign, -);
impl_bool_arithmetic!(Mul, mul, MulAssign, mul_assign, *);
impl_bool_arithmetic!(Div, div, DivAssign, div_assign, /);
impl_bool_arithmetic!(Rem, rem, RemAssign, rem_assign, %);

impl Shl<u32> for Field<bool> {
    type Output = i32;

    #[inline]
    fn shl(self, rhs: u32) -> i32 {
        (self.value() as i32) << rhs
    }
}

impl Shr<u32> for Field<bool> {
    type Output = i32;

    #[inline]
    fn shr(self, rhs: u32) -> i32 {
        (self.value() as i32) >> rhs
    }
}

impl ShlAssign<u32> for Field<bool> {
    #[inline]
    fn shl_assign(&mut self, rhs: u32) {
        let value = (self.value() as i32) << rhs;
        self.set_value(value != 0);
    }
}

impl ShrAssign<u32> for Field<bool> {
    #[inline]
    fn shr_assign(&mut self, rhs: u32) {
        let value = (self.value() as i32) >> rhs;
        self.set_value(value != 0);
    }
}

impl Neg for Field<bool> {
    type Output = i32;

    #[inline]
    fn neg(self) -> i32 {
        -(self.value() as i32)
    }
}

impl Field<bool> {
    #[inline]
    pub fn value(&self) -> bool {
        self.is_truthy()
    }

    /// The value promoted to an integer.
    #[inline]
    pub fn unary_plus(&self) -> i32 {
        self.value() as i32
    }

    #[inline]
    pub fn set_value(&mut self, value: bool) {
        self.set(value as u8)
    }
}

impl PartialEq<bool> for Field<bool> {
    #[inline]
    fn eq(&self, rhs: &bool) -> bool {
        self.value() == *rhs
    }
}

impl PartialEq for Field<bool> {
    #[inline]
    fn eq(&self, rhs: &Field<bool>) -> bool {
        self.value() == rhs.value()
    }
}

impl PartialOrd<bool> for Field<bool> {
    #[inline]
    fn partial_cmp(&self, rhs: &bool) -> Option<Ordering> {
        self.value().partial_cmp(rhs)
    }
}

impl PartialOrd for Field<bool> {
    #[inline]
    fn partial_cmp(&self, rhs: &Field<bool>) -> Option<Ordering> {
        self.value().partial_cmp(&rhs.value())
    }
}

// enumerations compute on their underlying integer, results are integers

macro_rules! impl_enum_binary {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident) => {
        impl<E: Enumeration> $trait<E::Repr> for Field<E>
        where
            Field<E::Repr>: $trait<E::Repr, Output = E::Repr>,
        {
            type Output = E::Repr;

            #[inline]
            fn $method(self, rhs: E::Repr) -> E::Repr {
                self.as_repr().$method(rhs)
            }
        }

        impl<E: Enumeration> $assign_trait<E::Repr> for Field<E>
        where
            Field<E::Repr>: $assign_trait<E::Repr>,
        {
            #[inline]
            fn $assign_method(&mut self, rhs: E::Repr) {
                self.as_repr().$assign_method(rhs)
            }
        }
    };
}

impl_enum_binary!(Add, add, AddAssign, add_assign);
impl_enum_binary!(Sub, sub, SubAssign, sub_assign);
impl_enum_binary!(Mul, mul, MulAssign, mul_assign);
impl_enum_binary!(Div, div, DivAssign, div_assign);
impl_enum_binary!(Rem, rem, RemAssign, rem_assign);
impl_enum_binary!(BitOr, bitor, BitOrAssign, bitor_assign);
impl_enum_binary!(BitAnd, bitand, BitAndAssign, bitand_assign);
impl_enum_binary!(BitXor, bitxor, BitXorAssign, bitxor_assign);

impl<E: Enumeration> Shl<u32> for Field<E>
where
    Field<E::Repr>: Shl<u32, Output = E::Repr>,
{
    type Output = E::Repr;

    #[inline]
    fn shl(self, rhs: u32) -> E::Repr {
        self.as_repr() << rhs
    }
}

impl<E: Enumeration> Shr<u32> for Field<E>
where
    Field<E::Repr>: Shr<u32, Output = E::Repr>,
{
    type Output = E::Repr;

    #[inline]
    fn shr(self, rhs: u32) -> E::Repr {
        self.as_repr() >> rhs
    }
}

impl<E: Enumeration> Not for Field<E>
where
    Field<E::Repr>: Not<Output = E::Repr>,
{
    type Output = E::Repr;

    #[inline]
    fn not(self) -> E::Repr {
        !self.as_repr()
    }
}

impl<E: Enumeration> Neg for Field<E>
where
    Field<E::Repr>: Neg<Output = E::Repr>,
{
    type Output = E::Repr;

    #[inline]
    fn neg(self) -> E::Repr {
        -self.as_repr()
    }
}

impl<E: Enumeration> Truthy for Field<E>
where
    Field<E::Repr>: Truthy,
{
    #[inline]
    fn is_truthy(&self) -> bool {
        self.as_repr().is_truthy()
    }
}

impl<E: Enumeration> PartialOrd<E> for Field<E>
where
    Field<E>: PartialEq<E>,
    E::Repr: PartialOrd,
{
    #[inline]
    fn partial_cmp(&self, rhs: &E) -> Option<Ordering> {
        self.as_repr().get().partial_cmp(&rhs.to_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn field<T: Declare>(storage: &mut T::Storage) -> Field<T> {
        unsafe { Field::at(Address::from_ptr(storage as *mut T::Storage)) }
    }

    #[test]
    fn forwarding_i32() {
        let mut backing = 1000i32;
        let mut view = field::<i32>(&mut backing);

        assert_eq!(view + 100, 1100);
        assert_eq!(100 + view, 1100);
        assert_eq!(view - 1, 999);
        assert_eq!(view * 2, 2000);
        assert_eq!(view / 3, 333);
        assert_eq!(-view, -1000);
        assert_eq!(view.unary_plus(), 1000);

        view += 5;
        assert_eq!(view, 1005);
        view -= 5;
        view *= 3;
        assert_eq!(view, 3000);
        view /= 3;
        view %= 100;
        assert_eq!(view, 0);
        assert_eq!(backing, 0);
    }

    #[test]
    fn increments() {
        let mut backing = 10u8;
        let mut view = field::<u8>(&mut backing);

        assert_eq!(view.post_increment(), 10);
        assert_eq!(view.increment().get(), 12);
        assert_eq!(view.post_decrement(), 12);
        assert_eq!(view.decrement().get(), 10);
        assert_eq!(backing, 10);

        let mut backing = 0.5f64;
        let mut view = field::<f64>(&mut backing);
        view.increment();
        assert_eq!(backing, 1.5);
    }

    #[test]
    fn bitwise_u32() {
        let mut backing = 0xcafe_babeu32;
        let mut view = field::<u32>(&mut backing);

        assert_eq!(view | 0xf, 0xcafe_babf);
        assert_eq!(view & 0xffff, 0xbabe);
        assert_eq!(view ^ 0xcafe_babe, 0);
        assert_eq!(view << 4, 0xafe_babe0);
        assert_eq!(view >> 16, 0xcafe);
        assert_eq!(!view, !0xcafe_babeu32);

        view &= 0xffff_0000;
        view >>= 16;
        view |= 0x1_0000;
        assert_eq!(backing, 0x1_cafe);
    }

    #[test]
    fn comparisons() {
        let mut a = 1234u32;
        let mut b = 567.89f32;
        let ua = field::<u32>(&mut a);
        let fb = field::<f32>(&mut b);

        assert!(ua == 1234);
        assert!(ua != 1235);
        assert!(ua > 1000 && ua < 2000);
        assert!(ua >= 1234 && ua <= 1234);
        assert!(1235 > ua);
        assert!(fb < 600.0);
        assert!(fb == 567.89);
        assert!(567.0 < fb);
        assert!(ua == ua);
    }

    #[test]
    fn logical() {
        let mut zero = 0i64;
        let mut one = 1i64;
        let mut flag = 1u8;
        let z = field::<i64>(&mut zero);
        let o = field::<i64>(&mut one);
        let mut f = field::<bool>(&mut flag);

        assert!(z.logical_not());
        assert!(!o.logical_not());
        assert!(o.logical_and(true));
        assert!(!z.logical_and(o));
        assert!(z.logical_or(o));
        assert!(f.logical_and(o));

        assert!(f == true);
        f ^= true;
        assert_eq!(flag, 0);
        assert!(f.logical_not());
    }

    #[test]
    fn bool_bitwise() {
        let mut flag = 0u8;
        let mut f = field::<bool>(&mut flag);
        assert!(!(f | false));
        f |= true;
        assert!(f.value());
        assert!(!(f & false));
        assert!(f ^ false);
        assert_eq!(flag, 1);
    }

    #[test]
    fn bool_arithmetic() {
        let mut flag = 1u8;
        let mut f = field::<bool>(&mut flag);
        assert_eq!(f + 1, 2);
        assert_eq!(f + f, 2);
        assert_eq!(f * 5, 5);
        assert_eq!(f / 2, 0);
        assert_eq!(f << 3, 8);
        assert_eq!(f >> 1, 0);
        assert_eq!(-f, -1);
        assert_eq!(f.unary_plus(), 1);

        f -= 1;
        assert_eq!(flag, 0);
        f += 3;
        assert_eq!(flag, 1);
        f >>= 1;
        assert!(!f.value());
    }

    #[test]
    fn fidelity_random_i64() {
        let mut rng = XorShiftRng::seed_from_u64(0xf1e1d);
        for _ in 0..1000 {
            let lhs: i64 = rng.gen_range(-1_000_000..1_000_000);
            let rhs: i64 = rng.gen_range(1..1000);
            let shift: u32 = rng.gen_range(0..16);

            let mut backing = lhs;
            let view = field::<i64>(&mut backing);

            assert_eq!(view + rhs, lhs + rhs);
            assert_eq!(view - rhs, lhs - rhs);
            assert_eq!(view * rhs, lhs * rhs);
            assert_eq!(view / rhs, lhs / rhs);
            assert_eq!(view % rhs, lhs % rhs);
            assert_eq!(view | rhs, lhs | rhs);
            assert_eq!(view & rhs, lhs & rhs);
            assert_eq!(view ^ rhs, lhs ^ rhs);
            assert_eq!(view << shift, lhs << shift);
            assert_eq!(view >> shift, lhs >> shift);
            assert_eq!(!view, !lhs);
            assert_eq!(-view, -lhs);
            assert_eq!(view < rhs, lhs < rhs);
            assert_eq!(view >= rhs, lhs >= rhs);
            assert_eq!(view == rhs, lhs == rhs);
        }
    }

    #[test]
    fn fidelity_random_f64() {
        let mut rng = XorShiftRng::seed_from_u64(0xf10a7);
        for _ in 0..1000 {
            let lhs: f64 = rng.gen_range(-1000.0..1000.0);
            let rhs: f64 = rng.gen_range(0.5..100.0);

            let mut backing = lhs;
            let mut view = field::<f64>(&mut backing);

            assert_eq!(view + rhs, lhs + rhs);
            assert_eq!(view * rhs, lhs * rhs);
            assert_eq!(view / rhs, lhs / rhs);
            assert_eq!(view % rhs, lhs % rhs);
            assert_eq!(view.partial_cmp(&rhs), lhs.partial_cmp(&rhs));

            view -= rhs;
            assert_eq!(backing, lhs - rhs);
        }
    }
}
