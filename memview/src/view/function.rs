/*!
Callable members.

[`Function`] calls code at the resolved address. [`MemberFunction`] additionally passes the
address of the parent object as the first argument, the way methods receive `this`. Combined
with a virtual table resolver it calls virtual methods, see [`VirtualFunction`].

```
use memview::prelude::v1::*;

extern "C" fn twice(x: i32) -> i32 {
    x * 2
}

let function = unsafe {
    Function::<extern "C" fn(i32) -> i32>::new(
        Parent::Root,
        Resolver::absolute(Address::from(twice as usize)),
    )
};
assert_eq!(unsafe { function.call((21,)) }, 42);
```
*/

use std::marker::PhantomData;
use std::{fmt, mem};

use super::{Binding, Member, Parent};
use crate::resolver::Resolver;
use crate::types::Address;

/// Function pointer types that can be called at a resolved address.
///
/// # Safety
///
/// Implementors must be pointer sized function pointers.
pub unsafe trait FnPtr: Copy + 'static {
    type Args;
    type Output;

    /// # Safety
    ///
    /// `address` must be the entry point of a function with this signature.
    unsafe fn from_address(address: Address) -> Self;

    fn address(self) -> Address;

    /// # Safety
    ///
    /// Calls foreign code.
    unsafe fn invoke(self, args: Self::Args) -> Self::Output;
}

/// Function pointer types whose first parameter receives the parent object.
///
/// # Safety
///
/// Implementors must be pointer sized function pointers.
pub unsafe trait MethodPtr: Copy + 'static {
    type Args;
    type Output;

    /// # Safety
    ///
    /// `address` must be the entry point of a function with this signature.
    unsafe fn from_address(address: Address) -> Self;

    /// # Safety
    ///
    /// Calls foreign code.
    unsafe fn invoke_with_this(self, this: Address, args: Self::Args) -> Self::Output;
}

/// Types that can carry the object address as the first argument of a method.
pub trait ThisArg: Copy + 'static {
    fn from_this(this: Address) -> Self;
}

impl ThisArg for Address {
    #[inline]
    fn from_this(this: Address) -> Self {
        this
    }
}

impl ThisArg for usize {
    #[inline]
    fn from_this(this: Address) -> Self {
        this.to_usize()
    }
}

impl<T: 'static> ThisArg for *const T {
    #[inline]
    fn from_this(this: Address) -> Self {
        this.as_ptr()
    }
}

impl<T: 'static> ThisArg for *mut T {
    #[inline]
    fn from_this(this: Address) -> Self {
        this.as_mut_ptr()
    }
}

macro_rules! impl_fn_ptr {
    (@ptr [$abi:tt] [$($unsafety:tt)*] $($arg:ident $val:ident),*) => {
        unsafe impl<R: 'static, $($arg: 'static),*> FnPtr for $($unsafety)* extern $abi fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;

            #[inline]
            unsafe fn from_address(address: Address) -> Self {
                mem::transmute_copy::<usize, Self>(&address.to_usize())
            }

            #[inline]
            fn address(self) -> Address {
                Address::from(self as usize)
            }

            #[inline]
            unsafe fn invoke(self, ($($val,)*): Self::Args) -> R {
                (self)($($val),*)
            }
        }

        unsafe impl<R: 'static, This: ThisArg, $($arg: 'static),*> MethodPtr
            for $($unsafety)* extern $abi fn(This, $($arg),*) -> R
        {
            type Args = ($($arg,)*);
            type Output = R;

            #[inline]
            unsafe fn from_address(address: Address) -> Self {
                mem::transmute_copy::<usize, Self>(&address.to_usize())
            }

            #[inline]
            unsafe fn invoke_with_this(self, this: Address, ($($val,)*): Self::Args) -> R {
                (self)(This::from_this(this), $($val),*)
            }
        }
    };
    ($abi:tt; $($arg:ident $val:ident),*) => {
        impl_fn_ptr!(@ptr [$abi] [] $($arg $val),*);
        impl_fn_ptr!(@ptr [$abi] [unsafe] $($arg $val),*);
    };
}

macro_rules! impl_fn_ptr_arities {
    ($abi:tt) => {
        impl_fn_ptr!($abi;);
        impl_fn_ptr!($abi; A1 a1);
        impl_fn_ptr!($abi; A1 a1, A2 a2);
        impl_fn_ptr!($abi; A1 a1, A2 a2, A3 a3);
        impl_fn_ptr!($abi; A1 a1, A2 a2, A3 a3, A4 a4);
        impl_fn_ptr!($abi; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
    };
}

impl_fn_ptr_arities!("C");
impl_fn_ptr_arities!("system");

// six plain arguments, methods already use one slot for `this`
unsafe impl<R: 'static, A1: 'static, A2: 'static, A3: 'static, A4: 'static, A5: 'static, A6: 'static>
    FnPtr for extern "C" fn(A1, A2, A3, A4, A5, A6) -> R
{
    type Args = (A1, A2, A3, A4, A5, A6);
    type Output = R;

    #[inline]
    unsafe fn from_address(address: Address) -> Self {
        mem::transmute_copy::<usize, Self>(&address.to_usize())
    }

    #[inline]
    fn address(self) -> Address {
        Address::from(self as usize)
    }

    #[inline]
    unsafe fn invoke(self, (a1, a2, a3, a4, a5, a6): Self::Args) -> R {
        (self)(a1, a2, a3, a4, a5, a6)
    }
}

#[cfg(all(windows, target_arch = "x86"))]
mod thiscall {
    use super::*;

    macro_rules! impl_thiscall {
        ($($arg:ident $val:ident),*) => {
            unsafe impl<R: 'static, This: ThisArg, $($arg: 'static),*> MethodPtr
                for extern "thiscall" fn(This, $($arg),*) -> R
            {
                type Args = ($($arg,)*);
                type Output = R;

                #[inline]
                unsafe fn from_address(address: Address) -> Self {
                    mem::transmute_copy::<usize, Self>(&address.to_usize())
                }

                #[inline]
                unsafe fn invoke_with_this(self, this: Address, ($($val,)*): Self::Args) -> R {
                    (self)(This::from_this(this), $($val),*)
                }
            }
        };
    }

    impl_thiscall!();
    impl_thiscall!(A1 a1);
    impl_thiscall!(A1 a1, A2 a2);
    impl_thiscall!(A1 a1, A2 a2, A3 a3);
    impl_thiscall!(A1 a1, A2 a2, A3 a3, A4 a4);
    impl_thiscall!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
}

/// A function located by a resolver.
pub struct Function<F> {
    binding: Binding,
    phantom_data: PhantomData<F>,
}

impl<F> Copy for Function<F> {}
impl<F> Clone for Function<F> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: FnPtr> Function<F> {
    /// # Safety
    ///
    /// The resolved address must be the entry point of a function with signature `F`.
    pub unsafe fn new(parent: Parent, resolver: Resolver) -> Self {
        Self {
            binding: Binding::new(parent, resolver),
            phantom_data: PhantomData,
        }
    }

    /// The resolved entry point.
    #[inline]
    pub fn address(&self) -> Address {
        self.binding.resolve()
    }

    /// The function pointer at the resolved entry point.
    #[inline]
    pub fn get(&self) -> F {
        unsafe { F::from_address(self.address()) }
    }

    /// Calls the function with a tuple of arguments.
    ///
    /// # Safety
    ///
    /// Calls foreign code.
    #[inline]
    pub unsafe fn call(&self, args: F::Args) -> F::Output {
        self.get().invoke(args)
    }
}

impl<F: FnPtr> Member for Function<F> {
    unsafe fn bind(parent: Parent, resolver: Resolver) -> Self {
        Self::new(parent, resolver)
    }
}

impl<F> fmt::Debug for Function<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Function @ {:x}", self.binding.resolve())
    }
}

/// A function that receives the parent object as its first argument.
pub struct MemberFunction<F> {
    binding: Binding,
    phantom_data: PhantomData<F>,
}

/// A member function resolved through a virtual table.
pub type VirtualFunction<F> = MemberFunction<F>;

impl<F> Copy for MemberFunction<F> {}
impl<F> Clone for MemberFunction<F> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: MethodPtr> MemberFunction<F> {
    /// # Safety
    ///
    /// The resolved address must be the entry point of a function with signature `F` expecting
    /// the parent object as its first argument.
    pub unsafe fn new(parent: Parent, resolver: Resolver) -> Self {
        Self {
            binding: Binding::new(parent, resolver),
            phantom_data: PhantomData,
        }
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.binding.resolve()
    }

    /// The object passed as first argument.
    #[inline]
    pub fn this(&self) -> Address {
        self.binding.parent().base()
    }

    /// Calls the function on the parent object.
    ///
    /// # Safety
    ///
    /// Calls foreign code.
    #[inline]
    pub unsafe fn call(&self, args: F::Args) -> F::Output {
        F::from_address(self.address()).invoke_with_this(self.this(), args)
    }
}

impl<F: MethodPtr> Member for MemberFunction<F> {
    unsafe fn bind(parent: Parent, resolver: Resolver) -> Self {
        Self::new(parent, resolver)
    }
}

impl<F> fmt::Debug for MemberFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MemberFunction @ {:x} on {:x}",
            self.binding.resolve(),
            self.binding.parent().base()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn add3(a: i32, b: i32, c: i32) -> i32 {
        a + b + c
    }

    extern "C" fn nothing() -> u8 {
        7
    }

    extern "C" fn sum6(a: u64, b: u64, c: u64, d: u64, e: u64, f: u64) -> u64 {
        a + b + c + d + e + f
    }

    extern "C" fn read_this(this: *const u32, add: u32) -> u32 {
        unsafe { *this + add }
    }

    extern "system" fn negate(x: i64) -> i64 {
        -x
    }

    #[test]
    fn call_absolute() {
        let function = unsafe {
            Function::<extern "C" fn(i32, i32, i32) -> i32>::new(
                Parent::Root,
                Resolver::absolute(Address::from(add3 as usize)),
            )
        };
        assert_eq!(function.address(), Address::from(add3 as usize));
        assert_eq!(unsafe { function.call((1, 2, 3)) }, 6);
        assert_eq!(function.get().address(), function.address());
    }

    #[test]
    fn arities() {
        let zero = unsafe { <extern "C" fn() -> u8>::from_address(Address::from(nothing as usize)) };
        assert_eq!(unsafe { zero.invoke(()) }, 7);

        let six = unsafe {
            <extern "C" fn(u64, u64, u64, u64, u64, u64) -> u64>::from_address(Address::from(
                sum6 as usize,
            ))
        };
        assert_eq!(unsafe { six.invoke((1, 2, 3, 4, 5, 6)) }, 21);

        let system = unsafe {
            <extern "system" fn(i64) -> i64>::from_address(Address::from(negate as usize))
        };
        assert_eq!(unsafe { system.invoke((5,)) }, -5);
    }

    #[test]
    fn member_function_passes_parent() {
        let object = 40u32;
        let parent = Parent::Object(Address::from_ptr(&object));
        let method = unsafe {
            MemberFunction::<extern "C" fn(*const u32, u32) -> u32>::new(
                parent,
                Resolver::absolute(Address::from(read_this as usize)),
            )
        };
        assert_eq!(method.this(), Address::from_ptr(&object));
        assert_eq!(unsafe { method.call((2,)) }, 42);
    }

    #[test]
    fn virtual_function() {
        #[repr(C)]
        struct Object {
            value: u32,
            vtable: usize,
        }

        let vtable: [usize; 2] = [nothing as usize, read_this as usize];
        let object = Object {
            value: 99,
            vtable: vtable.as_ptr() as usize,
        };
        let base = Address::from_ptr(&object);
        let vtable_offset = Address::from_ptr(&object.vtable) - base;

        let method = unsafe {
            VirtualFunction::<extern "C" fn(*const u32, u32) -> u32>::new(
                Parent::Object(base),
                Resolver::virtual_table(1, vtable_offset),
            )
        };
        assert_eq!(method.address(), Address::from(read_this as usize));
        assert_eq!(unsafe { method.call((1,)) }, 100);
    }
}
