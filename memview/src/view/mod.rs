/*!
Typed views over foreign memory.

A view is a plain `Copy` struct whose members are bound to a parent object and an address
resolver. Views never own the memory they describe: every access resolves the member address
again and reinterprets it as storage of the member type.

Views are usually declared through `#[derive(View)]`:

```
use memview::prelude::v1::*;

#[derive(View)]
#[view(size = 0x10)]
struct Player {
    #[field(base)]
    base: Address,
    #[field(offset = 0x0)]
    health: Field<i32>,
    #[field(offset = 0x8)]
    speed: Field<f32>,
}

let mut backing = [0u8; 0x10];
backing[..4].copy_from_slice(&100i32.to_ne_bytes());

let mut player = unsafe { view_cast::<Player, _>(backing.as_mut_ptr()) };
player.health -= 25;
assert_eq!(player.health, 75);
assert_eq!(player.address_of_obj(), Address::from_ptr(backing.as_ptr()));
```
*/

use std::prelude::v1::*;

use crate::decl::{DeclaredType, Qualifiers, Scalar};
use crate::resolver::Resolver;
use crate::types::{Address, Ptr};

pub mod field;
#[doc(hidden)]
pub use field::Field;

pub mod numeric;
#[doc(hidden)]
pub use numeric::Truthy;

pub mod indexed;

pub mod weak;
#[doc(hidden)]
pub use weak::Weak;

pub mod function;
#[doc(hidden)]
pub use function::{FnPtr, Function, MemberFunction, MethodPtr, ThisArg, VirtualFunction};

pub mod owned;
#[doc(hidden)]
pub use owned::{Instantiate, Owned};

/// The object a member belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parent {
    /// Free standing members without an enclosing object. Resolvers see a null base.
    Root,
    /// A member of the object starting at the given address.
    Object(Address),
}

impl Parent {
    /// Base address handed to resolvers.
    pub fn base(&self) -> Address {
        match self {
            Parent::Root => Address::NULL,
            Parent::Object(address) => *address,
        }
    }
}

impl Default for Parent {
    fn default() -> Self {
        Parent::Root
    }
}

/// A parent paired with the resolver that locates a member inside it.
///
/// Bindings are created once and never change. Copying a binding copies the pair, not the
/// memory it points at.
#[derive(Copy, Clone, Debug)]
pub struct Binding {
    parent: Parent,
    resolver: Resolver,
}

impl Binding {
    /// Binds a resolver to a parent.
    ///
    /// # Safety
    ///
    /// Resolving the binding must be sound: virtual table resolvers read the parent's memory.
    pub unsafe fn new(parent: Parent, resolver: Resolver) -> Self {
        Self { parent, resolver }
    }

    /// A binding to a fixed address.
    ///
    /// # Safety
    ///
    /// See [`new`](Self::new).
    pub unsafe fn absolute(address: Address) -> Self {
        Self::new(Parent::Root, Resolver::absolute(address))
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn resolver(&self) -> Resolver {
        self.resolver
    }

    /// Computes the member address.
    #[inline]
    pub fn resolve(&self) -> Address {
        // constructing the binding vouched for the resolver being sound on this parent
        unsafe { self.resolver.resolve(self.parent.base()) }
    }
}

/// Types that can be declared as members of a view.
///
/// `Storage` is the type actually laid out at the resolved address. It differs from `Self` for
/// views, which are stored as [`Weak`] placeholders of their declared size, and for
/// enumerations, which are stored as their underlying integer. Arrays and pointers map their
/// element type recursively, so the storage of `[Node; 12]` is `[Weak<Node, N>; 12]`.
///
/// There are no implementations for references, slices or views without a declared size, which
/// makes declaring such members a compile error.
///
/// # Safety
///
/// Every bit pattern must be a valid `Storage` value and `declared()` must describe `Storage`
/// with matching size.
pub unsafe trait Declare: 'static {
    type Storage: Copy + 'static;

    /// Runtime descriptor of this type, before views are rewritten.
    fn declared() -> DeclaredType;
}

macro_rules! impl_declare_scalar {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            unsafe impl Declare for $ty {
                type Storage = $ty;

                fn declared() -> DeclaredType {
                    DeclaredType::scalar(Scalar::$scalar)
                }
            }
        )*
    };
}

impl_declare_scalar!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
);

// bool is not valid for every bit pattern, it is stored as a byte and read back through `!= 0`
unsafe impl Declare for bool {
    type Storage = u8;

    fn declared() -> DeclaredType {
        DeclaredType::scalar(Scalar::Bool)
    }
}

unsafe impl<T: Declare, const N: usize> Declare for [T; N] {
    type Storage = [T::Storage; N];

    fn declared() -> DeclaredType {
        DeclaredType::array(T::declared(), N)
    }
}

unsafe impl<T: Declare> Declare for Ptr<T> {
    type Storage = Ptr<T::Storage>;

    fn declared() -> DeclaredType {
        DeclaredType::pointer(T::declared(), Qualifiers::empty())
    }
}

/// A view over a foreign structure.
///
/// # Safety
///
/// `from_address` must only build members bound to the given address.
pub unsafe trait View: Copy + Sized {
    /// Binds every member of the view to `address`.
    ///
    /// # Safety
    ///
    /// `address` must point to an object with the layout this view describes for as long as the
    /// view or any copy of it is used.
    unsafe fn from_address(address: Address) -> Self;

    /// Address of the wrapped foreign object.
    fn address_of_obj(&self) -> Address;

    /// Address of this view handle itself.
    fn address_of_view(&self) -> *const Self {
        self as *const Self
    }
}

/// A view with a declared byte size.
pub trait SizedView: View {
    const SIZE: usize;
}

/// Marker for plain structs that can be used as member types and forward member access.
///
/// # Safety
///
/// Implementors must be [`Pod`](crate::dataview::Pod) without hidden polymorphic state.
pub unsafe trait Aggregate: Declare<Storage = Self> + Copy {}

/// C-like enumerations stored as their underlying integer.
///
/// # Safety
///
/// `Repr` must have the size the enumeration is declared with.
pub unsafe trait Enumeration: Declare + Copy {
    type Repr: Declare<Storage = Self::Repr> + Copy;

    fn from_repr(repr: Self::Repr) -> Option<Self>;

    fn to_repr(self) -> Self::Repr;
}

/// Anything that can be bound as a member of a view.
pub trait Member: Sized {
    /// # Safety
    ///
    /// See [`Binding::new`].
    unsafe fn bind(parent: Parent, resolver: Resolver) -> Self;
}

/// Wraps a raw pointer into a view.
///
/// # Safety
///
/// See [`View::from_address`].
pub unsafe fn view_cast<V: View, T>(ptr: *const T) -> V {
    V::from_address(Address::from_ptr(ptr))
}

/// Wraps an integer address into a view.
///
/// # Safety
///
/// See [`View::from_address`].
pub unsafe fn view_cast_usize<V: View>(address: usize) -> V {
    V::from_address(Address::from(address))
}
