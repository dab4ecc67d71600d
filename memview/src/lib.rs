//!
//! # memview
//!
//! Typed views over foreign memory layouts
//!
//! ## Introduction
//!
//! memview lets you describe the layout of a data structure you do not have the source for (an
//! object inside a running process, a captured buffer, a reverse engineered binary format) and
//! then work with it through strongly typed views instead of raw pointers and manual casts.
//!
//! Every member of a view is declared with a type and an address resolver. The member behaves
//! like a value of its type (it supports the arithmetic, comparison, subscript or call
//! operations that make sense for it) while every access is routed through a freshly resolved
//! address into the foreign memory.
//!
//! ```text
//!            +---------+   resolve(base)   +-----------------+
//!  view ---> |  Field  | ----------------> | foreign storage |
//!            +---------+                   +-----------------+
//!             parent +                      reinterpreted as
//!             resolver                      the member type
//! ```
//!
//! # Structure
//!
//! - [resolver](crate::resolver): turns the base address of a parent into the address of a
//!   member (fixed offsets, absolute addresses, virtual table slots).
//! - [decl](crate::decl): runtime descriptors of declared member types and their reversible
//!   decomposition into a base type and a stack of pointer / array / reference layers.
//! - [rewrite](crate::rewrite): replaces views nested inside declarations with fixed size
//!   placeholders so layouts stay finite.
//! - [dispatch](crate::dispatch): decides which operations a member of a given type forwards.
//! - [view](crate::view): the typed front end, `Field`, `Function` and the `View` trait.
//! - [layout](crate::layout) and [dynamic](crate::dynamic): layouts declared in TOML files and
//!   interpreted at runtime.
//! - [module](crate::module): base addresses of modules loaded into the current process.
//!
//! ## Getting started
//!
//! ```
//! use memview::prelude::v1::*;
//!
//! #[derive(View)]
//! #[view(size = 0x18)]
//! struct Node {
//!     #[field(base)]
//!     base: Address,
//!     #[field(offset = 0x0)]
//!     value: Field<i32>,
//!     #[field(offset = 0x8)]
//!     next: Field<Ptr<Node>>,
//! }
//!
//! let mut second = [0u8; 0x18];
//! let mut first = [0u8; 0x18];
//!
//! let mut tail = unsafe { view_cast::<Node, _>(second.as_mut_ptr()) };
//! tail.value.set(2);
//!
//! let mut head = unsafe { view_cast::<Node, _>(first.as_mut_ptr()) };
//! head.value.set(1);
//! head.next.point_to(tail.address_of_obj());
//!
//! let next = unsafe { head.next.indirection() }.to_strong();
//! assert_eq!(next.value, 2);
//! assert!(next.next.is_null());
//! ```

// no-std-compat
#![cfg_attr(not(feature = "std"), no_std)]
extern crate no_std_compat as std;

#[macro_use]
extern crate bitflags;

pub mod error;

pub mod types;

pub mod resolver;

pub mod decl;

pub mod rewrite;

pub mod dispatch;

pub mod view;

#[cfg(feature = "layout_files")]
pub mod layout;

#[cfg(feature = "layout_files")]
pub mod dynamic;

#[cfg(feature = "modules")]
pub mod module;

// forward declare
#[doc(hidden)]
pub mod derive {
    pub use ::memview_derive::*;
}

#[doc(hidden)]
pub mod dataview {
    pub use ::dataview::*;
    pub use ::memview_derive::Pod;
}

#[doc(hidden)]
pub mod prelude {
    pub mod v1 {
        pub use crate::dataview::{DataView, Pod};
        pub use crate::decl::{BaseKind, BaseType, DeclaredType, Qualifiers, Scalar};
        pub use crate::derive::*;
        pub use crate::dispatch::{
            BinaryOp, Capabilities, Category, CompareOp, LogicalOp, OpCategory, Specialization,
            UnaryOp,
        };
        #[cfg(feature = "layout_files")]
        pub use crate::dynamic::*;
        pub use crate::error::*;
        #[cfg(feature = "layout_files")]
        pub use crate::layout::*;
        #[cfg(feature = "modules")]
        pub use crate::module::*;
        pub use crate::resolver::*;
        pub use crate::types::*;
        pub use crate::view::*;
    }
    pub use v1::*;
}

#[cfg(test)]
mod tests {
    use crate::prelude::v1::*;

    #[test]
    fn prelude_field_is_the_view_field() {
        let mut backing = [7u32, 9];
        let field: Field<u32> = unsafe { Field::at(Address::from_ptr(&mut backing[1])) };
        assert_eq!(field.get(), 9);
    }
}
