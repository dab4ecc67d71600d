/*!
Module with basic types used in memview.

This module contains the address type views resolve to and the pointer type
used to describe pointers stored inside foreign memory.
*/

pub mod address;
#[doc(hidden)]
pub use address::{Address, POINTER_SIZE};

pub mod pointer;
#[doc(hidden)]
pub use pointer::Ptr;
