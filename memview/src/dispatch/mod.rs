/*!
Capability dispatch.

Given a rewritten declared type, [`dispatch`] picks the specialization that reinterprets a
resolved address as storage of that type and computes the set of operations it forwards.
The rules are evaluated in priority order and the first matching rule wins:

1. reference layers are rejected
2. arrays of unknown size are rejected
3. scalars and enumerations get the numeric specialization
4. fixed size arrays get subscripting and pointer style arithmetic
5. aggregates forward member access
6. pointers behave like arrays over their own storage and compare for equality
7. weak views can only be turned into strong views or have their address taken

Function base types are call targets.
*/

use std::prelude::v1::*;

use crate::decl::{BaseKind, DeclaredType, Qualifiers, Scalar};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::rewrite::rewrite_declared;

use log::trace;

pub mod ops;
#[doc(hidden)]
pub use ops::{BinaryOp, Capabilities, CompareOp, LogicalOp, OpCategory, UnaryOp};

/// The specialization selected for a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Numeric,
    Array,
    Aggregate,
    Pointer,
    WeakView,
    Function,
}

/// Result of dispatching a type: how its storage looks and what can be done with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specialization {
    category: Category,
    capabilities: Capabilities,
    size: usize,
    align: usize,
    scalar: Option<Scalar>,
    stride: usize,
    len: Option<usize>,
    element: Option<DeclaredType>,
}

impl Specialization {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns true if every operation in `caps` is forwarded.
    pub fn supports(&self, caps: Capabilities) -> bool {
        self.capabilities.contains(caps)
    }

    /// Fails with `NotSupported` unless every operation in `caps` is forwarded.
    pub fn require(&self, caps: Capabilities) -> Result<()> {
        if self.supports(caps) {
            Ok(())
        } else {
            Err(Error(ErrorOrigin::Dispatcher, ErrorKind::NotSupported).log_trace(
                format_args!(
                    "{:?} lacks {:?}",
                    self.category,
                    caps - self.capabilities
                ),
            ))
        }
    }

    /// Size of the storage at the resolved address. Zero for functions.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn align(&self) -> usize {
        self.align
    }

    /// The stored scalar of numeric specializations (the underlying integer for enumerations).
    pub fn scalar(&self) -> Option<Scalar> {
        self.scalar
    }

    /// Byte distance between consecutive elements of arrays and pointers.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element count of arrays.
    pub fn len(&self) -> Option<usize> {
        self.len
    }

    /// Element type of arrays, pointee type of pointers.
    pub fn element(&self) -> Option<&DeclaredType> {
        self.element.as_ref()
    }
}

fn numeric_capabilities(scalar: Scalar, enumeration: bool) -> Capabilities {
    let mut caps = Capabilities::ASSIGN
        | Capabilities::ARITHMETIC
        | Capabilities::BITWISE
        | Capabilities::COMPARISON
        | Capabilities::LOGICAL;

    // neither enumerations nor booleans have a successor
    if enumeration || scalar.is_bool() {
        caps.remove(Capabilities::INCREMENT | Capabilities::DECREMENT);
    }
    if scalar.is_bool() {
        caps.remove(Capabilities::BIT_NOT);
    }
    if scalar.is_float() {
        caps.remove(Capabilities::BITWISE);
    }
    if !scalar.is_signed() && !scalar.is_bool() {
        caps.remove(Capabilities::UNARY_MINUS);
    }
    caps
}

/// Operations that write the wrapped storage. Const storage loses all of them.
const MUTATING: Capabilities = Capabilities::from_bits_truncate(
    Capabilities::ASSIGN.bits() | Capabilities::INCREMENT.bits() | Capabilities::DECREMENT.bits(),
);

fn is_const(declared: &DeclaredType) -> bool {
    match declared {
        DeclaredType::Base(base) => base.qualifiers().contains(Qualifiers::CONST),
        DeclaredType::Pointer { qualifiers, .. } => qualifiers.contains(Qualifiers::CONST),
        _ => false,
    }
}

fn indexed_capabilities(element: &DeclaredType) -> Capabilities {
    let mut caps = Capabilities::ARRAY_POINTER;
    if let DeclaredType::Base(base) = element {
        if base.is_record() {
            caps |= Capabilities::MEMBER_ACCESS;
        }
    }
    caps
}

/// Selects the specialization for a rewritten declared type.
///
/// View base types must have been rewritten into weak views beforehand, see [`compile`].
///
/// # Examples
///
/// ```
/// use memview::decl::{DeclaredType, Scalar};
/// use memview::dispatch::{dispatch, Capabilities, Category};
///
/// let spec = dispatch(&DeclaredType::scalar(Scalar::U32)).unwrap();
/// assert_eq!(spec.category(), Category::Numeric);
/// assert!(spec.supports(Capabilities::ADD | Capabilities::BIT_NOT));
/// assert!(!spec.supports(Capabilities::UNARY_MINUS));
/// ```
pub fn dispatch(declared: &DeclaredType) -> Result<Specialization> {
    if declared.contains_reference() {
        return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::ReferenceField)
            .log_debug(format_args!("{}", declared)));
    }
    if declared.contains_unsized_array() {
        return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::UnknownSizeArray)
            .log_debug(format_args!("{}", declared)));
    }
    match declared.base().kind() {
        BaseKind::View { size: None } => {
            return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::UnsizedView));
        }
        BaseKind::View { .. } => {
            return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::UnsupportedType)
                .log_debug(format_args!("view {} was not rewritten", declared.base())));
        }
        _ => {}
    }

    let mut specialization = match declared {
        DeclaredType::Base(base) => match base.kind() {
            BaseKind::Scalar(scalar) => numeric(*scalar, false),
            BaseKind::Enumeration(scalar) => numeric(*scalar, true),
            BaseKind::Aggregate { size, align } => Specialization {
                category: Category::Aggregate,
                capabilities: Capabilities::ASSIGN | Capabilities::MEMBER_ACCESS,
                size: *size,
                align: (*align).max(1),
                scalar: None,
                stride: 0,
                len: None,
                element: None,
            },
            BaseKind::WeakView { size } => Specialization {
                category: Category::WeakView,
                capabilities: Capabilities::TO_STRONG | Capabilities::RAW_ADDRESS,
                size: *size,
                align: 1,
                scalar: None,
                stride: 0,
                len: None,
                element: None,
            },
            BaseKind::Function => Specialization {
                category: Category::Function,
                capabilities: Capabilities::CALL,
                size: 0,
                align: 1,
                scalar: None,
                stride: 0,
                len: None,
                element: None,
            },
            BaseKind::View { .. } => {
                return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::UnsupportedType))
            }
        },
        DeclaredType::Array {
            len: Some(len),
            element,
        } => {
            let stride = element.size()?;
            Specialization {
                category: Category::Array,
                capabilities: indexed_capabilities(element),
                size: declared.size()?,
                align: element.align(),
                scalar: None,
                stride,
                len: Some(*len),
                element: Some((**element).clone()),
            }
        }
        DeclaredType::Pointer { pointee, .. } => {
            // pointers to code have no stride, they can only be compared and called through
            let (stride, capabilities) = match pointee.size() {
                Ok(stride) => (
                    stride,
                    Capabilities::ASSIGN
                        | Capabilities::EQ
                        | Capabilities::NE
                        | indexed_capabilities(pointee),
                ),
                Err(_) => (
                    0,
                    Capabilities::ASSIGN
                        | Capabilities::EQ
                        | Capabilities::NE
                        | Capabilities::INDIRECTION,
                ),
            };
            Specialization {
                category: Category::Pointer,
                capabilities,
                size: crate::types::POINTER_SIZE,
                align: crate::types::POINTER_SIZE,
                scalar: None,
                stride,
                len: None,
                element: Some((**pointee).clone()),
            }
        }
        DeclaredType::Array { len: None, .. } => {
            return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::UnknownSizeArray))
        }
        DeclaredType::Reference(_) | DeclaredType::RvalueReference(_) => {
            return Err(Error(ErrorOrigin::Dispatcher, ErrorKind::ReferenceField))
        }
    };
    if is_const(declared) {
        specialization.capabilities.remove(MUTATING);
    }

    trace!(
        "dispatched {} to {:?} with {:?}",
        declared,
        specialization.category,
        specialization.capabilities
    );

    Ok(specialization)
}

fn numeric(scalar: Scalar, enumeration: bool) -> Specialization {
    Specialization {
        category: Category::Numeric,
        capabilities: numeric_capabilities(scalar, enumeration),
        size: scalar.size(),
        align: scalar.align(),
        scalar: Some(scalar),
        stride: 0,
        len: None,
        element: None,
    }
}

/// Rewrites a declared type and dispatches the result.
///
/// This is the complete setup time pipeline a field goes through: every declaration error is
/// reported here, before any memory is touched.
pub fn compile(declared: &DeclaredType) -> Result<(DeclaredType, Specialization)> {
    let rewritten = rewrite_declared(declared)?;
    let specialization = dispatch(&rewritten)?;
    Ok((rewritten, specialization))
}
