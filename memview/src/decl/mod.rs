/*!
Runtime descriptors of declared member types.

Every member of a view is declared with a type. Typed views carry that type in the Rust type
system (see [`Declare`](crate::view::Declare)); this module provides the equivalent runtime
descriptor, [`DeclaredType`], which can be built programmatically, parsed from a type expression
or produced from a `Declare` implementation.
*/

use std::prelude::v1::*;

use std::fmt;

use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::types::POINTER_SIZE;

pub mod qualifier;
#[doc(hidden)]
pub use qualifier::{derive, reapply, Layer, LayerKind, QualifierStack, Qualifiers};

pub mod parse;
#[doc(hidden)]
pub use parse::parse_type;

/// Arithmetic primitive types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl Scalar {
    pub const ALL: [Scalar; 15] = [
        Scalar::Bool,
        Scalar::I8,
        Scalar::I16,
        Scalar::I32,
        Scalar::I64,
        Scalar::I128,
        Scalar::Isize,
        Scalar::U8,
        Scalar::U16,
        Scalar::U32,
        Scalar::U64,
        Scalar::U128,
        Scalar::Usize,
        Scalar::F32,
        Scalar::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::I8 => "i8",
            Scalar::I16 => "i16",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::I128 => "i128",
            Scalar::Isize => "isize",
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::U128 => "u128",
            Scalar::Usize => "usize",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Scalar> {
        Scalar::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn size(self) -> usize {
        use std::mem::size_of;
        match self {
            Scalar::Bool => size_of::<bool>(),
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
            Scalar::I128 | Scalar::U128 => 16,
            Scalar::Isize | Scalar::Usize => size_of::<usize>(),
        }
    }

    pub fn align(self) -> usize {
        use std::mem::align_of;
        match self {
            Scalar::I128 => align_of::<i128>(),
            Scalar::U128 => align_of::<u128>(),
            Scalar::F64 => align_of::<f64>(),
            Scalar::I64 | Scalar::U64 => align_of::<u64>(),
            other => other.size(),
        }
    }

    pub fn is_bool(self) -> bool {
        self == Scalar::Bool
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::F32 | Scalar::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Scalar::I8
                | Scalar::I16
                | Scalar::I32
                | Scalar::I64
                | Scalar::I128
                | Scalar::Isize
                | Scalar::F32
                | Scalar::F64
        )
    }

    pub fn is_integer(self) -> bool {
        !self.is_bool() && !self.is_float()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a base type is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Scalar(Scalar),
    /// A C-like enumeration stored as its underlying integer.
    Enumeration(Scalar),
    /// A plain struct without hidden polymorphic state.
    Aggregate { size: usize, align: usize },
    /// A foreign-structure view, optionally bound to a fixed size.
    View { size: Option<usize> },
    /// The fixed size placeholder of a view.
    WeakView { size: usize },
    /// Code. Only reachable through pointers or as a call target.
    Function,
}

/// The innermost type of a declaration, together with its own const / volatile marking.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseType {
    name: String,
    kind: BaseKind,
    qualifiers: Qualifiers,
}

impl BaseType {
    pub fn new<N: Into<String>>(name: N, kind: BaseKind) -> Self {
        Self {
            name: name.into(),
            kind,
            qualifiers: Qualifiers::empty(),
        }
    }

    pub fn scalar(scalar: Scalar) -> Self {
        Self::new(scalar.name(), BaseKind::Scalar(scalar))
    }

    pub fn enumeration<N: Into<String>>(name: N, repr: Scalar) -> Self {
        Self::new(name, BaseKind::Enumeration(repr))
    }

    pub fn aggregate<N: Into<String>>(name: N, size: usize, align: usize) -> Self {
        Self::new(name, BaseKind::Aggregate { size, align })
    }

    pub fn view<N: Into<String>>(name: N, size: Option<usize>) -> Self {
        Self::new(name, BaseKind::View { size })
    }

    pub fn weak_view<N: Into<String>>(name: N, size: usize) -> Self {
        Self::new(name, BaseKind::WeakView { size })
    }

    pub fn function() -> Self {
        Self::new("fn", BaseKind::Function)
    }

    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BaseKind {
        &self.kind
    }

    pub fn qualifiers(&self) -> Qualifiers {
        self.qualifiers
    }

    pub fn is_view(&self) -> bool {
        matches!(self.kind, BaseKind::View { .. })
    }

    /// Returns true for types that forward member access: aggregates and weak views.
    pub fn is_record(&self) -> bool {
        matches!(
            self.kind,
            BaseKind::Aggregate { .. } | BaseKind::WeakView { .. }
        )
    }

    /// Size of the storage this type occupies in foreign memory.
    pub fn size(&self) -> Result<usize> {
        match self.kind {
            BaseKind::Scalar(scalar) | BaseKind::Enumeration(scalar) => Ok(scalar.size()),
            BaseKind::Aggregate { size, .. } => Ok(size),
            BaseKind::WeakView { size } | BaseKind::View { size: Some(size) } => Ok(size),
            BaseKind::View { size: None } => {
                Err(Error(ErrorOrigin::Qualifier, ErrorKind::UnsizedView))
            }
            BaseKind::Function => Err(Error(ErrorOrigin::Qualifier, ErrorKind::UnsupportedType)),
        }
    }

    /// Required alignment of the storage. Views and weak views are byte aligned.
    pub fn align(&self) -> usize {
        match self.kind {
            BaseKind::Scalar(scalar) | BaseKind::Enumeration(scalar) => scalar.align(),
            BaseKind::Aggregate { align, .. } => align.max(1),
            _ => 1,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.qualifiers.contains(Qualifiers::CONST) {
            f.write_str("const ")?;
        }
        if self.qualifiers.contains(Qualifiers::VOLATILE) {
            f.write_str("volatile ")?;
        }
        f.write_str(&self.name)
    }
}

/// A declared member type.
///
/// The outermost variant is the outermost layer: `Array { element: Pointer { .. } }` is an array
/// of pointers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Base(BaseType),
    Pointer {
        qualifiers: Qualifiers,
        pointee: Box<DeclaredType>,
    },
    Reference(Box<DeclaredType>),
    RvalueReference(Box<DeclaredType>),
    Array {
        len: Option<usize>,
        element: Box<DeclaredType>,
    },
}

impl DeclaredType {
    pub fn scalar(scalar: Scalar) -> Self {
        DeclaredType::Base(BaseType::scalar(scalar))
    }

    pub fn pointer(pointee: DeclaredType, qualifiers: Qualifiers) -> Self {
        DeclaredType::Pointer {
            qualifiers,
            pointee: Box::new(pointee),
        }
    }

    pub fn reference(inner: DeclaredType) -> Self {
        DeclaredType::Reference(Box::new(inner))
    }

    pub fn rvalue_reference(inner: DeclaredType) -> Self {
        DeclaredType::RvalueReference(Box::new(inner))
    }

    pub fn array(element: DeclaredType, len: usize) -> Self {
        DeclaredType::Array {
            len: Some(len),
            element: Box::new(element),
        }
    }

    pub fn unsized_array(element: DeclaredType) -> Self {
        DeclaredType::Array {
            len: None,
            element: Box::new(element),
        }
    }

    /// Returns the innermost base type.
    pub fn base(&self) -> &BaseType {
        match self {
            DeclaredType::Base(base) => base,
            DeclaredType::Pointer { pointee: inner, .. }
            | DeclaredType::Reference(inner)
            | DeclaredType::RvalueReference(inner)
            | DeclaredType::Array { element: inner, .. } => inner.base(),
        }
    }

    /// Returns the type one layer further in, or `None` for base types.
    pub fn inner(&self) -> Option<&DeclaredType> {
        match self {
            DeclaredType::Base(_) => None,
            DeclaredType::Pointer { pointee: inner, .. }
            | DeclaredType::Reference(inner)
            | DeclaredType::RvalueReference(inner)
            | DeclaredType::Array { element: inner, .. } => Some(&**inner),
        }
    }

    /// Returns true if the type mentions a reference in any layer.
    pub fn contains_reference(&self) -> bool {
        match self {
            DeclaredType::Reference(_) | DeclaredType::RvalueReference(_) => true,
            other => other.inner().map_or(false, DeclaredType::contains_reference),
        }
    }

    /// Returns true if the type mentions an array of unknown size in any layer.
    pub fn contains_unsized_array(&self) -> bool {
        match self {
            DeclaredType::Array { len: None, .. } => true,
            other => other
                .inner()
                .map_or(false, DeclaredType::contains_unsized_array),
        }
    }

    /// Size of the storage a member of this type occupies in foreign memory.
    ///
    /// Pointers and references are pointer sized regardless of what they point to, which is what
    /// keeps self-referential layouts finite.
    pub fn size(&self) -> Result<usize> {
        match self {
            DeclaredType::Base(base) => base.size(),
            DeclaredType::Pointer { .. }
            | DeclaredType::Reference(_)
            | DeclaredType::RvalueReference(_) => Ok(POINTER_SIZE),
            DeclaredType::Array {
                len: Some(len),
                element,
            } => element
                .size()?
                .checked_mul(*len)
                .ok_or(Error(ErrorOrigin::Qualifier, ErrorKind::OutOfBounds)),
            DeclaredType::Array { len: None, .. } => {
                Err(Error(ErrorOrigin::Qualifier, ErrorKind::UnknownSizeArray))
            }
        }
    }

    /// Required alignment of the storage.
    pub fn align(&self) -> usize {
        match self {
            DeclaredType::Base(base) => base.align(),
            DeclaredType::Array { element, .. } => element.align(),
            _ => POINTER_SIZE,
        }
    }
}

impl From<BaseType> for DeclaredType {
    fn from(base: BaseType) -> Self {
        DeclaredType::Base(base)
    }
}

/// Formats the type in the expression syntax accepted by [`parse_type`].
impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeclaredType::Base(base) => write!(f, "{}", base),
            DeclaredType::Pointer {
                qualifiers,
                pointee,
            } => {
                if qualifiers.contains(Qualifiers::CONST) {
                    f.write_str("*const ")?;
                } else {
                    f.write_str("*mut ")?;
                }
                if qualifiers.contains(Qualifiers::VOLATILE) {
                    f.write_str("volatile ")?;
                }
                write!(f, "{}", pointee)
            }
            DeclaredType::Reference(inner) => write!(f, "&{}", inner),
            DeclaredType::RvalueReference(inner) => write!(f, "&&{}", inner),
            DeclaredType::Array {
                len: Some(len),
                element,
            } => write!(f, "[{}; {}]", element, len),
            DeclaredType::Array { len: None, element } => write!(f, "[{}]", element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names_round_trip() {
        for scalar in Scalar::ALL.iter() {
            assert_eq!(Scalar::from_name(scalar.name()), Some(*scalar));
        }
        assert_eq!(Scalar::from_name("int"), None);
    }

    #[test]
    fn scalar_classes() {
        assert!(Scalar::F32.is_float());
        assert!(Scalar::F64.is_signed());
        assert!(!Scalar::U8.is_signed());
        assert!(Scalar::Usize.is_integer());
        assert!(!Scalar::Bool.is_integer());
        assert_eq!(Scalar::I128.size(), 16);
    }

    #[test]
    fn sizes() {
        let node = DeclaredType::Base(BaseType::weak_view("Node", 0x18));
        assert_eq!(node.size().unwrap(), 0x18);
        assert_eq!(DeclaredType::array(node.clone(), 12).size().unwrap(), 12 * 0x18);
        assert_eq!(
            DeclaredType::pointer(node, Qualifiers::empty())
                .size()
                .unwrap(),
            POINTER_SIZE
        );
        assert_eq!(
            DeclaredType::Base(BaseType::view("Opaque", None)).size(),
            Err(Error(ErrorOrigin::Qualifier, ErrorKind::UnsizedView))
        );
    }

    #[test]
    fn display() {
        let declared = DeclaredType::array(
            DeclaredType::pointer(
                DeclaredType::Base(
                    BaseType::view("Node", Some(8)).with_qualifiers(Qualifiers::CONST),
                ),
                Qualifiers::CONST | Qualifiers::VOLATILE,
            ),
            12,
        );
        assert_eq!(declared.to_string(), "[*const volatile const Node; 12]");
        assert_eq!(
            DeclaredType::reference(DeclaredType::scalar(Scalar::U8)).to_string(),
            "&u8"
        );
    }

    #[test]
    fn nested_checks() {
        let declared = DeclaredType::array(
            DeclaredType::pointer(
                DeclaredType::unsized_array(DeclaredType::scalar(Scalar::U8)),
                Qualifiers::empty(),
            ),
            2,
        );
        assert!(declared.contains_unsized_array());
        assert!(!declared.contains_reference());
        assert_eq!(declared.base(), &BaseType::scalar(Scalar::U8));
    }
}
