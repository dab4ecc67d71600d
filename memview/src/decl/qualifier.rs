/*!
Qualifier layers and the reversible decomposition of declared types.

A declared type such as `[*const Node; 12]` is split into its base type (`Node`) and a stack of
wrapping layers, outermost first (`array(12)`, `pointer(const)`). The stack can later be
reapplied onto another base type, which is how views nested inside declarations are swapped for
their fixed size placeholders without touching the surrounding structure.
*/

use std::prelude::v1::*;

use super::{BaseType, DeclaredType};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};

use log::trace;
use smallvec::SmallVec;

bitflags! {
    /// const / volatile marking of a pointer layer or of a base type.
    #[derive(Default)]
    pub struct Qualifiers: u8 {
        const CONST = 0b01;
        const VOLATILE = 0b10;
    }
}

/// The kind of a single wrapping step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Pointer,
    Reference,
    Array(usize),
}

/// One wrapping step of a declared type.
///
/// Only pointer layers carry qualifiers; the constructors of reference and array layers always
/// produce empty qualifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layer {
    kind: LayerKind,
    qualifiers: Qualifiers,
}

impl Layer {
    pub const fn pointer(qualifiers: Qualifiers) -> Self {
        Self {
            kind: LayerKind::Pointer,
            qualifiers,
        }
    }

    pub const fn reference() -> Self {
        Self {
            kind: LayerKind::Reference,
            qualifiers: Qualifiers::empty(),
        }
    }

    pub const fn array(len: usize) -> Self {
        Self {
            kind: LayerKind::Array(len),
            qualifiers: Qualifiers::empty(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn qualifiers(&self) -> Qualifiers {
        self.qualifiers
    }

    /// Wraps `inner` into this layer.
    pub fn wrap(&self, inner: DeclaredType) -> DeclaredType {
        match self.kind {
            LayerKind::Pointer => DeclaredType::Pointer {
                qualifiers: self.qualifiers,
                pointee: Box::new(inner),
            },
            LayerKind::Reference => DeclaredType::Reference(Box::new(inner)),
            LayerKind::Array(len) => DeclaredType::Array {
                len: Some(len),
                element: Box::new(inner),
            },
        }
    }
}

/// Ordered list of layers, outermost first.
///
/// A stack is immutable once derived. Its length is the depth of the declared type it was
/// derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QualifierStack {
    layers: SmallVec<[Layer; 4]>,
}

impl QualifierStack {
    /// Creates a stack without any layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack from layers ordered outermost first.
    pub fn from_layers<I: IntoIterator<Item = Layer>>(layers: I) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn outermost(&self) -> Option<&Layer> {
        self.layers.first()
    }

    /// Returns true if any layer of the stack is a reference.
    pub fn has_reference(&self) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.kind == LayerKind::Reference)
    }

    /// Wraps `base` with every layer of this stack, innermost first.
    pub fn reapply(&self, base: BaseType) -> DeclaredType {
        self.layers
            .iter()
            .rev()
            .fold(DeclaredType::Base(base), |inner, layer| layer.wrap(inner))
    }
}

/// Splits a declared type into its base type and its qualifier stack.
///
/// Layers are peeled from the outside in. Arrays without a known length and rvalue references
/// are rejected.
///
/// # Examples
///
/// ```
/// use memview::decl::{derive, BaseType, DeclaredType, Layer, Qualifiers, Scalar};
///
/// let declared = DeclaredType::array(
///     DeclaredType::pointer(DeclaredType::scalar(Scalar::I32), Qualifiers::CONST),
///     4,
/// );
/// let (base, stack) = derive(&declared).unwrap();
///
/// assert_eq!(base, BaseType::scalar(Scalar::I32));
/// assert_eq!(stack.layers(), &[Layer::array(4), Layer::pointer(Qualifiers::CONST)]);
/// ```
pub fn derive(declared: &DeclaredType) -> Result<(BaseType, QualifierStack)> {
    let mut layers = SmallVec::<[Layer; 4]>::new();
    let mut current = declared;

    let base = loop {
        current = match current {
            DeclaredType::Base(base) => break base.clone(),
            DeclaredType::Pointer {
                qualifiers,
                pointee,
            } => {
                layers.push(Layer::pointer(*qualifiers));
                &**pointee
            }
            DeclaredType::Reference(inner) => {
                layers.push(Layer::reference());
                &**inner
            }
            DeclaredType::Array {
                len: Some(len),
                element,
            } => {
                layers.push(Layer::array(*len));
                &**element
            }
            DeclaredType::Array { len: None, .. } => {
                return Err(Error(ErrorOrigin::Qualifier, ErrorKind::UnknownSizeArray));
            }
            DeclaredType::RvalueReference(_) => {
                return Err(Error(ErrorOrigin::Qualifier, ErrorKind::RvalueReference));
            }
        };
    };

    trace!(
        "derived base {} with {} layer(s) from {}",
        base,
        layers.len(),
        declared
    );

    Ok((base, QualifierStack { layers }))
}

/// Wraps `base` with every layer of `stack`, walking from the innermost to the outermost layer.
///
/// `derive(&reapply(base, &stack)) == Ok((base, stack))` for every stack produced by [`derive`].
pub fn reapply(base: BaseType, stack: &QualifierStack) -> DeclaredType {
    stack.reapply(base)
}
