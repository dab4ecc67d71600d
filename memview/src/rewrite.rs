/*!
Replaces views inside declarations with their fixed size placeholders.

A view member that refers to another view (or to its own type through a pointer) must not embed
that view's members, otherwise layouts would grow without bound. The rewriter swaps every view
base type for a weak view of identical size while keeping the surrounding layers untouched.
*/

use crate::decl::{derive, BaseKind, BaseType, DeclaredType};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};

use log::trace;

/// Rewrites a single base type.
///
/// Views with a fixed size become weak views of that size, keeping their name and qualifiers.
/// Views without a size cannot be rewritten. Every other base type passes through unchanged.
pub fn rewrite(base: &BaseType) -> Result<BaseType> {
    match base.kind() {
        BaseKind::View { size: Some(size) } => {
            Ok(BaseType::weak_view(base.name(), *size).with_qualifiers(base.qualifiers()))
        }
        BaseKind::View { size: None } => Err(Error(ErrorOrigin::Rewriter, ErrorKind::UnsizedView)
            .log_debug(format_args!("view {} has no size", base.name()))),
        _ => Ok(base.clone()),
    }
}

/// Rewrites the base of a declared type and reapplies the original layers.
///
/// # Examples
///
/// ```
/// use memview::decl::{BaseType, DeclaredType, Qualifiers};
/// use memview::rewrite::rewrite_declared;
///
/// let declared = DeclaredType::array(
///     DeclaredType::pointer(BaseType::view("Node", Some(0x18)).into(), Qualifiers::empty()),
///     4,
/// );
/// let rewritten = rewrite_declared(&declared).unwrap();
///
/// assert_eq!(
///     rewritten,
///     DeclaredType::array(
///         DeclaredType::pointer(BaseType::weak_view("Node", 0x18).into(), Qualifiers::empty()),
///         4,
///     )
/// );
/// ```
pub fn rewrite_declared(declared: &DeclaredType) -> Result<DeclaredType> {
    let (base, stack) = derive(declared)?;
    let rewritten = rewrite(&base)?;
    if rewritten != base {
        trace!("rewrote {} into {}", base, rewritten.name());
    }
    Ok(stack.reapply(rewritten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Qualifiers, Scalar};

    #[test]
    fn non_views_pass_through() {
        let bases = [
            BaseType::scalar(Scalar::U32),
            BaseType::aggregate("Vec3", 12, 4),
            BaseType::enumeration("Gender", Scalar::U8),
            BaseType::weak_view("Node", 8),
            BaseType::function(),
        ];
        for base in bases.iter() {
            assert_eq!(&rewrite(base).unwrap(), base);
        }
    }

    #[test]
    fn sized_view_becomes_weak() {
        let base = BaseType::view("Node", Some(0x18)).with_qualifiers(Qualifiers::CONST);
        let rewritten = rewrite(&base).unwrap();
        assert_eq!(rewritten.kind(), &BaseKind::WeakView { size: 0x18 });
        assert_eq!(rewritten.qualifiers(), Qualifiers::CONST);
        assert_eq!(rewritten.name(), "Node");
        assert_eq!(rewritten.size().unwrap(), base.size().unwrap());
    }

    #[test]
    fn unsized_view_is_rejected() {
        assert_eq!(
            rewrite(&BaseType::view("Opaque", None)).unwrap_err(),
            Error(ErrorOrigin::Rewriter, ErrorKind::UnsizedView)
        );
        // a pointer does not make an unsized view acceptable
        let declared = DeclaredType::pointer(
            BaseType::view("Opaque", None).into(),
            Qualifiers::empty(),
        );
        assert!(rewrite_declared(&declared).is_err());
    }

    #[test]
    fn rewrite_keeps_layers_and_size() {
        let declared = DeclaredType::array(
            DeclaredType::array(BaseType::view("Node", Some(0x18)).into(), 3),
            12,
        );
        let rewritten = rewrite_declared(&declared).unwrap();
        assert_eq!(rewritten.size().unwrap(), 12 * 3 * 0x18);
        assert_eq!(rewritten.size().unwrap(), declared.size().unwrap());

        let (_, before) = derive(&declared).unwrap();
        let (base, after) = derive(&rewritten).unwrap();
        assert_eq!(before, after);
        assert!(base.is_record());
    }

    #[test]
    fn rewrite_propagates_declaration_errors() {
        let declared = DeclaredType::unsized_array(DeclaredType::scalar(Scalar::U8));
        assert_eq!(
            rewrite_declared(&declared).unwrap_err(),
            Error(ErrorOrigin::Qualifier, ErrorKind::UnknownSizeArray)
        );
    }
}
