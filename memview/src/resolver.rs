/*!
Address resolution strategies.

A resolver maps the base address of a member's parent to the address of the member itself.
Resolvers are pure functions of the base address: they hold no state, can be evaluated any
number of times and from any thread.
*/

use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::types::{Address, POINTER_SIZE};

use log::debug;

/// Inheritance model of the class a virtual table belongs to.
///
/// Only single inheritance produces the plain pointer-array vtable layout that
/// [`Resolver::VirtualTable`] understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InheritanceModel {
    Single,
    Multiple,
    Virtual,
}

impl InheritanceModel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(InheritanceModel::Single),
            "multiple" => Some(InheritanceModel::Multiple),
            "virtual" => Some(InheritanceModel::Virtual),
            _ => None,
        }
    }
}

/// Computes the address of a member from the base address of its parent.
#[derive(Copy, Clone, Debug)]
pub enum Resolver {
    /// `base + n`.
    Offset(isize),
    /// A fixed address, the base is ignored.
    Absolute(Address),
    /// `*(*(base + vtable_offset) + index * POINTER_SIZE)`.
    VirtualTable { index: usize, vtable_offset: isize },
    /// A caller supplied pure function.
    Custom(fn(Address) -> Address),
}

impl Resolver {
    pub const fn offset(n: isize) -> Self {
        Resolver::Offset(n)
    }

    /// The resolver a weak view uses to become a strong view: it returns the base unchanged.
    pub const fn identity() -> Self {
        Resolver::Offset(0)
    }

    pub const fn absolute(address: Address) -> Self {
        Resolver::Absolute(address)
    }

    /// Resolves slot `index` of a single inheritance vtable whose pointer lives at
    /// `base + vtable_offset`.
    pub const fn virtual_table(index: usize, vtable_offset: isize) -> Self {
        Resolver::VirtualTable {
            index,
            vtable_offset,
        }
    }

    /// Like [`virtual_table`](Self::virtual_table), but rejects vtable shapes this resolver
    /// cannot follow.
    ///
    /// # Examples
    ///
    /// ```
    /// use memview::resolver::{InheritanceModel, Resolver};
    ///
    /// assert!(Resolver::virtual_table_for(2, 0, InheritanceModel::Single).is_ok());
    /// assert!(Resolver::virtual_table_for(2, 0, InheritanceModel::Virtual).is_err());
    /// ```
    pub fn virtual_table_for(
        index: usize,
        vtable_offset: isize,
        model: InheritanceModel,
    ) -> Result<Self> {
        match model {
            InheritanceModel::Single => Ok(Self::virtual_table(index, vtable_offset)),
            other => Err(Error(ErrorOrigin::Resolver, ErrorKind::UnsupportedVtable)
                .log_debug(format_args!("{:?} inheritance at slot {}", other, index))),
        }
    }

    pub const fn custom(resolve: fn(Address) -> Address) -> Self {
        Resolver::Custom(resolve)
    }

    /// Returns true if resolving reads foreign memory.
    pub fn reads_memory(&self) -> bool {
        matches!(self, Resolver::VirtualTable { .. })
    }

    /// Computes the target address for `base`.
    ///
    /// # Safety
    ///
    /// For [`Resolver::VirtualTable`], `base + vtable_offset` must hold a pointer to a table of at
    /// least `index + 1` pointer sized slots. The other strategies never touch memory.
    pub unsafe fn resolve(&self, base: Address) -> Address {
        match *self {
            Resolver::Offset(n) => base.offset(n),
            Resolver::Absolute(address) => address,
            Resolver::VirtualTable {
                index,
                vtable_offset,
            } => {
                let vtable = base.offset(vtable_offset).read_address();
                vtable.wrapping_add(index.wrapping_mul(POINTER_SIZE)).read_address()
            }
            Resolver::Custom(resolve) => resolve(base),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::identity()
    }
}

/// Logs the resolver a member was declared with.
pub(crate) fn log_declaration(name: &str, resolver: &Resolver) {
    debug!("member {} resolves via {:?}", name, resolver);
}
