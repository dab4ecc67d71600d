/*!
Specialized `Error` and `Result` types for memview.
*/

use std::prelude::v1::*;
use std::{fmt, result};

use log::{debug, error, info, trace, warn};

#[cfg(feature = "std")]
use std::error;

/// An error raised while declaring or operating on a view.
///
/// The first member names the component that raised the error, the second one what went wrong.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Error(pub ErrorOrigin, pub ErrorKind);

impl Error {
    /// Returns a static string representing the type of error.
    pub fn as_str(&self) -> &'static str {
        self.1.to_str()
    }

    /// Returns a static string representing the type of error.
    pub fn into_str(self) -> &'static str {
        self.as_str()
    }

    /// Returns true if this error can only be raised while a layout is being declared.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self.1,
            ErrorKind::UnknownSizeArray
                | ErrorKind::RvalueReference
                | ErrorKind::ReferenceField
                | ErrorKind::UnsizedView
                | ErrorKind::UnsupportedVtable
                | ErrorKind::UnsupportedType
        )
    }

    pub fn log_error(self, err: impl fmt::Display) -> Self {
        error!("{}: {} ({})", self.0.to_str(), self.1.to_str(), err);
        self
    }

    pub fn log_warn(self, err: impl fmt::Display) -> Self {
        warn!("{}: {} ({})", self.0.to_str(), self.1.to_str(), err);
        self
    }

    pub fn log_info(self, err: impl fmt::Display) -> Self {
        info!("{}: {} ({})", self.0.to_str(), self.1.to_str(), err);
        self
    }

    pub fn log_debug(self, err: impl fmt::Display) -> Self {
        debug!("{}: {} ({})", self.0.to_str(), self.1.to_str(), err);
        self
    }

    pub fn log_trace(self, err: impl fmt::Display) -> Self {
        trace!("{}: {} ({})", self.0.to_str(), self.1.to_str(), err);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.0.to_str(), self.1.to_str())
    }
}

#[cfg(feature = "std")]
impl error::Error for Error {}

#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorOrigin {
    Qualifier,
    Rewriter,
    Dispatcher,
    Resolver,

    Field,
    View,
    Function,

    Layout,
    Parser,
    Module,
    Value,

    Other,
}

impl ErrorOrigin {
    /// Returns a static string representing the type of error.
    pub fn to_str(self) -> &'static str {
        match self {
            ErrorOrigin::Qualifier => "qualifier",
            ErrorOrigin::Rewriter => "rewriter",
            ErrorOrigin::Dispatcher => "dispatcher",
            ErrorOrigin::Resolver => "resolver",

            ErrorOrigin::Field => "field",
            ErrorOrigin::View => "view",
            ErrorOrigin::Function => "function",

            ErrorOrigin::Layout => "layout",
            ErrorOrigin::Parser => "parser",
            ErrorOrigin::Module => "module",
            ErrorOrigin::Value => "value",

            ErrorOrigin::Other => "other",
        }
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    UnknownSizeArray,
    RvalueReference,
    ReferenceField,
    UnsizedView,
    UnsupportedVtable,
    UnsupportedType,

    NotSupported,
    TypeMismatch,
    OutOfBounds,
    DivisionByZero,
    ZeroSized,

    NotFound,
    AlreadyExists,
    InvalidSyntax,
    Configuration,
    ModuleNotFound,

    Unknown,
}

impl ErrorKind {
    /// Returns a static string representing the type of error.
    pub fn to_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownSizeArray => "arrays of unknown size cannot be declared",
            ErrorKind::RvalueReference => "rvalue references cannot be declared",
            ErrorKind::ReferenceField => "reference qualified fields are not supported",
            ErrorKind::UnsizedView => "view type has no fixed size",
            ErrorKind::UnsupportedVtable => "only single inheritance vtables are supported",
            ErrorKind::UnsupportedType => "type cannot be stored in foreign memory",

            ErrorKind::NotSupported => "operation not supported by this type",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::OutOfBounds => "out of bounds",
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::ZeroSized => "zero sized",

            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::InvalidSyntax => "invalid syntax",
            ErrorKind::Configuration => "invalid configuration",
            ErrorKind::ModuleNotFound => "module not found",

            ErrorKind::Unknown => "unknown error",
        }
    }
}

/// Specialized `Result` type for memview results.
pub type Result<T> = result::Result<T, Error>;
