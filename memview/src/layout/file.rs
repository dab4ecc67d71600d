/*!
The TOML representation of layout files.
*/

use std::prelude::v1::*;

use std::fmt;

use crate::decl::parse::{parse_int, parse_signed_int};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};

use serde::Deserialize;

/// A parsed layout file.
///
/// ```toml
/// [[aggregate]]
/// name = "Vec3"
/// size = 12
/// align = 4
///
///   [[aggregate.field]]
///   name = "x"
///   type = "f32"
///   offset = 0
///
/// [[enumeration]]
/// name = "Gender"
/// repr = "u8"
///
/// [[view]]
/// name = "Node"
/// size = 0x18
///
///   [[view.field]]
///   name = "value"
///   type = "i32"
///   offset = 0x0
///
///   [[view.field]]
///   name = "next"
///   type = "*mut Node"
///   offset = 0x8
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LayoutFile {
    #[serde(default, rename = "aggregate")]
    pub aggregates: Vec<AggregateEntry>,
    #[serde(default, rename = "enumeration")]
    pub enumerations: Vec<EnumerationEntry>,
    #[serde(default, rename = "view")]
    pub views: Vec<ViewEntry>,
}

impl LayoutFile {
    pub fn from_toml(source: &str) -> Result<Self> {
        ::toml::from_str(source)
            .map_err(|err| Error(ErrorOrigin::Layout, ErrorKind::InvalidSyntax).log_debug(err))
    }

    /// Reads and parses a layout file from disk.
    pub fn open<P: AsRef<::std::path::Path>>(path: P) -> Result<Self> {
        let contents = ::std::fs::read_to_string(path.as_ref()).map_err(|err| {
            Error(ErrorOrigin::Layout, ErrorKind::NotFound)
                .log_debug(format_args!("{}: {}", path.as_ref().display(), err))
        })?;
        Self::from_toml(&contents)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AggregateEntry {
    pub name: String,
    pub size: usize,
    pub align: Option<usize>,
    /// Members are plain data at non negative offsets.
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnumerationEntry {
    pub name: String,
    pub repr: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewEntry {
    pub name: String,
    /// Views without a size can only be used at the top level, never as a member type.
    pub size: Option<usize>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub offset: Option<Number>,
    pub absolute: Option<Number>,
    pub vtable: Option<usize>,
    pub vtable_offset: Option<Number>,
    pub inheritance: Option<String>,
}

/// An integer written either as a TOML integer or as a string.
///
/// Strings accept a leading `-`, decimal and `0x` prefixed hexadecimal digits and `_` separators.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Text(String),
}

impl Number {
    pub fn to_isize(&self) -> Result<isize> {
        match self {
            Number::Int(value) => Ok(*value as isize),
            Number::Text(text) => parse_signed_int(text),
        }
    }

    pub fn to_usize(&self) -> Result<usize> {
        match self {
            Number::Int(value) if *value >= 0 => Ok(*value as usize),
            Number::Int(_) => Err(Error(ErrorOrigin::Layout, ErrorKind::OutOfBounds)),
            Number::Text(text) => parse_int(text.trim()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{:#x}", value),
            Number::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tables() {
        let file = LayoutFile::from_toml(
            "
[[aggregate]]
name = \"Vec3\"
size = 12

  [[aggregate.field]]
  name = \"y\"
  type = \"f32\"
  offset = 4

[[view]]
name = \"Node\"
size = 0x18

  [[view.field]]
  name = \"value\"
  type = \"i32\"
  offset = 0

  [[view.field]]
  name = \"prev\"
  type = \"*mut Node\"
  offset = \"-0x8\"

  [[view.field]]
  name = \"speak\"
  type = \"fn\"
  vtable = 2",
        )
        .unwrap();

        assert_eq!(file.aggregates.len(), 1);
        assert_eq!(file.aggregates[0].align, None);
        assert_eq!(file.aggregates[0].fields[0].name, "y");
        assert!(file.enumerations.is_empty());

        let node = &file.views[0];
        assert_eq!(node.size, Some(0x18));
        assert_eq!(node.fields.len(), 3);
        assert_eq!(node.fields[0].offset, Some(Number::Int(0)));
        assert_eq!(node.fields[1].offset.as_ref().unwrap().to_isize(), Ok(-8));
        assert_eq!(node.fields[2].vtable, Some(2));
        assert_eq!(node.fields[2].offset, None);
    }

    #[test]
    fn numbers() {
        assert_eq!(Number::Int(-16).to_isize(), Ok(-16));
        assert_eq!(Number::Text("0x1_000".into()).to_usize(), Ok(0x1000));
        assert_eq!(Number::Text(" -0x10 ".into()).to_isize(), Ok(-0x10));
        assert!(Number::Int(-1).to_usize().is_err());
        assert!(Number::Text("ten".into()).to_isize().is_err());
    }

    #[test]
    fn invalid_toml() {
        assert_eq!(
            LayoutFile::from_toml("[[view]\nname = 1").unwrap_err(),
            Error(ErrorOrigin::Layout, ErrorKind::InvalidSyntax)
        );
    }
}
