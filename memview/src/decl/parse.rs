/*!
Parser for type expressions.

Type expressions use a Rust flavoured syntax with the outermost layer written first:

```text
*const Node          const pointer to Node
[*mut u8; 0x10]      array of 16 mutable byte pointers
*mut volatile i32    volatile qualified pointer
const f32            const qualified base type
&u32                 reference (rejected later when used as a field)
[u8]                 array of unknown size (rejected by derive)
```
*/

use std::prelude::v1::*;

use std::str::FromStr;

use super::{BaseType, DeclaredType, Qualifiers, Scalar};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    Star,
    Amp,
    LBracket,
    RBracket,
    Semi,
    Ident(&'a str),
    Int(usize),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    peeked: Option<Option<Token<'a>>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            peeked: None,
        }
    }

    fn peek(&mut self) -> Result<Option<Token<'a>>> {
        if let Some(token) = self.peeked {
            return Ok(token);
        }
        let token = self.lex()?;
        self.peeked = Some(token);
        Ok(token)
    }

    fn next(&mut self) -> Result<Option<Token<'a>>> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex(),
        }
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<()> {
        match self.next()? {
            Some(token) if token == expected => Ok(()),
            _ => Err(syntax_error()),
        }
    }

    fn lex(&mut self) -> Result<Option<Token<'a>>> {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();

        let c = match trimmed.chars().next() {
            Some(c) => c,
            None => return Ok(None),
        };

        let punct = match c {
            '*' => Some(Token::Star),
            '&' => Some(Token::Amp),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ';' => Some(Token::Semi),
            _ => None,
        };
        if let Some(token) = punct {
            self.pos += 1;
            return Ok(Some(token));
        }

        let len = trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(trimmed.len());
        if len == 0 {
            return Err(syntax_error());
        }

        let word = &trimmed[..len];
        self.pos += len;

        if c.is_ascii_digit() {
            parse_int(word).map(|value| Some(Token::Int(value)))
        } else {
            Ok(Some(Token::Ident(word)))
        }
    }
}

fn syntax_error() -> Error {
    Error(ErrorOrigin::Parser, ErrorKind::InvalidSyntax)
}

/// Parses a decimal or `0x` prefixed hexadecimal integer, allowing `_` separators.
pub(crate) fn parse_int(word: &str) -> Result<usize> {
    let digits: String = word.chars().filter(|c| *c != '_').collect();
    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        usize::from_str_radix(hex, 16)
    } else {
        digits.parse::<usize>()
    };
    parsed.map_err(|_| syntax_error())
}

/// Parses a signed integer, accepting a leading `-`.
pub(crate) fn parse_signed_int(word: &str) -> Result<isize> {
    let word = word.trim();
    match word.strip_prefix('-') {
        Some(magnitude) => parse_int(magnitude.trim()).map(|v| (v as isize).wrapping_neg()),
        None => parse_int(word).map(|v| v as isize),
    }
}

struct Parser<'a, F> {
    lexer: Lexer<'a>,
    lookup: F,
}

impl<'a, F: Fn(&str) -> Option<BaseType>> Parser<'a, F> {
    fn parse(&mut self) -> Result<DeclaredType> {
        match self.lexer.next()?.ok_or_else(syntax_error)? {
            Token::Amp => {
                if self.lexer.peek()? == Some(Token::Amp) {
                    self.lexer.next()?;
                    Ok(DeclaredType::rvalue_reference(self.parse()?))
                } else {
                    Ok(DeclaredType::reference(self.parse()?))
                }
            }
            Token::Star => {
                let qualifiers = self.pointer_qualifiers()?;
                Ok(DeclaredType::pointer(self.parse()?, qualifiers))
            }
            Token::LBracket => {
                let element = self.parse()?;
                match self.lexer.next()?.ok_or_else(syntax_error)? {
                    Token::RBracket => Ok(DeclaredType::unsized_array(element)),
                    Token::Semi => {
                        let len = match self.lexer.next()? {
                            Some(Token::Int(len)) => len,
                            _ => return Err(syntax_error()),
                        };
                        self.lexer.expect(Token::RBracket)?;
                        Ok(DeclaredType::array(element, len))
                    }
                    _ => Err(syntax_error()),
                }
            }
            Token::Ident(word) => self.base(word),
            _ => Err(syntax_error()),
        }
    }

    // `mut` or `const`, then optionally `volatile`. Anything after belongs to the pointee.
    fn pointer_qualifiers(&mut self) -> Result<Qualifiers> {
        let mut qualifiers = Qualifiers::empty();
        match self.lexer.peek()? {
            Some(Token::Ident("mut")) => {
                self.lexer.next()?;
            }
            Some(Token::Ident("const")) => {
                self.lexer.next()?;
                qualifiers |= Qualifiers::CONST;
            }
            _ => {}
        }
        if self.lexer.peek()? == Some(Token::Ident("volatile")) {
            self.lexer.next()?;
            qualifiers |= Qualifiers::VOLATILE;
        }
        Ok(qualifiers)
    }

    fn base(&mut self, first: &'a str) -> Result<DeclaredType> {
        let mut qualifiers = Qualifiers::empty();
        let mut word = first;
        loop {
            match word {
                "const" => qualifiers |= Qualifiers::CONST,
                "volatile" => qualifiers |= Qualifiers::VOLATILE,
                _ => break,
            }
            word = match self.lexer.next()? {
                Some(Token::Ident(word)) => word,
                _ => return Err(syntax_error()),
            };
        }

        let base = if let Some(scalar) = Scalar::from_name(word) {
            BaseType::scalar(scalar)
        } else if word == "fn" {
            BaseType::function()
        } else {
            (self.lookup)(word).ok_or(Error(ErrorOrigin::Parser, ErrorKind::NotFound))?
        };

        Ok(DeclaredType::Base(base.with_qualifiers(qualifiers)))
    }
}

/// Parses a type expression, resolving non-primitive names through `lookup`.
///
/// # Examples
///
/// ```
/// use memview::decl::{parse_type, BaseType, DeclaredType, Qualifiers, Scalar};
///
/// let node = BaseType::view("Node", Some(0x18));
/// let declared = parse_type("[*const Node; 4]", |name| {
///     if name == "Node" { Some(node.clone()) } else { None }
/// })
/// .unwrap();
///
/// assert_eq!(
///     declared,
///     DeclaredType::array(DeclaredType::pointer(node.clone().into(), Qualifiers::CONST), 4)
/// );
/// ```
pub fn parse_type<F>(source: &str, lookup: F) -> Result<DeclaredType>
where
    F: Fn(&str) -> Option<BaseType>,
{
    let mut parser = Parser {
        lexer: Lexer::new(source),
        lookup,
    };
    let declared = parser.parse()?;
    match parser.lexer.next()? {
        None => Ok(declared),
        Some(_) => Err(syntax_error()),
    }
}

/// Parses type expressions that only mention primitive types.
impl FromStr for DeclaredType {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        parse_type(source, |_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<BaseType> {
        match name {
            "Node" => Some(BaseType::view("Node", Some(0x18))),
            "Vec3" => Some(BaseType::aggregate("Vec3", 12, 4)),
            _ => None,
        }
    }

    #[test]
    fn parse_scalars() {
        assert_eq!(
            "i32".parse::<DeclaredType>().unwrap(),
            DeclaredType::scalar(Scalar::I32)
        );
        assert_eq!(
            "const volatile f64".parse::<DeclaredType>().unwrap(),
            DeclaredType::Base(
                BaseType::scalar(Scalar::F64)
                    .with_qualifiers(Qualifiers::CONST | Qualifiers::VOLATILE)
            )
        );
    }

    #[test]
    fn parse_layers() {
        let declared = parse_type("[*mut volatile Node; 0x10]", lookup).unwrap();
        assert_eq!(
            declared,
            DeclaredType::array(
                DeclaredType::pointer(
                    DeclaredType::Base(BaseType::view("Node", Some(0x18))),
                    Qualifiers::VOLATILE
                ),
                16
            )
        );
    }

    #[test]
    fn parse_pointer_to_qualified_base() {
        assert_eq!(
            "*const const u8".parse::<DeclaredType>().unwrap(),
            DeclaredType::pointer(
                DeclaredType::Base(BaseType::scalar(Scalar::U8).with_qualifiers(Qualifiers::CONST)),
                Qualifiers::CONST
            )
        );
        assert_eq!(
            "*volatile u8".parse::<DeclaredType>().unwrap(),
            DeclaredType::pointer(DeclaredType::scalar(Scalar::U8), Qualifiers::VOLATILE)
        );
    }

    #[test]
    fn parse_references() {
        assert_eq!(
            "&u8".parse::<DeclaredType>().unwrap(),
            DeclaredType::reference(DeclaredType::scalar(Scalar::U8))
        );
        assert_eq!(
            "&&u8".parse::<DeclaredType>().unwrap(),
            DeclaredType::rvalue_reference(DeclaredType::scalar(Scalar::U8))
        );
    }

    #[test]
    fn parse_unsized_array() {
        assert_eq!(
            "[u16]".parse::<DeclaredType>().unwrap(),
            DeclaredType::unsized_array(DeclaredType::scalar(Scalar::U16))
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "Node".parse::<DeclaredType>().unwrap_err(),
            Error(ErrorOrigin::Parser, ErrorKind::NotFound)
        );
        assert_eq!(
            "[u8; ]".parse::<DeclaredType>().unwrap_err(),
            Error(ErrorOrigin::Parser, ErrorKind::InvalidSyntax)
        );
        assert_eq!(
            "u8 u8".parse::<DeclaredType>().unwrap_err(),
            Error(ErrorOrigin::Parser, ErrorKind::InvalidSyntax)
        );
        assert!("".parse::<DeclaredType>().is_err());
        assert!("*".parse::<DeclaredType>().is_err());
    }

    #[test]
    fn display_parses_back() {
        for source in &[
            "*const Vec3",
            "[[*mut Node; 2]; 3]",
            "*const volatile const volatile u64",
            "&[fn; 4]",
            "*mut *mut *const i8",
        ] {
            let declared = parse_type(source, lookup).unwrap();
            assert_eq!(parse_type(&declared.to_string(), lookup).unwrap(), declared);
        }
    }

    #[test]
    fn integers() {
        assert_eq!(parse_int("0x18").unwrap(), 0x18);
        assert_eq!(parse_int("1_000").unwrap(), 1000);
        assert_eq!(parse_signed_int("-0x10").unwrap(), -16);
        assert_eq!(parse_signed_int("42").unwrap(), 42);
        assert!(parse_int("0xzz").is_err());
    }
}
