/*!
Values read from and written to dynamic fields.
*/

use std::prelude::v1::*;

use std::cmp::Ordering;
use std::{fmt, ptr};

use crate::decl::Scalar;
use crate::dispatch::{BinaryOp, CompareOp, UnaryOp};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::types::Address;

/// A value of a dynamic field.
///
/// Numeric fields produce the variant of their scalar (the underlying integer for
/// enumerations), pointer fields produce [`Value::Pointer`] and fields without an arithmetic
/// representation (arrays, aggregates, weak views) produce their raw bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
    Pointer(Address),
    Bytes(Vec<u8>),
}

fn mismatch() -> Error {
    Error(ErrorOrigin::Value, ErrorKind::TypeMismatch)
}

fn not_supported() -> Error {
    Error(ErrorOrigin::Value, ErrorKind::NotSupported)
}

macro_rules! each_integer {
    ($mac:ident!($($args:tt)*)) => {
        $mac!($($args)*; I8, I16, I32, I64, I128, Isize, U8, U16, U32, U64, U128, Usize)
    };
}

// converts a primitive into the variant of `scalar` with `as` semantics
macro_rules! from_primitive {
    ($scalar:expr, $value:expr) => {{
        let value = $value;
        match $scalar {
            Scalar::Bool => Value::Bool(value as f64 != 0.0),
            Scalar::I8 => Value::I8(value as i8),
            Scalar::I16 => Value::I16(value as i16),
            Scalar::I32 => Value::I32(value as i32),
            Scalar::I64 => Value::I64(value as i64),
            Scalar::I128 => Value::I128(value as i128),
            Scalar::Isize => Value::Isize(value as isize),
            Scalar::U8 => Value::U8(value as u8),
            Scalar::U16 => Value::U16(value as u16),
            Scalar::U32 => Value::U32(value as u32),
            Scalar::U64 => Value::U64(value as u64),
            Scalar::U128 => Value::U128(value as u128),
            Scalar::Usize => Value::Usize(value as usize),
            Scalar::F32 => Value::F32(value as f32),
            Scalar::F64 => Value::F64(value as f64),
        }
    }};
}

macro_rules! integer_binary {
    ($lhs:expr, $rhs:expr, $op:expr) => {{
        let (lhs, rhs) = ($lhs, $rhs);
        match $op {
            BinaryOp::Add => Ok(lhs.wrapping_add(rhs)),
            BinaryOp::Sub => Ok(lhs.wrapping_sub(rhs)),
            BinaryOp::Mul => Ok(lhs.wrapping_mul(rhs)),
            BinaryOp::Div if rhs == 0 => Err(Error(ErrorOrigin::Value, ErrorKind::DivisionByZero)),
            BinaryOp::Div => Ok(lhs.wrapping_div(rhs)),
            BinaryOp::Rem if rhs == 0 => Err(Error(ErrorOrigin::Value, ErrorKind::DivisionByZero)),
            BinaryOp::Rem => Ok(lhs.wrapping_rem(rhs)),
            BinaryOp::BitOr => Ok(lhs | rhs),
            BinaryOp::BitAnd => Ok(lhs & rhs),
            BinaryOp::BitXor => Ok(lhs ^ rhs),
            BinaryOp::Shl => Ok(lhs.wrapping_shl(rhs as u32)),
            BinaryOp::Shr => Ok(lhs.wrapping_shr(rhs as u32)),
        }
    }};
}

macro_rules! float_binary {
    ($lhs:expr, $rhs:expr, $op:expr) => {{
        let (lhs, rhs) = ($lhs, $rhs);
        match $op {
            BinaryOp::Add => Ok(lhs + rhs),
            BinaryOp::Sub => Ok(lhs - rhs),
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div => Ok(lhs / rhs),
            BinaryOp::Rem => Ok(lhs % rhs),
            _ => Err(not_supported()),
        }
    }};
}

macro_rules! binary_match {
    ($lhs:expr, $rhs:expr, $op:expr; $($int:ident),*) => {
        match ($lhs, $rhs) {
            $((Value::$int(lhs), Value::$int(rhs)) => integer_binary!(*lhs, *rhs, $op).map(Value::$int),)*
            (Value::F32(lhs), Value::F32(rhs)) => float_binary!(*lhs, *rhs, $op).map(Value::F32),
            (Value::F64(lhs), Value::F64(rhs)) => float_binary!(*lhs, *rhs, $op).map(Value::F64),
            (Value::Bool(lhs), Value::Bool(rhs)) => match $op {
                BinaryOp::BitOr => Ok(Value::Bool(lhs | rhs)),
                BinaryOp::BitAnd => Ok(Value::Bool(lhs & rhs)),
                BinaryOp::BitXor => Ok(Value::Bool(lhs ^ rhs)),
                _ => Err(not_supported()),
            },
            _ => Err(mismatch()),
        }
    };
}

macro_rules! compare_match {
    ($lhs:expr, $rhs:expr; $($int:ident),*) => {
        match ($lhs, $rhs) {
            $((Value::$int(lhs), Value::$int(rhs)) => lhs.partial_cmp(rhs),)*
            (Value::F32(lhs), Value::F32(rhs)) => lhs.partial_cmp(rhs),
            (Value::F64(lhs), Value::F64(rhs)) => lhs.partial_cmp(rhs),
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs.partial_cmp(rhs),
            (Value::Pointer(lhs), Value::Pointer(rhs)) => lhs.partial_cmp(rhs),
            _ => return Err(mismatch()),
        }
    };
}

impl Value {
    /// The scalar of numeric values.
    pub fn scalar(&self) -> Option<Scalar> {
        Some(match self {
            Value::Bool(_) => Scalar::Bool,
            Value::I8(_) => Scalar::I8,
            Value::I16(_) => Scalar::I16,
            Value::I32(_) => Scalar::I32,
            Value::I64(_) => Scalar::I64,
            Value::I128(_) => Scalar::I128,
            Value::Isize(_) => Scalar::Isize,
            Value::U8(_) => Scalar::U8,
            Value::U16(_) => Scalar::U16,
            Value::U32(_) => Scalar::U32,
            Value::U64(_) => Scalar::U64,
            Value::U128(_) => Scalar::U128,
            Value::Usize(_) => Scalar::Usize,
            Value::F32(_) => Scalar::F32,
            Value::F64(_) => Scalar::F64,
            Value::Pointer(_) | Value::Bytes(_) => return None,
        })
    }

    /// Converts a numeric value into `scalar` the way an `as` cast does.
    ///
    /// Booleans convert to and from `0` and `1`. Pointers and bytes cannot be converted.
    pub fn convert(&self, scalar: Scalar) -> Result<Value> {
        if self.scalar() == Some(scalar) {
            return Ok(self.clone());
        }
        Ok(match *self {
            Value::Bool(value) => from_primitive!(scalar, value as u8),
            Value::I8(value) => from_primitive!(scalar, value),
            Value::I16(value) => from_primitive!(scalar, value),
            Value::I32(value) => from_primitive!(scalar, value),
            Value::I64(value) => from_primitive!(scalar, value),
            Value::I128(value) => from_primitive!(scalar, value),
            Value::Isize(value) => from_primitive!(scalar, value),
            Value::U8(value) => from_primitive!(scalar, value),
            Value::U16(value) => from_primitive!(scalar, value),
            Value::U32(value) => from_primitive!(scalar, value),
            Value::U64(value) => from_primitive!(scalar, value),
            Value::U128(value) => from_primitive!(scalar, value),
            Value::Usize(value) => from_primitive!(scalar, value),
            Value::F32(value) => from_primitive!(scalar, value),
            Value::F64(value) => from_primitive!(scalar, value),
            Value::Pointer(_) | Value::Bytes(_) => return Err(mismatch()),
        })
    }

    /// Returns true for non zero numbers, non null pointers and byte strings with a set bit.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(value) => *value,
            Value::F32(value) => *value != 0.0,
            Value::F64(value) => *value != 0.0,
            Value::Pointer(address) => !address.is_null(),
            Value::Bytes(bytes) => bytes.iter().any(|byte| *byte != 0),
            other => other.convert(Scalar::U128).map_or(false, |value| value != Value::U128(0)),
        }
    }

    /// Applies a binary operator. `rhs` is converted into the scalar of `self` first.
    ///
    /// Integer arithmetic wraps, dividing by zero is an error.
    ///
    /// Booleans take part in arithmetic and shifts as `0` or `1`, promoted to `i32` or to the
    /// right hand side when that is a float or an integer of at least 32 bits. Their bitwise
    /// operators stay boolean.
    pub fn binary(&self, op: BinaryOp, rhs: &Value) -> Result<Value> {
        if let Value::Bool(_) = self {
            if !matches!(op, BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::BitXor) {
                let promoted = match rhs.scalar() {
                    Some(scalar) if !scalar.is_bool() && scalar.size() >= 4 => scalar,
                    _ => Scalar::I32,
                };
                return self.convert(promoted)?.binary(op, rhs);
            }
        }
        let scalar = self.scalar().ok_or_else(mismatch)?;
        let rhs = rhs.convert(scalar)?;
        each_integer!(binary_match!(self, &rhs, op))
    }

    pub fn unary(&self, op: UnaryOp) -> Result<Value> {
        if op == UnaryOp::LogicalNot {
            return Ok(Value::Bool(!self.is_truthy()));
        }
        match (op, self) {
            (UnaryOp::Plus, Value::Bool(v)) => Ok(Value::I32(*v as i32)),
            (UnaryOp::Minus, Value::Bool(v)) => Ok(Value::I32(-(*v as i32))),
            (UnaryOp::Plus, value) if value.scalar().is_some() => Ok(value.clone()),
            (UnaryOp::Minus, Value::I8(v)) => Ok(Value::I8(v.wrapping_neg())),
            (UnaryOp::Minus, Value::I16(v)) => Ok(Value::I16(v.wrapping_neg())),
            (UnaryOp::Minus, Value::I32(v)) => Ok(Value::I32(v.wrapping_neg())),
            (UnaryOp::Minus, Value::I64(v)) => Ok(Value::I64(v.wrapping_neg())),
            (UnaryOp::Minus, Value::I128(v)) => Ok(Value::I128(v.wrapping_neg())),
            (UnaryOp::Minus, Value::Isize(v)) => Ok(Value::Isize(v.wrapping_neg())),
            (UnaryOp::Minus, Value::F32(v)) => Ok(Value::F32(-v)),
            (UnaryOp::Minus, Value::F64(v)) => Ok(Value::F64(-v)),
            (UnaryOp::BitNot, Value::I8(v)) => Ok(Value::I8(!v)),
            (UnaryOp::BitNot, Value::I16(v)) => Ok(Value::I16(!v)),
            (UnaryOp::BitNot, Value::I32(v)) => Ok(Value::I32(!v)),
            (UnaryOp::BitNot, Value::I64(v)) => Ok(Value::I64(!v)),
            (UnaryOp::BitNot, Value::I128(v)) => Ok(Value::I128(!v)),
            (UnaryOp::BitNot, Value::Isize(v)) => Ok(Value::Isize(!v)),
            (UnaryOp::BitNot, Value::U8(v)) => Ok(Value::U8(!v)),
            (UnaryOp::BitNot, Value::U16(v)) => Ok(Value::U16(!v)),
            (UnaryOp::BitNot, Value::U32(v)) => Ok(Value::U32(!v)),
            (UnaryOp::BitNot, Value::U64(v)) => Ok(Value::U64(!v)),
            (UnaryOp::BitNot, Value::U128(v)) => Ok(Value::U128(!v)),
            (UnaryOp::BitNot, Value::Usize(v)) => Ok(Value::Usize(!v)),
            _ => Err(not_supported()),
        }
    }

    /// Compares two values. Numeric right hand sides are converted into the scalar of `self`.
    pub fn compare(&self, op: CompareOp, rhs: &Value) -> Result<bool> {
        let rhs = match (self.scalar(), rhs) {
            (Some(scalar), _) => rhs.convert(scalar)?,
            (None, Value::Usize(address)) => Value::Pointer(Address::from(*address)),
            (None, other) => other.clone(),
        };
        let ordering: Option<Ordering> = match (self, &rhs) {
            (Value::Bytes(lhs), Value::Bytes(rhs)) => match op {
                CompareOp::Eq | CompareOp::Ne => Some(lhs.cmp(rhs)),
                _ => return Err(not_supported()),
            },
            (lhs, rhs) => each_integer!(compare_match!(lhs, rhs)),
        };
        Ok(op.holds(ordering))
    }

    /// Reads a scalar from `address`. Unaligned addresses are supported.
    ///
    /// # Safety
    ///
    /// `address` must point to `scalar.size()` readable bytes.
    pub unsafe fn read(scalar: Scalar, address: Address) -> Value {
        let at = address.to_usize() as *const u8;
        match scalar {
            Scalar::Bool => Value::Bool(ptr::read(at) != 0),
            Scalar::I8 => Value::I8(ptr::read_unaligned(at as *const i8)),
            Scalar::I16 => Value::I16(ptr::read_unaligned(at as *const i16)),
            Scalar::I32 => Value::I32(ptr::read_unaligned(at as *const i32)),
            Scalar::I64 => Value::I64(ptr::read_unaligned(at as *const i64)),
            Scalar::I128 => Value::I128(ptr::read_unaligned(at as *const i128)),
            Scalar::Isize => Value::Isize(ptr::read_unaligned(at as *const isize)),
            Scalar::U8 => Value::U8(ptr::read(at)),
            Scalar::U16 => Value::U16(ptr::read_unaligned(at as *const u16)),
            Scalar::U32 => Value::U32(ptr::read_unaligned(at as *const u32)),
            Scalar::U64 => Value::U64(ptr::read_unaligned(at as *const u64)),
            Scalar::U128 => Value::U128(ptr::read_unaligned(at as *const u128)),
            Scalar::Usize => Value::Usize(ptr::read_unaligned(at as *const usize)),
            Scalar::F32 => Value::F32(ptr::read_unaligned(at as *const f32)),
            Scalar::F64 => Value::F64(ptr::read_unaligned(at as *const f64)),
        }
    }

    /// Writes the value to `address`. Unaligned addresses are supported.
    ///
    /// # Safety
    ///
    /// `address` must point to as many writable bytes as the value occupies.
    pub unsafe fn write(&self, address: Address) {
        let at = address.to_usize() as *mut u8;
        match self {
            Value::Bool(v) => ptr::write(at, *v as u8),
            Value::I8(v) => ptr::write_unaligned(at as *mut i8, *v),
            Value::I16(v) => ptr::write_unaligned(at as *mut i16, *v),
            Value::I32(v) => ptr::write_unaligned(at as *mut i32, *v),
            Value::I64(v) => ptr::write_unaligned(at as *mut i64, *v),
            Value::I128(v) => ptr::write_unaligned(at as *mut i128, *v),
            Value::Isize(v) => ptr::write_unaligned(at as *mut isize, *v),
            Value::U8(v) => ptr::write(at, *v),
            Value::U16(v) => ptr::write_unaligned(at as *mut u16, *v),
            Value::U32(v) => ptr::write_unaligned(at as *mut u32, *v),
            Value::U64(v) => ptr::write_unaligned(at as *mut u64, *v),
            Value::U128(v) => ptr::write_unaligned(at as *mut u128, *v),
            Value::Usize(v) => ptr::write_unaligned(at as *mut usize, *v),
            Value::F32(v) => ptr::write_unaligned(at as *mut f32, *v),
            Value::F64(v) => ptr::write_unaligned(at as *mut f64, *v),
            Value::Pointer(v) => ptr::write_unaligned(at as *mut usize, v.to_usize()),
            Value::Bytes(bytes) => ptr::copy_nonoverlapping(bytes.as_ptr(), at, bytes.len()),
        }
    }

    /// Number of bytes the value occupies in memory.
    pub fn size(&self) -> usize {
        match self {
            Value::Pointer(_) => crate::types::POINTER_SIZE,
            Value::Bytes(bytes) => bytes.len(),
            other => other.scalar().map_or(0, Scalar::size),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    Address => Pointer,
    Vec<u8> => Bytes,
);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::I128(v) => write!(f, "{}", v),
            Value::Isize(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::U128(v) => write!(f, "{}", v),
            Value::Usize(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Pointer(v) => write!(f, "{:#x}", v),
            Value::Bytes(bytes) => {
                for byte in bytes.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::I32(-1).convert(Scalar::U8), Ok(Value::U8(0xff)));
        assert_eq!(Value::F64(2.75).convert(Scalar::I16), Ok(Value::I16(2)));
        assert_eq!(Value::U8(3).convert(Scalar::F32), Ok(Value::F32(3.0)));
        assert_eq!(Value::Bool(true).convert(Scalar::I64), Ok(Value::I64(1)));
        assert_eq!(Value::U16(0).convert(Scalar::Bool), Ok(Value::Bool(false)));
        assert_eq!(Value::I8(-4).convert(Scalar::Bool), Ok(Value::Bool(true)));
        assert_eq!(
            Value::Pointer(Address::NULL).convert(Scalar::Usize),
            Err(Error(ErrorOrigin::Value, ErrorKind::TypeMismatch))
        );
    }

    #[test]
    fn arithmetic() {
        let value = Value::I32(1000);
        assert_eq!(value.binary(BinaryOp::Add, &Value::I32(100)), Ok(Value::I32(1100)));
        assert_eq!(value.binary(BinaryOp::Rem, &Value::I32(100)), Ok(Value::I32(0)));
        assert_eq!(value.binary(BinaryOp::Shl, &Value::U8(2)), Ok(Value::I32(4000)));
        assert_eq!(
            Value::U8(250).binary(BinaryOp::Add, &Value::U8(10)),
            Ok(Value::U8(4))
        );
        assert_eq!(
            value.binary(BinaryOp::Div, &Value::I32(0)),
            Err(Error(ErrorOrigin::Value, ErrorKind::DivisionByZero))
        );
        assert_eq!(
            Value::F64(1.5).binary(BinaryOp::Mul, &Value::I32(2)),
            Ok(Value::F64(3.0))
        );
        assert!(Value::F32(1.0).binary(BinaryOp::BitOr, &Value::F32(2.0)).is_err());
        assert_eq!(
            Value::Bool(true).binary(BinaryOp::BitXor, &Value::Bool(true)),
            Ok(Value::Bool(false))
        );
        assert!(Value::Bytes(vec![1]).binary(BinaryOp::Add, &Value::U8(1)).is_err());
    }

    #[test]
    fn bool_promotion() {
        let yes = Value::Bool(true);
        assert_eq!(yes.binary(BinaryOp::Add, &Value::Bool(true)), Ok(Value::I32(2)));
        assert_eq!(yes.binary(BinaryOp::Sub, &Value::I8(3)), Ok(Value::I32(-2)));
        assert_eq!(yes.binary(BinaryOp::Mul, &Value::U64(7)), Ok(Value::U64(7)));
        assert_eq!(yes.binary(BinaryOp::Shl, &Value::U8(4)), Ok(Value::I32(16)));
        assert_eq!(yes.binary(BinaryOp::Add, &Value::F64(0.5)), Ok(Value::F64(1.5)));
        assert_eq!(
            yes.binary(BinaryOp::Div, &Value::Bool(false)),
            Err(Error(ErrorOrigin::Value, ErrorKind::DivisionByZero))
        );
        assert_eq!(
            yes.binary(BinaryOp::BitAnd, &Value::Bool(false)),
            Ok(Value::Bool(false))
        );
        assert_eq!(yes.unary(UnaryOp::Minus), Ok(Value::I32(-1)));
        assert_eq!(Value::Bool(false).unary(UnaryOp::Plus), Ok(Value::I32(0)));
    }

    #[test]
    fn unary() {
        assert_eq!(Value::I16(5).unary(UnaryOp::Minus), Ok(Value::I16(-5)));
        assert_eq!(Value::U32(0).unary(UnaryOp::BitNot), Ok(Value::U32(u32::MAX)));
        assert_eq!(Value::F32(0.0).unary(UnaryOp::LogicalNot), Ok(Value::Bool(true)));
        assert_eq!(Value::F32(2.5).unary(UnaryOp::Plus), Ok(Value::F32(2.5)));
        assert!(Value::U32(1).unary(UnaryOp::Minus).is_err());
        assert!(Value::F64(1.0).unary(UnaryOp::BitNot).is_err());
        assert!(Value::Bool(true).unary(UnaryOp::BitNot).is_err());
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::U32(1234).compare(CompareOp::Eq, &Value::U32(1234)), Ok(true));
        assert_eq!(Value::U32(1234).compare(CompareOp::Lt, &Value::I32(2000)), Ok(true));
        assert_eq!(Value::F32(567.89).compare(CompareOp::Ge, &Value::F32(567.89)), Ok(true));
        assert_eq!(Value::F64(f64::NAN).compare(CompareOp::Eq, &Value::F64(f64::NAN)), Ok(false));
        assert_eq!(Value::F64(f64::NAN).compare(CompareOp::Ne, &Value::F64(f64::NAN)), Ok(true));
        assert_eq!(
            Value::Pointer(Address::from(0x10usize)).compare(CompareOp::Eq, &Value::Usize(0x10)),
            Ok(true)
        );
        assert_eq!(
            Value::Bytes(vec![1, 2]).compare(CompareOp::Ne, &Value::Bytes(vec![1, 2])),
            Ok(false)
        );
        assert!(Value::Bytes(vec![1]).compare(CompareOp::Lt, &Value::Bytes(vec![2])).is_err());
    }

    #[test]
    fn memory_access() {
        let mut backing = [0u8; 17];
        let address = Address::from_ptr(&mut backing[1]);
        unsafe {
            Value::U64(0x1122_3344_5566_7788).write(address);
            assert_eq!(Value::read(Scalar::U64, address), Value::U64(0x1122_3344_5566_7788));
            Value::Bool(true).write(address);
            assert_eq!(Value::read(Scalar::Bool, address), Value::Bool(true));
            Value::Bytes(vec![9; 4]).write(address.wrapping_add(8));
        }
        assert_eq!(backing[0], 0);
        assert_eq!(&backing[9..13], &[9; 4]);
        assert_eq!(Value::Bytes(vec![0; 3]).size(), 3);
        assert_eq!(Value::I128(0).size(), 16);
    }

    #[test]
    fn truthiness() {
        assert!(Value::I8(-1).is_truthy());
        assert!(!Value::U64(0).is_truthy());
        assert!(!Value::Pointer(Address::NULL).is_truthy());
        assert!(Value::Bytes(vec![0, 1]).is_truthy());
    }
}
