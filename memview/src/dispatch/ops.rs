/*!
Operation catalog.

Each operation a field can forward is one bit in [`Capabilities`]. Bits are grouped into the
closed set of [`OpCategory`] values.
*/

use std::prelude::v1::*;

use std::fmt;

bitflags! {
    /// The set of operations a specialization forwards.
    #[derive(Default)]
    pub struct Capabilities: u64 {
        const ASSIGN = 1 << 0;

        const ADD = 1 << 1;
        const SUB = 1 << 2;
        const MUL = 1 << 3;
        const DIV = 1 << 4;
        const REM = 1 << 5;
        const UNARY_PLUS = 1 << 6;
        const UNARY_MINUS = 1 << 7;
        const INCREMENT = 1 << 8;
        const DECREMENT = 1 << 9;

        const BIT_OR = 1 << 10;
        const BIT_AND = 1 << 11;
        const BIT_XOR = 1 << 12;
        const BIT_NOT = 1 << 13;
        const SHL = 1 << 14;
        const SHR = 1 << 15;

        const EQ = 1 << 16;
        const NE = 1 << 17;
        const LT = 1 << 18;
        const GT = 1 << 19;
        const LE = 1 << 20;
        const GE = 1 << 21;

        const LOGICAL_NOT = 1 << 22;
        const LOGICAL_AND = 1 << 23;
        const LOGICAL_OR = 1 << 24;

        const SUBSCRIPT = 1 << 25;
        const INDIRECTION = 1 << 26;
        const POINTER_ADD = 1 << 27;
        const POINTER_SUB = 1 << 28;

        const MEMBER_ACCESS = 1 << 29;

        const TO_STRONG = 1 << 30;
        const RAW_ADDRESS = 1 << 31;

        const CALL = 1 << 32;

        const ARITHMETIC = Self::ADD.bits
            | Self::SUB.bits
            | Self::MUL.bits
            | Self::DIV.bits
            | Self::REM.bits
            | Self::UNARY_PLUS.bits
            | Self::UNARY_MINUS.bits
            | Self::INCREMENT.bits
            | Self::DECREMENT.bits;
        const BITWISE = Self::BIT_OR.bits
            | Self::BIT_AND.bits
            | Self::BIT_XOR.bits
            | Self::BIT_NOT.bits
            | Self::SHL.bits
            | Self::SHR.bits;
        const COMPARISON = Self::EQ.bits
            | Self::NE.bits
            | Self::LT.bits
            | Self::GT.bits
            | Self::LE.bits
            | Self::GE.bits;
        const LOGICAL = Self::LOGICAL_NOT.bits | Self::LOGICAL_AND.bits | Self::LOGICAL_OR.bits;
        const ARRAY_POINTER = Self::SUBSCRIPT.bits
            | Self::INDIRECTION.bits
            | Self::POINTER_ADD.bits
            | Self::POINTER_SUB.bits;
    }
}

/// Closed set of operation categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCategory {
    Arithmetic,
    Bitwise,
    Comparison,
    Logical,
    ArrayPointer,
    AggregateMember,
    Call,
}

impl OpCategory {
    pub const ALL: [OpCategory; 7] = [
        OpCategory::Arithmetic,
        OpCategory::Bitwise,
        OpCategory::Comparison,
        OpCategory::Logical,
        OpCategory::ArrayPointer,
        OpCategory::AggregateMember,
        OpCategory::Call,
    ];

    /// Every operation belonging to this category.
    pub fn capabilities(self) -> Capabilities {
        match self {
            OpCategory::Arithmetic => Capabilities::ARITHMETIC,
            OpCategory::Bitwise => Capabilities::BITWISE,
            OpCategory::Comparison => Capabilities::COMPARISON,
            OpCategory::Logical => Capabilities::LOGICAL,
            OpCategory::ArrayPointer => Capabilities::ARRAY_POINTER,
            OpCategory::AggregateMember => Capabilities::MEMBER_ACCESS,
            OpCategory::Call => Capabilities::CALL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCategory::Arithmetic => "arithmetic",
            OpCategory::Bitwise => "bitwise",
            OpCategory::Comparison => "comparison",
            OpCategory::Logical => "logical",
            OpCategory::ArrayPointer => "array/pointer",
            OpCategory::AggregateMember => "aggregate member",
            OpCategory::Call => "call",
        }
    }
}

impl Capabilities {
    /// Returns the categories that have at least one operation in this set.
    pub fn categories(self) -> impl Iterator<Item = OpCategory> {
        OpCategory::ALL
            .into_iter()
            .filter(move |category| self.intersects(category.capabilities()))
    }
}

/// Binary operators of the numeric specialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitOr,
    BitAnd,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn capability(self) -> Capabilities {
        match self {
            BinaryOp::Add => Capabilities::ADD,
            BinaryOp::Sub => Capabilities::SUB,
            BinaryOp::Mul => Capabilities::MUL,
            BinaryOp::Div => Capabilities::DIV,
            BinaryOp::Rem => Capabilities::REM,
            BinaryOp::BitOr => Capabilities::BIT_OR,
            BinaryOp::BitAnd => Capabilities::BIT_AND,
            BinaryOp::BitXor => Capabilities::BIT_XOR,
            BinaryOp::Shl => Capabilities::SHL,
            BinaryOp::Shr => Capabilities::SHR,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitOr => "|",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Unary operators of the numeric specialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicalNot,
}

impl UnaryOp {
    pub fn capability(self) -> Capabilities {
        match self {
            UnaryOp::Plus => Capabilities::UNARY_PLUS,
            UnaryOp::Minus => Capabilities::UNARY_MINUS,
            UnaryOp::BitNot => Capabilities::BIT_NOT,
            UnaryOp::LogicalNot => Capabilities::LOGICAL_NOT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn capability(self) -> Capabilities {
        match self {
            CompareOp::Eq => Capabilities::EQ,
            CompareOp::Ne => Capabilities::NE,
            CompareOp::Lt => Capabilities::LT,
            CompareOp::Gt => Capabilities::GT,
            CompareOp::Le => Capabilities::LE,
            CompareOp::Ge => Capabilities::GE,
        }
    }

    /// Applies the comparison to the result of `partial_cmp`.
    pub fn holds(self, ordering: Option<std::cmp::Ordering>) -> bool {
        use std::cmp::Ordering::*;
        match (self, ordering) {
            (CompareOp::Eq, Some(Equal)) => true,
            (CompareOp::Ne, Some(Equal)) => false,
            (CompareOp::Ne, _) => true,
            (CompareOp::Lt, Some(Less)) => true,
            (CompareOp::Gt, Some(Greater)) => true,
            (CompareOp::Le, Some(Less | Equal)) => true,
            (CompareOp::Ge, Some(Greater | Equal)) => true,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn capability(self) -> Capabilities {
        match self {
            LogicalOp::And => Capabilities::LOGICAL_AND,
            LogicalOp::Or => Capabilities::LOGICAL_OR,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
