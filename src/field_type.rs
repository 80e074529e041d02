use std::fmt;

/// Storage class inferred for a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Not yet classified, or not valid UTF-8.
    #[default]
    Unknown,
    /// Empty or a null literal such as `NULL` or `n/a`.
    Null,
    /// Anything that is not a number.
    String,
    /// Integer fitting in 8 bits.
    Int8,
    /// Integer fitting in 16 bits.
    Int16,
    /// Integer fitting in 32 bits.
    Int32,
    /// Integer fitting in 64 bits.
    Int64,
    /// Floating point number, or an integer too wide for 64 bits.
    Double,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Unknown => write!(f, "Unknown"),
            DataType::Null => write!(f, "NULL"),
            DataType::String => write!(f, "String"),
            DataType::Int8 => write!(f, "Int8"),
            DataType::Int16 => write!(f, "Int16"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Double => write!(f, "Double"),
        }
    }
}

impl DataType {
    /// Smallest integer type able to hold `value`.
    pub const fn for_integer(value: i64) -> Self {
        if value >= i8::MIN as i64 && value <= i8::MAX as i64 {
            DataType::Int8
        } else if value >= i16::MIN as i64 && value <= i16::MAX as i64 {
            DataType::Int16
        } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
            DataType::Int32
        } else {
            DataType::Int64
        }
    }

    /// Returns true for the integer types.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Returns true for integers and doubles.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || *self == DataType::Double
    }

    /// Merge two types, returning the narrowest type representing both.
    pub fn merge(self, other: DataType) -> DataType {
        use DataType::{Double, Int8, Int16, Int32, Int64, Null, String, Unknown};

        match (self, other) {
            (a, b) if a == b => a,
            (Unknown, t) | (t, Unknown) | (Null, t) | (t, Null) => t,
            (String, _) | (_, String) => String,
            (Double, _) | (_, Double) => Double,
            (Int64, _) | (_, Int64) => Int64,
            (Int32, _) | (_, Int32) => Int32,
            (Int16, _) | (_, Int16) => Int16,
            (Int8, Int8) => Int8,
        }
    }
}
