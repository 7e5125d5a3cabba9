use std::{fmt, str::FromStr};

/// Element type of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Utf8,
}

impl DataType {
    pub const fn is_variable_sized(&self) -> bool {
        matches!(self, DataType::Utf8)
    }

    pub const fn is_numeric(&self) -> bool {
        !matches!(self, DataType::Bool | DataType::Utf8)
    }

    /// Canonical lowercase name, e.g. `"f64"`.
    pub const fn name(&self) -> &'static str {
        match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Bool => "bool",
            DataType::Utf8 => "utf8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dtype name: {0:?}")]
pub struct UnknownDataType(pub String);

/// Parses both the canonical names and the common numpy-style aliases
/// (`"int"` is `i64`, `"float"` is `f64`, `"str"` is `utf8`).
impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match s.trim().to_ascii_lowercase().as_str() {
            "i8" | "int8" => DataType::I8,
            "i16" | "int16" => DataType::I16,
            "i32" | "int32" => DataType::I32,
            "i64" | "int64" | "int" => DataType::I64,
            "u8" | "uint8" => DataType::U8,
            "u16" | "uint16" => DataType::U16,
            "u32" | "uint32" => DataType::U32,
            "u64" | "uint64" | "uint" => DataType::U64,
            "f32" | "float32" => DataType::F32,
            "f64" | "float64" | "float" | "double" => DataType::F64,
            "bool" | "boolean" => DataType::Bool,
            "utf8" | "str" | "string" => DataType::Utf8,
            _ => return Err(UnknownDataType(s.to_string())),
        };
        Ok(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::I64);
        assert_eq!("float".parse::<DataType>().unwrap(), DataType::F64);
        assert_eq!("Float32".parse::<DataType>().unwrap(), DataType::F32);
        assert_eq!("str".parse::<DataType>().unwrap(), DataType::Utf8);
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for dtype in [DataType::U16, DataType::Bool, DataType::Utf8, DataType::F64] {
            assert_eq!(dtype.to_string().parse::<DataType>().unwrap(), dtype);
        }
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "complex128".parse::<DataType>().unwrap_err();
        assert_eq!(err, UnknownDataType("complex128".to_string()));
    }
}
