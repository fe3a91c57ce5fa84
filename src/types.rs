use crate::BridgeError;

/// Declared type of a result column, distinct from the concrete runtime type
/// actually observed in the rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    DateTime,
    Str,
    Binary,
    Ipv4,
    Ipv6,
}

impl TypeTag {
    /// Resolves a wire type string to its tag.
    ///
    /// The server advertises `float` and `double` for the two float widths.
    pub fn parse(decltype: &str) -> Option<TypeTag> {
        match decltype {
            "int16" => Some(TypeTag::Int16),
            "int32" => Some(TypeTag::Int32),
            "int64" => Some(TypeTag::Int64),
            "float" => Some(TypeTag::Float32),
            "double" => Some(TypeTag::Float64),
            "datetime" => Some(TypeTag::DateTime),
            "string" => Some(TypeTag::Str),
            "binary" => Some(TypeTag::Binary),
            "ipv4" => Some(TypeTag::Ipv4),
            "ipv6" => Some(TypeTag::Ipv6),
            _ => None,
        }
    }

    /// Like [`TypeTag::parse`], but an unmapped string is an error.
    pub fn resolve(decltype: &str) -> Result<TypeTag, BridgeError> {
        Self::parse(decltype).ok_or_else(|| BridgeError::UnknownColumnType(decltype.to_owned()))
    }
}

/// One entry of a result set's column manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Col {
    pub name: String,
    pub decltype: String,
}

impl Col {
    pub fn new(name: impl Into<String>, decltype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decltype: decltype.into(),
        }
    }
}
