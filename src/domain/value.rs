//! Registry value payloads and type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag reported by the store for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    None,
    String,
    ExpandString,
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiString,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    Unknown(u32),
}

impl ValueType {
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::String => 1,
            Self::ExpandString => 2,
            Self::Binary => 3,
            Self::Dword => 4,
            Self::DwordBigEndian => 5,
            Self::Link => 6,
            Self::MultiString => 7,
            Self::ResourceList => 8,
            Self::FullResourceDescriptor => 9,
            Self::ResourceRequirementsList => 10,
            Self::Qword => 11,
            Self::Unknown(code) => *code,
        }
    }

    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::None,
            1 => Self::String,
            2 => Self::ExpandString,
            3 => Self::Binary,
            4 => Self::Dword,
            5 => Self::DwordBigEndian,
            6 => Self::Link,
            7 => Self::MultiString,
            8 => Self::ResourceList,
            9 => Self::FullResourceDescriptor,
            10 => Self::ResourceRequirementsList,
            11 => Self::Qword,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "REG_NONE",
            Self::String => "REG_SZ",
            Self::ExpandString => "REG_EXPAND_SZ",
            Self::Binary => "REG_BINARY",
            Self::Dword => "REG_DWORD",
            Self::DwordBigEndian => "REG_DWORD_BIG_ENDIAN",
            Self::Link => "REG_LINK",
            Self::MultiString => "REG_MULTI_SZ",
            Self::ResourceList => "REG_RESOURCE_LIST",
            Self::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR",
            Self::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST",
            Self::Qword => "REG_QWORD",
            Self::Unknown(_) => "REG_UNKNOWN",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "REG_UNKNOWN({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Decoded value payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    None,
    String(String),
    MultiString(Vec<String>),
    Dword(u32),
    Qword(u64),
    Binary(Vec<u8>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Tag a freshly written value of this shape would carry.
    #[must_use]
    pub const fn natural_type(&self) -> ValueType {
        match self {
            Self::None => ValueType::None,
            Self::String(_) => ValueType::String,
            Self::MultiString(_) => ValueType::MultiString,
            Self::Dword(_) => ValueType::Dword,
            Self::Qword(_) => ValueType::Qword,
            Self::Binary(_) => ValueType::Binary,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Dword(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Qword(n)
    }
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

fn decode_string(bytes: &[u8]) -> String {
    let units = utf16_units(bytes);
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end])
}

/// The list ends at the first empty string.
fn decode_multi_string(bytes: &[u8]) -> Vec<String> {
    utf16_units(bytes)
        .split(|&u| u == 0)
        .take_while(|part| !part.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// Decode raw value bytes as the store hands them out.
#[must_use]
pub fn decode(bytes: &[u8], vtype: ValueType) -> Value {
    match vtype {
        ValueType::String | ValueType::ExpandString | ValueType::Link => {
            Value::String(decode_string(bytes))
        }
        ValueType::MultiString => Value::MultiString(decode_multi_string(bytes)),
        ValueType::Dword => match <[u8; 4]>::try_from(bytes) {
            Ok(raw) => Value::Dword(u32::from_le_bytes(raw)),
            Err(_) => Value::Binary(bytes.to_vec()),
        },
        ValueType::DwordBigEndian => match <[u8; 4]>::try_from(bytes) {
            Ok(raw) => Value::Dword(u32::from_be_bytes(raw)),
            Err(_) => Value::Binary(bytes.to_vec()),
        },
        ValueType::Qword => match <[u8; 8]>::try_from(bytes) {
            Ok(raw) => Value::Qword(u64::from_le_bytes(raw)),
            Err(_) => Value::Binary(bytes.to_vec()),
        },
        ValueType::None if bytes.is_empty() => Value::None,
        _ => Value::Binary(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u8> {
        s.encode_utf16().chain(Some(0)).flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_type_codes() {
        for code in 0..=11 {
            assert_eq!(ValueType::from_code(code).code(), code);
        }
        assert_eq!(ValueType::from_code(1), ValueType::String);
        assert_eq!(ValueType::from_code(42), ValueType::Unknown(42));
        assert_eq!(ValueType::String.to_string(), "REG_SZ");
        assert_eq!(ValueType::Unknown(42).to_string(), "REG_UNKNOWN(42)");
    }

    #[test]
    fn test_decode_strings_trims_terminator() {
        assert_eq!(
            decode(&wide("hello"), ValueType::String),
            Value::String("hello".into())
        );
        assert_eq!(
            decode(&wide("%SystemRoot%"), ValueType::ExpandString),
            Value::String("%SystemRoot%".into())
        );
        assert_eq!(decode(&[], ValueType::String), Value::String(String::new()));
    }

    #[test]
    fn test_decode_multi_string() {
        let mut bytes = wide("a");
        bytes.extend(wide("bc"));
        bytes.extend([0, 0]);
        assert_eq!(
            decode(&bytes, ValueType::MultiString),
            Value::MultiString(vec!["a".into(), "bc".into()])
        );
    }

    #[test]
    fn test_decode_multi_string_stops_at_empty_entry() {
        let mut bytes = wide("a");
        bytes.extend(wide(""));
        bytes.extend(wide("b"));
        bytes.extend(wide(""));
        assert_eq!(
            decode(&bytes, ValueType::MultiString),
            Value::MultiString(vec!["a".into()])
        );
        assert_eq!(decode(&[0, 0], ValueType::MultiString), Value::MultiString(vec![]));
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(decode(&[1, 0, 0, 0], ValueType::Dword), Value::Dword(1));
        assert_eq!(decode(&[0, 0, 0, 1], ValueType::DwordBigEndian), Value::Dword(1));
        assert_eq!(
            decode(&[0, 0, 0, 0, 1, 0, 0, 0], ValueType::Qword),
            Value::Qword(1 << 32)
        );
        assert_eq!(decode(&[1, 2], ValueType::Dword), Value::Binary(vec![1, 2]));
    }

    #[test]
    fn test_decode_opaque_kinds() {
        assert_eq!(decode(&[], ValueType::None), Value::None);
        assert_eq!(decode(&[7], ValueType::None), Value::Binary(vec![7]));
        assert_eq!(
            decode(&[1, 2, 3], ValueType::ResourceList),
            Value::Binary(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_value_serializes_tagged() {
        assert_eq!(
            serde_json::to_string(&Value::from("x")).unwrap(),
            r#"{"type":"String","data":"x"}"#
        );
        assert_eq!(
            serde_json::to_string(&Value::Dword(5)).unwrap(),
            r#"{"type":"Dword","data":5}"#
        );
        assert_eq!(serde_json::to_string(&Value::None).unwrap(), r#"{"type":"None"}"#);
    }

    #[test]
    fn test_value_serde_keeps_variant() {
        let values = [
            Value::None,
            Value::from("hello"),
            Value::MultiString(vec![]),
            Value::MultiString(vec!["a".into(), "b".into()]),
            Value::Dword(5),
            Value::Qword(5),
            Value::Binary(vec![]),
            Value::Binary(vec![1, 2, 3]),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value, "{json}");
            assert_eq!(back.natural_type(), value.natural_type());
        }
    }

    #[test]
    fn test_as_str_only_for_strings() {
        assert_eq!(Value::from(String::from("dark")).as_str(), Some("dark"));
        assert_eq!(Value::from(7u32).as_str(), None);
        assert_eq!(Value::from(7u64).as_str(), None);
    }
}
