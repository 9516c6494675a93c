//! Hex encoding for fixed-size byte arrays.
//!
//! Commitments, secrets, public keys and signatures travel as lowercase hex
//! strings in operation logs. Use with `#[serde(with = "crate::core::hex_bytes::array")]`.

use serde::{Deserialize, Deserializer, Serializer};

/// Decode a hex string into exactly `N` bytes.
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| format!("expected {} bytes, got {}", N, len))
}

/// Serde adapter for `[u8; N]` fields.
pub mod array {
    use super::*;

    /// Serialize as a hex string.
    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize from a hex string (optional `0x` prefix).
    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_array(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<[u8; N]>` fields.
pub mod option_array {
    use super::*;

    /// Serialize as an optional hex string.
    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &Option<[u8; N]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from an optional hex string.
    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<Option<[u8; N]>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| decode_array(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Wrapper {
        #[serde(with = "array")]
        sig: [u8; 64],
        #[serde(with = "option_array", default)]
        key: Option<[u8; 32]>,
    }

    #[test]
    fn test_decode_array_length_checked() {
        assert_eq!(decode_array::<2>("0a0b"), Ok([10, 11]));
        assert_eq!(decode_array::<2>("0x0a0b"), Ok([10, 11]));
        assert!(decode_array::<3>("0a0b").is_err());
        assert!(decode_array::<1>("zz").is_err());
    }

    #[test]
    fn test_wrapper_json_and_bincode() {
        let w = Wrapper { sig: [7; 64], key: Some([1; 32]) };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains(&"07".repeat(64)));
        assert_eq!(serde_json::from_str::<Wrapper>(&json).unwrap(), w);

        let bytes = bincode::serialize(&w).unwrap();
        assert_eq!(bincode::deserialize::<Wrapper>(&bytes).unwrap(), w);
    }
}
