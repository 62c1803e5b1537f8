//! MsgPack codec using `rmp-serde`.
//!
//! Always uses `to_vec_named` so structs are serialized as maps with field
//! names. Requests and responses are self-describing on the wire; clients
//! written in other languages can decode them without a schema.

use crate::error::Result;

/// MessagePack codec for structured messages.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map format).
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Probe {
        id: u32,
        name: String,
    }

    #[test]
    fn encode_decode_struct() {
        let original = Probe {
            id: 42,
            name: "ping".to_string(),
        };
        let bytes = MsgPackCodec::encode(&original).unwrap();
        let decoded: Probe = MsgPackCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn struct_serialized_as_map() {
        let probe = Probe {
            id: 1,
            name: "x".to_string(),
        };
        let bytes = MsgPackCodec::encode(&probe).unwrap();
        // fixmap marker for a 2-entry map, not a fixarray
        assert_eq!(bytes[0], 0x82);
    }

    #[test]
    fn decode_garbage_fails() {
        let result: Result<Probe> = MsgPackCodec::decode(&[0xC1, 0xFF, 0x00]);
        assert!(result.is_err());
    }
}
