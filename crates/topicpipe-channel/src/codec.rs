//! Payload pipeline: structured value ⇄ serialized bytes ⇄ compressed bytes.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// zlib level used by [`Zlib::new`].
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Turns values into payload bytes and back.
///
/// Implementations must round-trip: `decode(encode(v)) == v`.
pub trait Codec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON serialization via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Serialize(e.into()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialize(e.into()))
    }
}

/// Wraps another codec and zlib-compresses its output.
#[derive(Debug, Clone, Copy)]
pub struct Zlib<C> {
    inner: C,
    level: Compression,
}

impl<C> Zlib<C> {
    pub fn new(inner: C) -> Self {
        Self::with_level(inner, DEFAULT_COMPRESSION_LEVEL)
    }

    /// `level` is clamped to zlib's 0..=9 range.
    pub fn with_level(inner: C, level: u32) -> Self {
        Self {
            inner,
            level: Compression::new(level.min(9)),
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl<C: Default> Default for Zlib<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Codec> Codec for Zlib<C> {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let raw = self.inner.encode(value)?;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), self.level);
        encoder.write_all(&raw).map_err(CodecError::Compress)?;
        encoder.finish().map_err(CodecError::Compress)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let mut raw = Vec::new();
        ZlibDecoder::new(bytes)
            .read_to_end(&mut raw)
            .map_err(CodecError::Decompress)?;
        self.inner.decode(&raw)
    }
}

/// JSON, zlib-compressed.
pub type DefaultCodec = Zlib<JsonCodec>;

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::{json, Value};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Tick {
        symbol: String,
        price: f64,
        size: u32,
    }

    #[test]
    fn json_round_trips_dynamic_values() {
        let codec = JsonCodec;
        for value in [json!(1), json!("hello"), json!([1, 2, 3]), json!({"a": null})] {
            let bytes = codec.encode(&value).unwrap();
            assert_eq!(codec.decode::<Value>(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn zlib_round_trips_typed_values() {
        let codec = DefaultCodec::default();
        let tick = Tick {
            symbol: "EURUSD".to_string(),
            price: 1.0845,
            size: 100,
        };
        let bytes = codec.encode(&tick).unwrap();
        assert_eq!(&bytes[..1], &[0x78]);
        assert_eq!(codec.decode::<Tick>(&bytes).unwrap(), tick);
    }

    #[test]
    fn zlib_shrinks_repetitive_payloads() {
        let codec = DefaultCodec::default();
        let value = vec![0u8; 4096];
        let compressed = codec.encode(&value).unwrap();
        let plain = JsonCodec.encode(&value).unwrap();
        assert!(compressed.len() < plain.len() / 10);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(Zlib::with_level(JsonCodec, 42).level(), 9);
        assert_eq!(Zlib::new(JsonCodec).level(), DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn corrupt_compressed_payload_is_decompress_error() {
        let codec = DefaultCodec::default();
        let err = codec.decode::<Value>(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, CodecError::Decompress(_)));
    }

    #[test]
    fn type_mismatch_is_deserialize_error() {
        let codec = DefaultCodec::default();
        let bytes = codec.encode("text").unwrap();
        let err = codec.decode::<u32>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Deserialize(_)));
    }
}
