//! Document codec trait definitions.
//!
//! The write path never encodes documents itself; it only needs to know how
//! large a document will be on the wire so batches can be framed under the
//! server's message limit.

use crate::Document;

/// Document size measurement.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` so one codec can be shared by every bulk
/// call running against the same client.
///
/// # Determinism
///
/// `encoded_size` must return the same number for equal documents. Batch
/// planning relies on this to produce identical boundaries when the same
/// operation list is planned twice.
pub trait DocumentCodec: Send + Sync {
    /// Encoded size of `doc` in bytes.
    fn encoded_size(&self, doc: &Document) -> Result<usize, CodecError>;

    /// Bytes an array spends on its element at `position`, the element's
    /// own encoding excluded.
    fn element_overhead(&self, position: usize) -> usize;

    /// Unique codec identifier.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The document cannot be represented in this codec's format.
    #[error("Unencodable document (codec={codec_id}): {detail}")]
    Unencodable {
        /// Human-readable error description
        detail: String,
        /// Codec ID that attempted the measurement
        codec_id: String,
    },
}

impl CodecError {
    /// Create an unencodable error.
    pub fn unencodable(detail: impl Into<String>, codec_id: impl Into<String>) -> Self {
        CodecError::Unencodable {
            detail: detail.into(),
            codec_id: codec_id.into(),
        }
    }
}

/// BSON size measurement.
///
/// Serializes the document with `bson::to_vec` and reports the byte
/// length, so sizes match what the server receives exactly. Array elements
/// are keyed by their decimal position, so each one costs a type byte, the
/// key and its NUL terminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonSizeCodec;

impl BsonSizeCodec {
    const CODEC_ID: &'static str = "bson-size";
}

impl DocumentCodec for BsonSizeCodec {
    fn encoded_size(&self, doc: &Document) -> Result<usize, CodecError> {
        bson::to_vec(doc)
            .map(|bytes| bytes.len())
            .map_err(|e| CodecError::unencodable(e.to_string(), Self::CODEC_ID))
    }

    fn element_overhead(&self, position: usize) -> usize {
        let digits = position.checked_ilog10().map_or(1, |d| d as usize + 1);
        1 + digits + 1
    }

    fn codec_id(&self) -> &str {
        Self::CODEC_ID
    }
}

/// Size of the bincode serialization of a document.
///
/// For deployments whose wire format is bincode rather than BSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl DocumentCodec for BincodeCodec {
    fn encoded_size(&self, doc: &Document) -> Result<usize, CodecError> {
        bincode::serialized_size(doc)
            .map(|n| n as usize)
            .map_err(|e| CodecError::unencodable(e.to_string(), "bincode"))
    }

    fn element_overhead(&self, _position: usize) -> usize {
        0
    }

    fn codec_id(&self) -> &str {
        "bincode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{doc, Bson};

    #[test]
    fn test_empty_document_is_five_bytes() {
        assert_eq!(BsonSizeCodec.encoded_size(&Document::new()).unwrap(), 5);
    }

    #[test]
    fn test_int_fields() {
        // 4 + (type + "_id" + NUL + value) + NUL
        let d = doc! { "_id": 1i32 };
        assert_eq!(BsonSizeCodec.encoded_size(&d).unwrap(), 4 + 1 + 3 + 1 + 4 + 1);
        let d = doc! { "_id": 1i64 };
        assert_eq!(BsonSizeCodec.encoded_size(&d).unwrap(), 4 + 1 + 3 + 1 + 8 + 1);
    }

    #[test]
    fn test_string_field() {
        // 4 + (1 + "x" + NUL + 4 + "abc" + NUL) + 1
        let d = doc! { "x": "abc" };
        assert_eq!(BsonSizeCodec.encoded_size(&d).unwrap(), 4 + 1 + 1 + 1 + 4 + 3 + 1 + 1);
    }

    #[test]
    fn test_array_keys_are_counted() {
        let items: Vec<Bson> = (0..12).map(|_| Bson::Null).collect();
        let d = doc! { "a": items };
        // array body: 10 single-digit keys, 2 two-digit keys, each with type byte and NUL
        let array = 4 + 10 * (1 + 1 + 1) + 2 * (1 + 2 + 1) + 1;
        assert_eq!(BsonSizeCodec.encoded_size(&d).unwrap(), 4 + 1 + 1 + 1 + array + 1);
    }

    #[test]
    fn test_matches_serialized_length() {
        let d = doc! { "_id": 7i64, "tags": ["a", "b"], "nested": { "ok": true, "score": 0.5 } };
        let expected = bson::to_vec(&d).unwrap().len();
        assert_eq!(BsonSizeCodec.encoded_size(&d).unwrap(), expected);
    }

    #[test]
    fn test_element_overhead_matches_array_growth() {
        let mut items: Vec<Bson> = Vec::new();
        let mut previous = BsonSizeCodec.encoded_size(&doc! { "a": items.clone() }).unwrap();
        for position in 0..120 {
            items.push(Bson::Int64(position as i64));
            let size = BsonSizeCodec.encoded_size(&doc! { "a": items.clone() }).unwrap();
            assert_eq!(size - previous, BsonSizeCodec.element_overhead(position) + 8);
            previous = size;
        }
    }

    #[test]
    fn test_size_is_deterministic() {
        let d = doc! { "_id": 7i64, "payload": "y".repeat(1000), "nested": doc! { "k": true } };
        let a = BsonSizeCodec.encoded_size(&d).unwrap();
        let b = BsonSizeCodec.encoded_size(&d.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bincode_size_grows_with_payload() {
        let small = doc! { "x": "a" };
        let large = doc! { "x": "a".repeat(100) };
        let s = BincodeCodec.encoded_size(&small).unwrap();
        let l = BincodeCodec.encoded_size(&large).unwrap();
        assert_eq!(l - s, 99);
    }
}
