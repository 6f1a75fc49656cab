//! Frame codec - how a record is laid out on disk
//!
//! ```text
//! [kind: 1 byte][zstd(bincode(Record))]
//! ```
//!
//! The kind byte is duplicated outside the compressed payload so a scan can
//! reject garbage before paying for decompression.

use super::record::{Record, RecordBody, RecordKind};
use crate::{Error, Result};

const COMPRESSION_LEVEL: i32 = 3;

/// Encode a record for storage
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    let serialized = bincode::serialize(record)?;
    let mut output = Vec::with_capacity(serialized.len() / 2 + 1);
    output.push(record.kind.as_byte());
    output.extend(zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL)?);
    Ok(output)
}

/// Decode a record, verifying its kind tag and content digest
pub fn decode(data: &[u8]) -> Result<Record> {
    let (&tag, payload) = data
        .split_first()
        .ok_or_else(|| Error::Corruption("Empty record frame".into()))?;

    let kind = RecordKind::from_byte(tag)
        .ok_or_else(|| Error::Corruption(format!("Invalid record kind: {}", tag)))?;

    let decompressed = zstd::decode_all(payload)?;
    let record: Record = bincode::deserialize(&decompressed)?;

    if record.kind != kind {
        return Err(Error::Corruption(format!(
            "Frame tagged {:?} holds a {:?} record",
            kind, record.kind
        )));
    }
    if let RecordBody::Data { content, digest } = &record.body {
        if !digest.matches(content) {
            return Err(Error::Corruption(format!(
                "Content digest mismatch for {} (version {})",
                record.key, record.version
            )));
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeEntry, Hash};

    fn data_record(content: &[u8]) -> Record {
        Record {
            kind: RecordKind::FileData,
            key: "/topic/t1/assets/a.png".into(),
            version: 1,
            body: RecordBody::data(content.to_vec()),
            change: ChangeEntry::save("user"),
        }
    }

    #[test]
    fn test_frame_roundtrip() {
        let original = data_record(b"hello world");
        let restored = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_wrong_tag_rejected() {
        let mut frame = encode(&data_record(b"x")).unwrap();
        frame[0] = RecordKind::FileMetadata.as_byte();
        assert!(matches!(decode(&frame), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_digest_mismatch_rejected() {
        let mut record = data_record(b"real");
        record.body = RecordBody::Data {
            content: b"fake".to_vec(),
            digest: Hash::digest(b"real"),
        };
        let frame = encode(&record).unwrap();
        assert!(matches!(decode(&frame), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_empty_frame() {
        assert!(matches!(decode(&[]), Err(Error::Corruption(_))));
    }
}
