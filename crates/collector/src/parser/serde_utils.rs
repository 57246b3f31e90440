use serde::Serializer;

/// Serialize raw bytes as a string, replacing invalid UTF-8 sequences.
pub fn serialize_bytes_lossy<S>(bytes: &bytes::Bytes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}
