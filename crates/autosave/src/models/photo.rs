use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Raw photo bytes with a SHA-256 digest computed once at construction.
///
/// Equality is by content: two attachments built from different buffers that
/// hold the same bytes are equal.
#[derive(Clone)]
pub struct Attachment {
    bytes: Bytes,
    content_type: String,
    digest: [u8; 32],
}

impl Attachment {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(&bytes));
        Self {
            bytes,
            content_type: content_type.into(),
            digest,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content comparison. The length check is redundant with the digest but
    /// rejects most mismatches without touching the hash.
    pub fn same_content(&self, other: &Attachment) -> bool {
        self.bytes.len() == other.bytes.len() && self.digest == other.digest
    }

    /// Short hex prefix of the digest, for log lines.
    pub fn fingerprint(&self) -> String {
        self.digest[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.same_content(other)
    }
}

impl Eq for Attachment {}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("sha256", &self.fingerprint())
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct AttachmentWire {
    content_type: String,
    data: String,
}

impl Serialize for Attachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AttachmentWire {
            content_type: self.content_type.clone(),
            data: STANDARD.encode(&self.bytes),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = AttachmentWire::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(wire.data.as_bytes())
            .map_err(|e| de::Error::custom(format!("photo data is not valid base64: {e}")))?;
        Ok(Attachment::new(bytes, wire.content_type))
    }
}

/// The resume's single binary field.
///
/// `Unchanged` means "whatever the backend already has" and is omitted from
/// save requests. `Removed` is an explicit clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Photo {
    #[default]
    Unchanged,
    Removed,
    Upload(Attachment),
}

impl Photo {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Photo::Unchanged)
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Photo::Upload(attachment) => Some(attachment),
            _ => None,
        }
    }
}
