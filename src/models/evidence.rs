use bytes::Bytes;

/// A captured photo or attachment, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Evidence {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn jpeg(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::new(file_name, "image/jpeg", bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
