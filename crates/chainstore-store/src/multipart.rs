//! Minimal `multipart/form-data` encoder for single-file uploads.

use bytes::{BufMut, Bytes, BytesMut};

const BOUNDARY_PREFIX: &str = "chainstore-form-boundary-";

/// One file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormFile {
    field: String,
    filename: String,
    data: Bytes,
}

impl FormFile {
    pub fn new(field: impl Into<String>, filename: impl Into<String>, data: Bytes) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            data,
        }
    }

    /// Encodes the form. Returns the `Content-Type` header value and body.
    ///
    /// The boundary is chosen so that it never occurs inside the data.
    pub fn encode(&self) -> (String, Bytes) {
        let boundary = self.boundary();

        let mut body = BytesMut::with_capacity(self.data.len() + 256);
        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"\r\n");
        body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                self.field, self.filename
            )
            .as_bytes(),
        );
        body.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.put_slice(&self.data);
        body.put_slice(b"\r\n--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"--\r\n");

        (format!("multipart/form-data; boundary={}", boundary), body.freeze())
    }

    fn boundary(&self) -> String {
        (0u64..)
            .map(|n| format!("{}{:016x}", BOUNDARY_PREFIX, n))
            .find(|candidate| !contains(&self.data, candidate.as_bytes()))
            .unwrap_or_else(|| BOUNDARY_PREFIX.to_string())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
