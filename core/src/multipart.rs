//! `multipart/form-data` encoding.
//!
//! # Design
//! Parts are buffered into a single body before dispatch, so a failing part
//! aborts the whole request and nothing partial is ever sent. Each source is
//! dropped as soon as it has been copied (or has failed), which closes files
//! and any other reader that releases resources on drop.
//!
//! Per part, the encoding is chosen as follows:
//! - a file source uses its path as the filename;
//! - otherwise an explicit filename makes it a file part;
//! - otherwise a forced part gets explicit file-style headers with an empty
//!   filename;
//! - otherwise it is a plain form field.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use uuid::Uuid;

use crate::body::MULTIPART_CONTENT;
use crate::error::EncodingError;

const OCTET_STREAM: &str = "application/octet-stream";

/// Where the bytes of a part come from.
pub enum PartSource {
    /// An arbitrary reader, consumed by the first assembly that uses it.
    Reader(Option<Box<dyn Read + Send>>),
    /// A filesystem path, opened each time the body is assembled.
    File(PathBuf),
}

impl fmt::Debug for PartSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartSource::Reader(reader) => f
                .debug_tuple("Reader")
                .field(&reader.as_ref().map(|_| ".."))
                .finish(),
            PartSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// One named field or file contributed to a multipart body.
#[derive(Debug)]
pub struct MultipartPart {
    key: String,
    file_name: Option<String>,
    source: PartSource,
    force_multipart: bool,
}

impl MultipartPart {
    pub fn reader(
        key: impl Into<String>,
        file_name: Option<String>,
        reader: impl Read + Send + 'static,
        force_multipart: bool,
    ) -> Self {
        Self {
            key: key.into(),
            file_name: file_name.filter(|name| !name.is_empty()),
            source: PartSource::Reader(Some(Box::new(reader))),
            force_multipart,
        }
    }

    pub fn file(key: impl Into<String>, path: impl Into<PathBuf>, force_multipart: bool) -> Self {
        Self {
            key: key.into(),
            file_name: None,
            source: PartSource::File(path.into()),
            force_multipart,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn force_multipart(&self) -> bool {
        self.force_multipart
    }

    /// Filename the part will be encoded with, if it is a file part.
    pub fn file_name(&self) -> Option<String> {
        match &self.source {
            PartSource::File(path) => Some(path.to_string_lossy().into_owned()),
            PartSource::Reader(_) => self.file_name.clone(),
        }
    }

    fn open(&mut self) -> Result<Box<dyn Read + Send>, EncodingError> {
        match &mut self.source {
            PartSource::Reader(reader) => match reader.take() {
                Some(reader) => Ok(reader),
                None => Err(EncodingError::SourceConsumed(self.key.clone())),
            },
            PartSource::File(path) => match File::open(&*path) {
                Ok(file) => Ok(Box::new(file)),
                Err(source) => Err(EncodingError::OpenFile {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    /// MIME headers for this part, sorted by name.
    fn headers(&self) -> Vec<(&'static str, String)> {
        let key = escape_quotes(&self.key);
        match (self.file_name(), self.force_multipart) {
            (Some(file_name), force) => vec![
                (
                    "Content-Disposition",
                    format!(
                        r#"form-data; name="{key}"; filename="{}""#,
                        escape_quotes(&file_name)
                    ),
                ),
                (
                    "Content-Type",
                    (if force { MULTIPART_CONTENT } else { OCTET_STREAM }).to_string(),
                ),
            ],
            (None, true) => vec![
                (
                    "Content-Disposition",
                    format!(r#"form-data; name="{key}"; filename="""#),
                ),
                ("Content-Type", MULTIPART_CONTENT.to_string()),
            ],
            (None, false) => vec![("Content-Disposition", format!(r#"form-data; name="{key}""#))],
        }
    }
}

/// Encode all parts into one buffer and return `(content_type, body)`.
pub(crate) fn encode(parts: &mut [MultipartPart]) -> Result<(String, Vec<u8>), EncodingError> {
    let mut writer = MultipartWriter::new(Vec::new());
    for part in parts.iter_mut() {
        let mut reader = part.open()?;
        tracing::trace!(key = %part.key, file_name = ?part.file_name(), "encoding multipart part");
        let key = part.key.clone();
        let read_err = |source| EncodingError::ReadPart {
            key: key.clone(),
            source,
        };
        writer.start_part(&part.headers()).map_err(read_err)?;
        io::copy(&mut reader, writer.inner_mut()).map_err(read_err)?;
    }
    let content_type = writer.form_data_content_type();
    let body = writer.finish().map_err(|source| EncodingError::ReadPart {
        key: String::new(),
        source,
    })?;
    Ok((content_type, body))
}

/// Minimal multipart framing over any writer.
struct MultipartWriter<W> {
    inner: W,
    boundary: String,
    started: bool,
}

impl<W: Write> MultipartWriter<W> {
    fn new(inner: W) -> Self {
        Self::with_boundary(inner, Uuid::new_v4().simple().to_string())
    }

    fn with_boundary(inner: W, boundary: String) -> Self {
        Self {
            inner,
            boundary,
            started: false,
        }
    }

    fn form_data_content_type(&self) -> String {
        format!("{MULTIPART_CONTENT}; boundary={}", self.boundary)
    }

    fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    fn start_part(&mut self, headers: &[(&str, String)]) -> io::Result<()> {
        if self.started {
            write!(self.inner, "\r\n--{}\r\n", self.boundary)?;
        } else {
            write!(self.inner, "--{}\r\n", self.boundary)?;
            self.started = true;
        }
        for (name, value) in headers {
            write!(self.inner, "{name}: {value}\r\n")?;
        }
        self.inner.write_all(b"\r\n")
    }

    fn finish(mut self) -> io::Result<W> {
        if self.started {
            write!(self.inner, "\r\n--{}--\r\n", self.boundary)?;
        } else {
            write!(self.inner, "--{}--\r\n", self.boundary)?;
        }
        Ok(self.inner)
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
