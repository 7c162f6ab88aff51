//! Request body payloads and their encodings.
//!
//! # Design
//! The payload is a sum type, so the content type is derived from the variant
//! instead of being tracked next to it. Switching body family replaces the
//! variant; there is no way for the tag and the payload shape to disagree.
//! JSON values are marshaled when set, but a marshal failure is only reported
//! when the request is assembled.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::EncodingError;
use crate::multipart::{self, MultipartPart};

pub const JSON_CONTENT: &str = "application/json";
pub const URL_ENCODED_CONTENT: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_CONTENT: &str = "multipart/form-data";

/// Body state accumulated by the builder.
#[derive(Debug, Default)]
pub(crate) enum Payload {
    #[default]
    Empty,
    /// Encoded JSON bytes, or the message of a failed marshal.
    Json(Result<Vec<u8>, String>),
    /// Form fields keyed by name; values keep insertion order.
    Form(BTreeMap<String, Vec<String>>),
    Multipart(Vec<MultipartPart>),
}

/// Output of a body strategy.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct EncodedBody {
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl Payload {
    pub(crate) fn json_struct<T: Serialize + ?Sized>(value: &T) -> Self {
        Payload::Json(serde_json::to_vec(value).map_err(|e| e.to_string()))
    }

    /// Content type selected by the current variant. Multipart reports the
    /// bare media type; the boundary is only known after encoding.
    pub(crate) fn content_type(&self) -> Option<&'static str> {
        match self {
            Payload::Empty => None,
            Payload::Json(_) => Some(JSON_CONTENT),
            Payload::Form(_) => Some(URL_ENCODED_CONTENT),
            Payload::Multipart(_) => Some(MULTIPART_CONTENT),
        }
    }

    /// Append a value to a form field, switching to the form strategy.
    pub(crate) fn push_form_field(&mut self, key: String, value: String) {
        self.update_form(|fields| fields.entry(key).or_default().push(value));
    }

    /// Replace every value of a form field, switching to the form strategy.
    pub(crate) fn replace_form_field(&mut self, key: String, values: Vec<String>) {
        self.update_form(|fields| {
            fields.insert(key, values);
        });
    }

    pub(crate) fn push_part(&mut self, part: MultipartPart) {
        if let Payload::Multipart(parts) = self {
            parts.push(part);
            return;
        }
        *self = Payload::Multipart(vec![part]);
    }

    fn update_form(&mut self, update: impl FnOnce(&mut BTreeMap<String, Vec<String>>)) {
        if let Payload::Form(fields) = self {
            update(fields);
            return;
        }
        let mut fields = BTreeMap::new();
        update(&mut fields);
        *self = Payload::Form(fields);
    }

    /// Run the strategy selected by the variant.
    pub(crate) fn encode(&mut self) -> Result<EncodedBody, EncodingError> {
        match self {
            Payload::Empty => Ok(EncodedBody::default()),
            Payload::Json(encoded) => encode_json(encoded),
            Payload::Form(fields) => Ok(EncodedBody {
                content_type: Some(URL_ENCODED_CONTENT.to_string()),
                body: Some(encode_form(fields).into_bytes()),
            }),
            Payload::Multipart(parts) => {
                let (content_type, body) = multipart::encode(parts)?;
                Ok(EncodedBody {
                    content_type: Some(content_type),
                    body: Some(body),
                })
            }
        }
    }
}

fn encode_json(encoded: &Result<Vec<u8>, String>) -> Result<EncodedBody, EncodingError> {
    let bytes = encoded
        .as_ref()
        .map_err(|msg| EncodingError::Serialization(msg.clone()))?;
    Ok(EncodedBody {
        content_type: Some(JSON_CONTENT.to_string()),
        body: (!bytes.is_empty()).then(|| bytes.clone()),
    })
}

/// `application/x-www-form-urlencoded` serialization, keys in sorted order.
pub(crate) fn encode_form(fields: &BTreeMap<String, Vec<String>>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in fields {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}
