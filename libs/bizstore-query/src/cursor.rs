//! Continuation token codec.
//!
//! Wire form: URL-safe base64 without `=` padding of the UTF-8 bytes
//! `"<sort_value>|<primary_id_hex>"`. `sort_value` is the raw string of a
//! text sort field or the decimal unix-millisecond value of a timestamp sort
//! field; `primary_id_hex` is 24 lowercase hex characters.
//!
//! The tuple is split on its last `|`: the id half never contains one, so
//! text values that do still decode to what was encoded.

use crate::{Error, ObjectId, SortField, SortKind, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortValue {
    Text(String),
    Millis(i64),
}

impl SortValue {
    /// Read the sort value of `kind` out of a stored document field.
    /// Returns `None` when the field is missing or has the wrong type.
    #[must_use]
    pub fn from_json(value: &serde_json::Value, kind: SortKind) -> Option<Self> {
        match kind {
            SortKind::Text => value.as_str().map(|s| SortValue::Text(s.to_owned())),
            SortKind::Timestamp => value.as_i64().map(SortValue::Millis),
        }
    }

    /// Predicate operand comparing equal to the stored representation.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            SortValue::Text(s) => Value::String(s.clone()),
            SortValue::Millis(ms) => Value::Int(*ms),
        }
    }

    fn parse(raw: &str, kind: SortKind) -> Result<Self, Error> {
        match kind {
            SortKind::Text => Ok(SortValue::Text(raw.to_owned())),
            SortKind::Timestamp => raw
                .parse::<i64>()
                .map(SortValue::Millis)
                .map_err(|_| Error::CursorCorrupt("timestamp component is not an integer")),
        }
    }

    fn render(&self) -> String {
        match self {
            SortValue::Text(s) => s.clone(),
            SortValue::Millis(ms) => ms.to_string(),
        }
    }
}

/// Position of the last row of a page: its sort value and primary id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub value: SortValue,
    pub last_id: ObjectId,
}

impl Cursor {
    #[must_use]
    pub fn new(value: SortValue, last_id: ObjectId) -> Self {
        Self { value, last_id }
    }

    /// Encode to the opaque token form.
    #[must_use]
    pub fn encode(&self) -> String {
        let tuple = format!("{}|{}", self.value.render(), self.last_id.to_hex());
        base64_url::encode(tuple.as_bytes())
    }

    /// Decode a token produced for a sort field of `kind`.
    ///
    /// # Errors
    /// Returns `Error::CursorCorrupt` on bad base64, missing separator, a bad
    /// id component, or a sort value that does not parse as `kind`.
    pub fn decode(token: &str, kind: SortKind) -> Result<Self, Error> {
        let bytes =
            base64_url::decode(token).map_err(|_| Error::CursorCorrupt("invalid base64url"))?;
        let tuple =
            String::from_utf8(bytes).map_err(|_| Error::CursorCorrupt("token is not utf-8"))?;
        let (raw_value, raw_id) = tuple
            .rsplit_once('|')
            .ok_or(Error::CursorCorrupt("missing separator"))?;
        let last_id = ObjectId::parse_hex(raw_id)
            .map_err(|_| Error::CursorCorrupt("invalid primary id component"))?;
        let value = SortValue::parse(raw_value, kind)?;
        Ok(Self { value, last_id })
    }

    /// Build the cursor for the row `doc` ordered by `sort_field` of entity `F`.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedSort` if `sort_field` is not allow-listed and
    /// `Error::Store` if the row lacks a usable sort value or id.
    pub fn for_row<F: SortField>(
        doc: &serde_json::Map<String, serde_json::Value>,
        sort_field: &str,
    ) -> Result<Self, Error> {
        let field = resolve::<F>(sort_field)?;
        let value = doc
            .get(field.name())
            .and_then(|v| SortValue::from_json(v, field.kind()))
            .ok_or_else(|| {
                Error::Store(format!(
                    "row has no {} value for sort field {}",
                    field.kind(),
                    field.name()
                ))
            })?;
        let last_id = doc
            .get(crate::ID_FIELD)
            .and_then(serde_json::Value::as_str)
            .and_then(|s| ObjectId::parse_hex(s).ok())
            .ok_or_else(|| Error::Store("row has no primary id".to_owned()))?;
        Ok(Self { value, last_id })
    }

    /// Decode `token` for `sort_field` of entity `F`.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedSort` if `sort_field` is not allow-listed,
    /// otherwise the errors of [`Cursor::decode`].
    pub fn decode_for<F: SortField>(token: &str, sort_field: &str) -> Result<Self, Error> {
        let field = resolve::<F>(sort_field)?;
        Self::decode(token, field.kind())
    }
}

pub(crate) fn resolve<F: SortField>(sort_field: &str) -> Result<F, Error> {
    F::from_name(sort_field).ok_or_else(|| {
        Error::UnsupportedSort(format!("field `{sort_field}` is not sortable"))
    })
}

// base64url helpers (no padding)
mod base64_url {
    use base64::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
    }
}
