//! Typed predicate terms and per-entity sort allow-lists.
//!
//! Entity filters describe themselves as a flat list of [`Term`]s instead of
//! hand-written conditional chains. [`Terms`] is the fluent collector; each
//! adder ignores "zero" inputs (empty strings, `None`, empty id lists,
//! [`Tristate::Unspecified`]) so an entity filter can forward every field
//! unconditionally.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{CompareOp, ObjectId, Value};

/// Type of a sortable field, which fixes how its cursor value is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKind {
    /// Lexical string value, emitted verbatim.
    Text,
    /// Timestamp, emitted as unix milliseconds in decimal.
    Timestamp,
}

impl fmt::Display for SortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKind::Text => write!(f, "text"),
            SortKind::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Closed allow-list of fields an entity may be ordered by.
///
/// Implemented by a small enum per entity. Anything not in `FIELDS` is
/// rejected before a query is issued.
pub trait SortField: Copy + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static {
    const FIELDS: &'static [Self];

    /// Document field name; also the name callers use in `sort_field`.
    fn name(&self) -> &'static str;

    fn kind(&self) -> SortKind;

    fn from_name(name: &str) -> Option<Self> {
        Self::FIELDS.iter().copied().find(|f| f.name() == name)
    }
}

/// Three-valued flag: `0` unspecified, `1` true, `2` false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Tristate {
    #[default]
    Unspecified,
    True,
    False,
}

impl Tristate {
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Tristate::Unspecified => None,
            Tristate::True => Some(true),
            Tristate::False => Some(false),
        }
    }
}

impl From<u8> for Tristate {
    fn from(v: u8) -> Self {
        match v {
            1 => Tristate::True,
            2 => Tristate::False,
            _ => Tristate::Unspecified,
        }
    }
}

impl From<Tristate> for u8 {
    fn from(v: Tristate) -> Self {
        match v {
            Tristate::Unspecified => 0,
            Tristate::True => 1,
            Tristate::False => 2,
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(v: Option<bool>) -> Self {
        match v {
            None => Tristate::Unspecified,
            Some(true) => Tristate::True,
            Some(false) => Tristate::False,
        }
    }
}

/// One typed predicate contributed by an entity filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Equals { field: String, value: Value },
    /// One bound of a range. Several bounds on the same field are ANDed.
    Range {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Substring { field: String, needle: String },
    AnyOf { field: String, values: Vec<Value> },
    AllOf { field: String, values: Vec<Value> },
    Flag { field: String, value: bool },
    Text { search: String },
}

/// Fluent collector for [`Term`]s.
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct Terms(Vec<Term>);

impl Terms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality on `field`, skipped when `value` is `None`.
    pub fn eq<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.0.push(Term::Equals {
                field: field.to_owned(),
                value: v.into(),
            });
        }
        self
    }

    /// Equality on an id reference, skipped for `None` and the nil id.
    pub fn eq_id(self, field: &str, id: Option<ObjectId>) -> Self {
        self.eq(field, id.filter(|id| !id.is_nil()))
    }

    /// Equality on a string field, skipped when empty.
    pub fn eq_str(self, field: &str, value: &str) -> Self {
        self.eq(field, (!value.is_empty()).then(|| value.to_owned()))
    }

    /// Inclusive time range; either bound may be absent.
    pub fn between(
        mut self,
        field: &str,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
    ) -> Self {
        if let Some(lower) = gte {
            self = self.bound(field, CompareOp::Ge, lower);
        }
        if let Some(upper) = lte {
            self = self.bound(field, CompareOp::Le, upper);
        }
        self
    }

    /// A single range bound. `op` must be one of `Gt`, `Ge`, `Lt`, `Le`.
    pub fn bound(mut self, field: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        self.0.push(Term::Range {
            field: field.to_owned(),
            op,
            value: value.into(),
        });
        self
    }

    /// Case-insensitive substring, skipped when empty.
    pub fn substring(mut self, field: &str, needle: &str) -> Self {
        if !needle.is_empty() {
            self.0.push(Term::Substring {
                field: field.to_owned(),
                needle: needle.to_owned(),
            });
        }
        self
    }

    /// Match any of `ids` on `field`, skipped when `ids` is empty.
    pub fn any_of(mut self, field: &str, ids: &[ObjectId]) -> Self {
        if !ids.is_empty() {
            self.0.push(Term::AnyOf {
                field: field.to_owned(),
                values: ids.iter().copied().map(Value::from).collect(),
            });
        }
        self
    }

    /// Require every one of `ids` on `field`, skipped when `ids` is empty.
    pub fn all_of(mut self, field: &str, ids: &[ObjectId]) -> Self {
        if !ids.is_empty() {
            self.0.push(Term::AllOf {
                field: field.to_owned(),
                values: ids.iter().copied().map(Value::from).collect(),
            });
        }
        self
    }

    /// Boolean flag, skipped when unspecified.
    pub fn flag(mut self, field: &str, state: Tristate) -> Self {
        if let Some(value) = state.as_bool() {
            self.0.push(Term::Flag {
                field: field.to_owned(),
                value,
            });
        }
        self
    }

    /// Full-text search, skipped when blank.
    pub fn text(mut self, search: &str) -> Self {
        let search = search.trim();
        if !search.is_empty() {
            self.0.push(Term::Text {
                search: search.to_owned(),
            });
        }
        self
    }

    pub fn push(mut self, term: Term) -> Self {
        self.0.push(term);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Term] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Term> {
        self.0
    }
}

impl From<Terms> for Vec<Term> {
    fn from(t: Terms) -> Self {
        t.0
    }
}
