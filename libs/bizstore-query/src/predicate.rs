//! Store-level predicate tree.
//!
//! This is what a `DocumentStore` evaluates. It is deliberately small: the
//! builder lowers every typed [`Term`](crate::Term) and every paging concern
//! (tenant scope, archived exclusion, cursor boundary) into these nodes.

use crate::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "eq"),
            CompareOp::Ne => write!(f, "ne"),
            CompareOp::Gt => write!(f, "gt"),
            CompareOp::Ge => write!(f, "ge"),
            CompareOp::Lt => write!(f, "lt"),
            CompareOp::Le => write!(f, "le"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Conjunction. An empty list matches every document.
    All(Vec<Predicate>),
    /// Disjunction. An empty list matches nothing.
    Any(Vec<Predicate>),
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Case-insensitive substring match on a string field.
    Contains { field: String, needle: String },
    /// Field (or any element of an array field) equals one of `values`.
    In { field: String, values: Vec<Value> },
    /// Array field contains every one of `values`.
    ContainsAll { field: String, values: Vec<Value> },
    /// Full-text match against the collection's text index.
    Text { search: String },
}

impl Predicate {
    /// Predicate matching every document.
    #[must_use]
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Combine with AND, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        let mut parts = match self {
            Predicate::All(parts) => parts,
            p => vec![p],
        };
        match other {
            Predicate::All(more) => parts.extend(more),
            p => parts.push(p),
        }
        Predicate::All(parts)
    }

    /// Whether this tree contains a full-text node anywhere.
    #[must_use]
    pub fn has_text(&self) -> bool {
        match self {
            Predicate::Text { .. } => true,
            Predicate::All(parts) | Predicate::Any(parts) => parts.iter().any(Predicate::has_text),
            _ => false,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_conjunctions() {
        let p = Predicate::always()
            .and(Predicate::eq("a", 1))
            .and(Predicate::All(vec![Predicate::eq("b", 2), Predicate::eq("c", 3)]));
        let Predicate::All(parts) = p else {
            panic!("expected conjunction");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn has_text_looks_through_nesting() {
        let p = Predicate::All(vec![
            Predicate::eq("a", 1),
            Predicate::Any(vec![Predicate::Text {
                search: "x".to_owned(),
            }]),
        ]);
        assert!(p.has_text());
        assert!(!Predicate::eq("a", 1).has_text());
    }
}
