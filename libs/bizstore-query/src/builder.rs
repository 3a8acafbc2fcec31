//! Single-pass filter builder.
//!
//! [`build_list`] lowers a [`ListQuery`] into the predicate and ordering the
//! pagination executor hands to the store:
//!
//! 1. cursor boundary (ordered mode only)
//! 2. tenant equality
//! 3. entity terms, in the order the filter contributed them
//! 4. status: explicit status, else "not archived" when requested
//!
//! Validation happens before anything is built, so a rejected query never
//! reaches the store.

use crate::cursor::{self, Cursor};
use crate::{
    CompareOp, Error, ID_FIELD, ListQuery, Predicate, Result, STATUS_FIELD, SortDir, SortField,
    SortKind, TENANT_FIELD, Term, Value,
};

/// Ordering requested from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ordering {
    /// No ordering; used by reference sweeps.
    Unordered,
    /// `(field dir, _id dir)`.
    Field {
        field: &'static str,
        kind: SortKind,
        dir: SortDir,
    },
    /// Text-match score, best first.
    TextScore,
}

impl Ordering {
    /// Whether pages in this ordering can be resumed with a cursor.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(self, Ordering::Field { .. })
    }
}

/// Output of [`build_list`].
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltList {
    pub predicate: Predicate,
    pub ordering: Ordering,
    pub page_size: u64,
}

/// Build predicate and ordering for one page of entity `F`.
///
/// `archived_status` is the entity's status code for archived records.
///
/// # Errors
/// - `InvalidFilter` for a zero page size or a malformed term
/// - `UnsupportedSort` for a sort field outside `F`'s allow-list, a cursor
///   without a sort field, or a cursor combined with text search
/// - `CursorCorrupt` when the cursor does not decode for the sort field
pub fn build_list<F: SortField>(q: &ListQuery, archived_status: i32) -> Result<BuiltList> {
    if q.page_size == 0 {
        return Err(Error::InvalidFilter("page_size must be positive".to_owned()));
    }

    let sort = if q.sort_field.is_empty() {
        None
    } else {
        Some(cursor::resolve::<F>(&q.sort_field)?)
    };
    let text = q.search_text().is_some();

    if q.cursor.is_some() {
        if text {
            return Err(Error::UnsupportedSort(
                "text search cannot be combined with a cursor".to_owned(),
            ));
        }
        if sort.is_none() {
            return Err(Error::UnsupportedSort(
                "a cursor requires a sort field".to_owned(),
            ));
        }
    }

    let ordering = match sort {
        _ if text => Ordering::TextScore,
        Some(field) => Ordering::Field {
            field: field.name(),
            kind: field.kind(),
            dir: q.sort_order,
        },
        None => Ordering::Unordered,
    };

    let mut parts = Vec::new();
    if let (Some(token), Ordering::Field { field, kind, dir }) = (&q.cursor, ordering) {
        let c = Cursor::decode(token, kind)?;
        parts.push(boundary(field, dir, &c));
    }
    parts.extend(scope_and_terms(q, archived_status)?);

    Ok(BuiltList {
        predicate: Predicate::All(parts),
        ordering,
        page_size: q.page_size,
    })
}

/// Build the predicate for counting matches. Cursor, ordering and page size
/// are ignored.
///
/// # Errors
/// `InvalidFilter` for a malformed term.
pub fn build_count(q: &ListQuery, archived_status: i32) -> Result<Predicate> {
    Ok(Predicate::All(scope_and_terms(q, archived_status)?))
}

/// `field > v OR (field = v AND _id > last_id)`, with `<` when descending.
fn boundary(field: &str, dir: SortDir, c: &Cursor) -> Predicate {
    let op = match dir {
        SortDir::Asc => CompareOp::Gt,
        SortDir::Desc => CompareOp::Lt,
    };
    let v = c.value.to_value();
    Predicate::Any(vec![
        Predicate::compare(field, op, v.clone()),
        Predicate::All(vec![
            Predicate::eq(field, v),
            Predicate::compare(ID_FIELD, op, c.last_id),
        ]),
    ])
}

fn scope_and_terms(q: &ListQuery, archived_status: i32) -> Result<Vec<Predicate>> {
    let mut parts = Vec::with_capacity(q.terms.len() + 2);

    if let Some(tenant) = q.scoped_tenant() {
        parts.push(Predicate::eq(TENANT_FIELD, tenant));
    }

    let mut seen_text = false;
    for term in &q.terms {
        if matches!(term, Term::Text { .. }) {
            if seen_text {
                return Err(Error::InvalidFilter(
                    "at most one text search term is allowed".to_owned(),
                ));
            }
            seen_text = true;
        }
        parts.push(lower(term)?);
    }

    match q.status {
        Some(status) => parts.push(Predicate::eq(STATUS_FIELD, status)),
        None if q.exclude_archived => parts.push(Predicate::ne(STATUS_FIELD, archived_status)),
        None => {}
    }

    Ok(parts)
}

fn lower(term: &Term) -> Result<Predicate> {
    let p = match term {
        Term::Equals { field, value } => Predicate::eq(field.as_str(), value.clone()),
        Term::Range { field, op, value } => {
            if matches!(op, CompareOp::Eq | CompareOp::Ne) {
                return Err(Error::InvalidFilter(format!(
                    "range on `{field}` needs an ordering operator, got {op}"
                )));
            }
            Predicate::compare(field.as_str(), *op, value.clone())
        }
        Term::Substring { field, needle } => Predicate::Contains {
            field: field.clone(),
            needle: needle.clone(),
        },
        Term::AnyOf { field, values } => {
            non_empty(field, values)?;
            Predicate::In {
                field: field.clone(),
                values: values.clone(),
            }
        }
        Term::AllOf { field, values } => {
            non_empty(field, values)?;
            Predicate::ContainsAll {
                field: field.clone(),
                values: values.clone(),
            }
        }
        Term::Flag { field, value } => Predicate::eq(field.as_str(), *value),
        Term::Text { search } => Predicate::Text {
            search: search.clone(),
        },
    };
    Ok(p)
}

fn non_empty(field: &str, values: &[Value]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::InvalidFilter(format!(
            "set membership on `{field}` needs at least one value"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{ObjectId, SortValue, Terms, Tristate};
    use chrono::DateTime;

    const ARCHIVED: i32 = 2;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum OrderSort {
        AssignmentDate,
        LexicalName,
    }

    impl SortField for OrderSort {
        const FIELDS: &'static [Self] = &[OrderSort::AssignmentDate, OrderSort::LexicalName];

        fn name(&self) -> &'static str {
            match self {
                OrderSort::AssignmentDate => "assignment_date",
                OrderSort::LexicalName => "lexical_name",
            }
        }

        fn kind(&self) -> SortKind {
            match self {
                OrderSort::AssignmentDate => SortKind::Timestamp,
                OrderSort::LexicalName => SortKind::Text,
            }
        }
    }

    fn id(n: u32) -> ObjectId {
        ObjectId::from_parts(n, [0; 5], n)
    }

    fn parts(p: Predicate) -> Vec<Predicate> {
        match p {
            Predicate::All(parts) => parts,
            other => vec![other],
        }
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let q = ListQuery::new(0);
        assert!(matches!(
            build_list::<OrderSort>(&q, ARCHIVED),
            Err(Error::InvalidFilter(_))
        ));
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let q = ListQuery::new(10).sorted("password", SortDir::Asc);
        assert!(matches!(
            build_list::<OrderSort>(&q, ARCHIVED),
            Err(Error::UnsupportedSort(_))
        ));
    }

    #[test]
    fn ordered_query_orders_by_field_then_id() {
        let q = ListQuery::new(10).sorted("assignment_date", SortDir::Desc);
        let built = build_list::<OrderSort>(&q, ARCHIVED).unwrap();
        assert_eq!(
            built.ordering,
            Ordering::Field {
                field: "assignment_date",
                kind: SortKind::Timestamp,
                dir: SortDir::Desc,
            }
        );
        assert_eq!(built.predicate, Predicate::always());
        assert_eq!(built.page_size, 10);
    }

    #[test]
    fn cursor_becomes_lexicographic_boundary() {
        let token = Cursor::new(SortValue::Text("Smith".to_owned()), id(7)).encode();
        let q = ListQuery::new(2)
            .sorted("lexical_name", SortDir::Asc)
            .after(Some(token));
        let built = build_list::<OrderSort>(&q, ARCHIVED).unwrap();
        assert_eq!(
            parts(built.predicate),
            vec![Predicate::Any(vec![
                Predicate::compare("lexical_name", CompareOp::Gt, "Smith"),
                Predicate::All(vec![
                    Predicate::eq("lexical_name", "Smith"),
                    Predicate::compare(ID_FIELD, CompareOp::Gt, id(7)),
                ]),
            ])]
        );
    }

    #[test]
    fn descending_cursor_uses_less_than() {
        let token = Cursor::new(SortValue::Millis(500), id(1)).encode();
        let q = ListQuery::new(2)
            .sorted("assignment_date", SortDir::Desc)
            .after(Some(token));
        let built = build_list::<OrderSort>(&q, ARCHIVED).unwrap();
        let Predicate::Any(arms) = &parts(built.predicate)[0] else {
            panic!("expected boundary disjunction");
        };
        assert_eq!(
            arms[0],
            Predicate::compare("assignment_date", CompareOp::Lt, 500_i64)
        );
    }

    #[test]
    fn cursor_of_wrong_kind_is_corrupt() {
        let token = Cursor::new(SortValue::Text("Smith".to_owned()), id(1)).encode();
        let q = ListQuery::new(2)
            .sorted("assignment_date", SortDir::Asc)
            .after(Some(token));
        assert!(matches!(
            build_list::<OrderSort>(&q, ARCHIVED),
            Err(Error::CursorCorrupt(_))
        ));
    }

    #[test]
    fn cursor_without_sort_field_is_unsupported() {
        let token = Cursor::new(SortValue::Millis(1), id(1)).encode();
        let q = ListQuery::new(2).after(Some(token));
        assert!(matches!(
            build_list::<OrderSort>(&q, ARCHIVED),
            Err(Error::UnsupportedSort(_))
        ));
    }

    #[test]
    fn text_search_with_cursor_is_unsupported() {
        let token = Cursor::new(SortValue::Millis(1), id(1)).encode();
        let q = ListQuery::new(2)
            .sorted("assignment_date", SortDir::Asc)
            .after(Some(token))
            .terms(Terms::new().text("plumb"));
        assert!(matches!(
            build_list::<OrderSort>(&q, ARCHIVED),
            Err(Error::UnsupportedSort(_))
        ));
    }

    #[test]
    fn text_search_overrides_ordering() {
        let q = ListQuery::new(5)
            .sorted("lexical_name", SortDir::Asc)
            .terms(Terms::new().text("plumb"));
        let built = build_list::<OrderSort>(&q, ARCHIVED).unwrap();
        assert_eq!(built.ordering, Ordering::TextScore);
        assert!(!built.ordering.is_resumable());
        assert!(built.predicate.has_text());
    }

    #[test]
    fn tenant_scope_is_added_and_nil_is_ignored() {
        let t = id(99);
        let scoped = build_list::<OrderSort>(&ListQuery::new(1).tenant(Some(t)), ARCHIVED).unwrap();
        assert_eq!(parts(scoped.predicate), vec![Predicate::eq(TENANT_FIELD, t)]);

        let nil = build_list::<OrderSort>(
            &ListQuery::new(1).tenant(Some(ObjectId::NIL)),
            ARCHIVED,
        )
        .unwrap();
        assert_eq!(nil.predicate, Predicate::always());
    }

    #[test]
    fn exclude_archived_yields_to_explicit_status() {
        let q = ListQuery::new(1).exclude_archived(true);
        assert_eq!(
            parts(build_list::<OrderSort>(&q, ARCHIVED).unwrap().predicate),
            vec![Predicate::ne(STATUS_FIELD, ARCHIVED)]
        );

        let q = q.status(Some(ARCHIVED));
        assert_eq!(
            parts(build_list::<OrderSort>(&q, ARCHIVED).unwrap().predicate),
            vec![Predicate::eq(STATUS_FIELD, ARCHIVED)]
        );
    }

    #[test]
    fn range_bounds_are_anded() {
        let lo = DateTime::from_timestamp_millis(3 * 86_400_000).unwrap();
        let hi = DateTime::from_timestamp_millis(7 * 86_400_000).unwrap();
        let q = ListQuery::new(10).terms(Terms::new().between("assignment_date", Some(lo), Some(hi)));
        assert_eq!(
            parts(build_list::<OrderSort>(&q, ARCHIVED).unwrap().predicate),
            vec![
                Predicate::compare("assignment_date", CompareOp::Ge, lo),
                Predicate::compare("assignment_date", CompareOp::Le, hi),
            ]
        );
    }

    #[test]
    fn terms_lower_to_store_predicates() {
        let q = ListQuery::new(10).terms(
            Terms::new()
                .substring("first_name", "jo")
                .any_of("tags.id", &[id(1), id(2)])
                .all_of("skill_sets.id", &[id(3)])
                .flag("is_ok_to_email", Tristate::False),
        );
        assert_eq!(
            parts(build_list::<OrderSort>(&q, ARCHIVED).unwrap().predicate),
            vec![
                Predicate::Contains {
                    field: "first_name".to_owned(),
                    needle: "jo".to_owned(),
                },
                Predicate::In {
                    field: "tags.id".to_owned(),
                    values: vec![Value::from(id(1)), Value::from(id(2))],
                },
                Predicate::ContainsAll {
                    field: "skill_sets.id".to_owned(),
                    values: vec![Value::from(id(3))],
                },
                Predicate::eq("is_ok_to_email", false),
            ]
        );
    }

    #[test]
    fn malformed_terms_are_invalid() {
        let eq_range = ListQuery::new(1).terms(Terms::new().bound("due_date", CompareOp::Eq, 1_i64));
        assert!(matches!(
            build_list::<OrderSort>(&eq_range, ARCHIVED),
            Err(Error::InvalidFilter(_))
        ));

        let empty_set = ListQuery::new(1).terms(Terms::new().push(Term::AnyOf {
            field: "tags.id".to_owned(),
            values: Vec::new(),
        }));
        assert!(matches!(
            build_list::<OrderSort>(&empty_set, ARCHIVED),
            Err(Error::InvalidFilter(_))
        ));

        let two_texts = ListQuery::new(1).terms(Terms::new().text("a").text("b"));
        assert!(matches!(
            build_count(&two_texts, ARCHIVED),
            Err(Error::InvalidFilter(_))
        ));
    }

    #[test]
    fn count_ignores_cursor_and_ordering() {
        let token = Cursor::new(SortValue::Millis(1), id(1)).encode();
        let q = ListQuery::new(0)
            .sorted("assignment_date", SortDir::Asc)
            .after(Some(token))
            .tenant(Some(id(5)));
        assert_eq!(
            build_count(&q, ARCHIVED).unwrap(),
            Predicate::All(vec![Predicate::eq(TENANT_FIELD, id(5))])
        );
    }
}
