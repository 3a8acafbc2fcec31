//! Entity-agnostic list request.
//!
//! Every entity filter lowers itself into a [`ListQuery`]: the paging fields
//! shared by all listings plus the flat [`Term`] list contributed by the
//! entity's own predicates.

use serde::{Deserialize, Serialize};

use crate::{ObjectId, SortDir, Term, Terms};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Continuation token of the previous page; absent on the first page.
    pub cursor: Option<String>,
    /// Upper bound on rows returned. Must be positive.
    pub page_size: u64,
    /// Name from the entity allow-list. Empty means unordered.
    pub sort_field: String,
    pub sort_order: SortDir,
    /// Tenant scope. `None` or the nil id means unscoped.
    pub tenant_id: Option<ObjectId>,
    /// Explicit status predicate; wins over `exclude_archived`.
    pub status: Option<i32>,
    pub exclude_archived: bool,
    #[serde(skip)]
    pub terms: Vec<Term>,
}

impl ListQuery {
    #[must_use]
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Unordered, unpaged sweep bounded by `page_size`.
    #[must_use]
    pub fn sweep(page_size: u64) -> Self {
        Self::new(page_size)
    }

    #[must_use]
    pub fn sorted(mut self, field: &str, order: SortDir) -> Self {
        field.clone_into(&mut self.sort_field);
        self.sort_order = order;
        self
    }

    #[must_use]
    pub fn after(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    #[must_use]
    pub fn tenant(mut self, tenant_id: Option<ObjectId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    #[must_use]
    pub fn status(mut self, status: Option<i32>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn exclude_archived(mut self, on: bool) -> Self {
        self.exclude_archived = on;
        self
    }

    #[must_use]
    pub fn terms(mut self, terms: Terms) -> Self {
        self.terms.extend(terms.into_vec());
        self
    }

    /// The full-text search string, if any term carries one.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.terms.iter().find_map(|t| match t {
            Term::Text { search } => Some(search.as_str()),
            _ => None,
        })
    }

    /// Whether the tenant scope is set to a real tenant.
    #[must_use]
    pub fn scoped_tenant(&self) -> Option<ObjectId> {
        self.tenant_id.filter(|t| !t.is_nil())
    }
}

/// A typed per-entity list filter.
pub trait ListFilter: Send + Sync {
    fn to_query(&self) -> ListQuery;
}

impl ListFilter for ListQuery {
    fn to_query(&self) -> ListQuery {
        self.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn fluent_query_collects_terms() {
        let q = ListQuery::new(25)
            .sorted("lexical_name", SortDir::Desc)
            .after(Some(String::new()))
            .terms(Terms::new().eq_str("email", "a@b.c").text(" plumb "));
        assert_eq!(q.page_size, 25);
        assert_eq!(q.sort_field, "lexical_name");
        assert_eq!(q.sort_order, SortDir::Desc);
        assert_eq!(q.cursor, None);
        assert_eq!(q.terms.len(), 2);
        assert_eq!(q.search_text(), Some("plumb"));
    }

    #[test]
    fn nil_tenant_is_unscoped() {
        let q = ListQuery::new(1).tenant(Some(ObjectId::NIL));
        assert_eq!(q.scoped_tenant(), None);
    }

    #[test]
    fn paging_fields_deserialize_with_defaults() {
        let q: ListQuery =
            serde_json::from_str(r#"{"page_size": 10, "sort_order": "desc"}"#).unwrap();
        assert_eq!(q.page_size, 10);
        assert_eq!(q.sort_order, SortDir::Desc);
        assert!(q.sort_field.is_empty());
        assert!(!q.exclude_archived);
    }
}
