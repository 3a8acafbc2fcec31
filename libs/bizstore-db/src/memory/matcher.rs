//! Predicate evaluation over JSON documents.

use std::cmp::Ordering;

use bizstore_query::{CompareOp, Predicate};
use regex::Regex;
use serde_json::Value as Json;

use crate::store::{Document, StoreError};

/// Values reachable through a dotted `path`. Arrays met on the way are walked
/// element-wise and a terminal array contributes its elements.
pub(super) fn resolve<'a>(doc: &'a Document, path: &str) -> Vec<&'a Json> {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let mut current: Vec<&Json> = doc.get(first).into_iter().collect();
    for seg in segments {
        let mut next = Vec::new();
        for v in current {
            descend(v, seg, &mut next);
        }
        current = next;
    }

    let mut out = Vec::with_capacity(current.len());
    for v in current {
        match v {
            Json::Array(items) => out.extend(items.iter()),
            other => out.push(other),
        }
    }
    out
}

fn descend<'a>(v: &'a Json, seg: &str, out: &mut Vec<&'a Json>) {
    match v {
        Json::Object(map) => {
            if let Some(child) = map.get(seg) {
                out.push(child);
            }
        }
        Json::Array(items) => {
            for item in items {
                descend(item, seg, out);
            }
        }
        _ => {}
    }
}

/// First value at `path`, or null. Used as the sort key.
pub(super) fn sort_key<'a>(doc: &'a Document, path: &str) -> &'a Json {
    static NULL: Json = Json::Null;
    resolve(doc, path).into_iter().next().unwrap_or(&NULL)
}

// null < number < string < object < array < bool
fn bracket(v: &Json) -> u8 {
    match v {
        Json::Null => 0,
        Json::Number(_) => 1,
        Json::String(_) => 2,
        Json::Object(_) => 3,
        Json::Array(_) => 4,
        Json::Bool(_) => 5,
    }
}

/// Total order over JSON values.
pub(super) fn cmp_json(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => x
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&y.as_f64().unwrap_or_default()),
        },
        (Json::String(x), Json::String(y)) => x.cmp(y),
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Array(x), Json::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| cmp_json(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Json::Object(x), Json::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| cmp_json(lv, rv)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => bracket(a).cmp(&bracket(b)),
    }
}

fn json_eq(a: &Json, b: &Json) -> bool {
    bracket(a) == bracket(b) && cmp_json(a, b).is_eq()
}

fn eq_any(candidates: &[&Json], value: &Json) -> bool {
    if candidates.is_empty() {
        return value.is_null();
    }
    candidates.iter().any(|c| json_eq(c, value))
}

/// A predicate compiled for repeated evaluation.
pub(super) enum Matcher {
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
    Compare {
        field: String,
        op: CompareOp,
        value: Json,
    },
    Pattern {
        field: String,
        re: Regex,
    },
    In {
        field: String,
        values: Vec<Json>,
    },
    ContainsAll {
        field: String,
        values: Vec<Json>,
    },
    Text,
}

impl Matcher {
    pub(super) fn compile(p: &Predicate) -> Result<Self, StoreError> {
        Ok(match p {
            Predicate::All(parts) => {
                Matcher::All(parts.iter().map(Matcher::compile).collect::<Result<_, _>>()?)
            }
            Predicate::Any(parts) => {
                Matcher::Any(parts.iter().map(Matcher::compile).collect::<Result<_, _>>()?)
            }
            Predicate::Compare { field, op, value } => Matcher::Compare {
                field: field.clone(),
                op: *op,
                value: value.to_json(),
            },
            Predicate::Contains { field, needle } => {
                let re = Regex::new(&format!("(?i){}", regex::escape(needle)))
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Matcher::Pattern {
                    field: field.clone(),
                    re,
                }
            }
            Predicate::In { field, values } => Matcher::In {
                field: field.clone(),
                values: values.iter().map(bizstore_query::Value::to_json).collect(),
            },
            Predicate::ContainsAll { field, values } => Matcher::ContainsAll {
                field: field.clone(),
                values: values.iter().map(bizstore_query::Value::to_json).collect(),
            },
            Predicate::Text { .. } => Matcher::Text,
        })
    }

    /// `score` is the document's text-match score for this query.
    pub(super) fn matches(&self, doc: &Document, score: f64) -> bool {
        match self {
            Matcher::All(parts) => parts.iter().all(|m| m.matches(doc, score)),
            Matcher::Any(parts) => parts.iter().any(|m| m.matches(doc, score)),
            Matcher::Compare { field, op, value } => {
                let candidates = resolve(doc, field);
                match op {
                    CompareOp::Eq => eq_any(&candidates, value),
                    CompareOp::Ne => !eq_any(&candidates, value),
                    CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
                        candidates.iter().any(|c| {
                            bracket(c) == bracket(value) && holds(*op, cmp_json(c, value))
                        })
                    }
                }
            }
            Matcher::Pattern { field, re } => resolve(doc, field)
                .iter()
                .any(|c| c.as_str().is_some_and(|s| re.is_match(s))),
            Matcher::In { field, values } => {
                let candidates = resolve(doc, field);
                values.iter().any(|v| eq_any(&candidates, v))
            }
            Matcher::ContainsAll { field, values } => {
                let candidates = resolve(doc, field);
                !candidates.is_empty() && values.iter().all(|v| eq_any(&candidates, v))
            }
            Matcher::Text => score > 0.0,
        }
    }
}

fn holds(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord.is_eq(),
        CompareOp::Ne => ord.is_ne(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::Ge => ord.is_ge(),
        CompareOp::Lt => ord.is_lt(),
        CompareOp::Le => ord.is_le(),
    }
}

/// The search string of the first text node in `p`.
pub(super) fn text_search(p: &Predicate) -> Option<&str> {
    match p {
        Predicate::Text { search } => Some(search),
        Predicate::All(parts) | Predicate::Any(parts) => parts.iter().find_map(text_search),
        _ => None,
    }
}

fn tokens(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Number of tokens in the text-indexed `fields` that start with a search
/// term. Prefix matching stands in for stemming.
pub(super) fn text_score(doc: &Document, fields: &[String], search: &str) -> f64 {
    let terms: Vec<String> = tokens(search).collect();
    let mut hits: u32 = 0;
    for field in fields {
        for v in resolve(doc, field) {
            let Some(s) = v.as_str() else { continue };
            for token in tokens(s) {
                if terms.iter().any(|t| token.starts_with(t.as_str())) {
                    hits = hits.saturating_add(1);
                }
            }
        }
    }
    f64::from(hits)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bizstore_query::{ObjectId, Value};
    use serde_json::json;

    fn doc(v: &Json) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn check(p: &Predicate, d: &Document) -> bool {
        Matcher::compile(p).unwrap().matches(d, 0.0)
    }

    #[test]
    fn dotted_paths_walk_arrays() {
        let d = doc(&json!({"tags": [{"id": "a"}, {"id": "b"}], "name": {"first": "Jo"}}));
        assert_eq!(resolve(&d, "tags.id"), vec![&json!("a"), &json!("b")]);
        assert_eq!(resolve(&d, "name.first"), vec![&json!("Jo")]);
        assert!(resolve(&d, "missing.path").is_empty());
    }

    #[test]
    fn equality_matches_any_array_element() {
        let d = doc(&json!({"tags": [{"id": "a"}, {"id": "b"}]}));
        assert!(check(&Predicate::eq("tags.id", "b"), &d));
        assert!(!check(&Predicate::ne("tags.id", "b"), &d));
        assert!(check(&Predicate::ne("tags.id", "c"), &d));
    }

    #[test]
    fn missing_field_equals_null_and_is_not_equal_to_values() {
        let d = doc(&json!({"a": 1}));
        assert!(check(&Predicate::eq("b", Value::Null), &d));
        assert!(check(&Predicate::ne("b", 2), &d));
        assert!(!check(&Predicate::compare("b", CompareOp::Gt, 0), &d));
    }

    #[test]
    fn ranges_only_compare_within_a_type() {
        let d = doc(&json!({"due": 5, "name": "m"}));
        assert!(check(&Predicate::compare("due", CompareOp::Ge, 5), &d));
        assert!(!check(&Predicate::compare("due", CompareOp::Gt, "a"), &d));
        assert!(check(&Predicate::compare("name", CompareOp::Lt, "z"), &d));
    }

    #[test]
    fn object_ids_compare_by_hex_text() {
        let lo = ObjectId::from_parts(1, [0; 5], 1);
        let hi = ObjectId::from_parts(2, [0; 5], 0);
        let d = doc(&json!({"_id": hi.to_hex()}));
        assert!(check(&Predicate::compare("_id", CompareOp::Gt, lo), &d));
    }

    #[test]
    fn contains_is_case_insensitive_and_literal() {
        let d = doc(&json!({"email": "Jane.Doe@Example.com"}));
        let p = |n: &str| Predicate::Contains {
            field: "email".to_owned(),
            needle: n.to_owned(),
        };
        assert!(check(&p("doe@example"), &d));
        assert!(!check(&p("jane.*com"), &d));
    }

    #[test]
    fn membership_any_and_all() {
        let d = doc(&json!({"skills": [{"id": "x"}, {"id": "y"}]}));
        let any = Predicate::In {
            field: "skills.id".to_owned(),
            values: vec![Value::from("q"), Value::from("y")],
        };
        let all = Predicate::ContainsAll {
            field: "skills.id".to_owned(),
            values: vec![Value::from("x"), Value::from("y")],
        };
        let all_missing = Predicate::ContainsAll {
            field: "skills.id".to_owned(),
            values: vec![Value::from("x"), Value::from("z")],
        };
        assert!(check(&any, &d));
        assert!(check(&all, &d));
        assert!(!check(&all_missing, &d));
    }

    #[test]
    fn total_order_ranks_types() {
        assert!(cmp_json(&json!(null), &json!(0)).is_lt());
        assert!(cmp_json(&json!(99), &json!("a")).is_lt());
        assert!(cmp_json(&json!("z"), &json!({})).is_lt());
        assert!(cmp_json(&json!([1]), &json!(false)).is_lt());
        assert!(cmp_json(&json!(1.5), &json!(2)).is_lt());
    }

    #[test]
    fn text_score_counts_prefix_hits() {
        let d = doc(&json!({"name": "Plumbing & Plumbers Inc", "notes": ["plumb line"]}));
        let fields = vec!["name".to_owned(), "notes".to_owned()];
        assert!((text_score(&d, &fields, "plumb") - 3.0).abs() < f64::EPSILON);
        assert!(text_score(&d, &fields, "electric").abs() < f64::EPSILON);
    }
}
