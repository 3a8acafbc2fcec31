//! In-memory [`DocumentStore`].
//!
//! Reference implementation used by tests and local runs. Collections are
//! created on first use and guarded by a single `parking_lot::RwLock`; the
//! lock is never held across an await point.

mod matcher;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bizstore_query::{ID_FIELD, ObjectId, Predicate, SortDir};
use parking_lot::RwLock;
use serde_json::Value as Json;

use crate::store::{Document, DocumentStore, FindOptions, IndexKey, IndexSpec, SortSpec, StoreError};
use matcher::{Matcher, cmp_json, sort_key, text_score, text_search};

#[derive(Default)]
struct MemCollection {
    // keyed by hex id, so iteration follows id order
    docs: BTreeMap<String, Document>,
    indexes: Vec<IndexSpec>,
}

impl MemCollection {
    fn text_fields(&self) -> Vec<String> {
        self.indexes
            .iter()
            .flat_map(|ix| ix.keys.iter())
            .filter_map(|k| match k {
                IndexKey::Text(f) => Some(f.clone()),
                IndexKey::Asc(_) | IndexKey::Desc(_) => None,
            })
            .collect()
    }

    /// Fails if `doc` collides with another document on a unique index.
    fn check_unique(&self, name: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        for ix in self.indexes.iter().filter(|ix| ix.unique && !ix.is_text()) {
            let key = index_key(ix, doc);
            let taken = self
                .docs
                .iter()
                .any(|(other_id, other)| other_id != id && index_key(ix, other) == key);
            if taken {
                return Err(StoreError::DuplicateKey {
                    collection: name.to_owned(),
                    key: ix.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn index_key(ix: &IndexSpec, doc: &Document) -> Vec<Json> {
    ix.keys
        .iter()
        .map(|k| sort_key(doc, k.field()).clone())
        .collect()
}

fn doc_id(doc: &Document) -> Result<String, StoreError> {
    let raw = doc
        .get(ID_FIELD)
        .and_then(Json::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("missing `_id`".to_owned()))?;
    let id = ObjectId::parse_hex(raw).map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
    Ok(id.to_hex())
}

fn project(doc: &Document, fields: Option<&[String]>) -> Document {
    let Some(fields) = fields else {
        return doc.clone();
    };
    let mut out = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD.to_owned(), id.clone());
    }
    for f in fields {
        let top = f.split('.').next().unwrap_or(f);
        if let Some(v) = doc.get(top) {
            out.insert(top.to_owned(), v.clone());
        }
    }
    out
}

fn order_rows(rows: &mut [(f64, &Document)], sort: &SortSpec) {
    match sort {
        SortSpec::Unordered => {}
        SortSpec::Keys(keys) => rows.sort_by(|(_, a), (_, b)| {
            keys.iter()
                .map(|(field, dir)| {
                    let ord = cmp_json(sort_key(a, field), sort_key(b, field));
                    match dir {
                        SortDir::Asc => ord,
                        SortDir::Desc => ord.reverse(),
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortSpec::TextScore => rows.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then_with(|| cmp_json(sort_key(a, ID_FIELD), sort_key(b, ID_FIELD)))
        }),
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, simulating a store round-trip.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_index(&self, collection: &str, index: IndexSpec) -> Result<(), StoreError> {
        self.round_trip().await;
        let mut guard = self.collections.write();
        let coll = guard.entry(collection.to_owned()).or_default();
        if coll.indexes.iter().any(|ix| ix.name == index.name) {
            return Ok(());
        }
        if index.is_text() && coll.indexes.iter().any(IndexSpec::is_text) {
            return Err(StoreError::Backend(format!(
                "collection `{collection}` already has a text index"
            )));
        }
        coll.indexes.push(index);
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.round_trip().await;
        let matcher = Matcher::compile(predicate)?;
        let search = text_search(predicate);

        let guard = self.collections.read();
        let Some(coll) = guard.get(collection) else {
            return match search {
                Some(_) => Err(StoreError::MissingTextIndex(collection.to_owned())),
                None => Ok(Vec::new()),
            };
        };

        let text_fields = coll.text_fields();
        if search.is_some() && text_fields.is_empty() {
            return Err(StoreError::MissingTextIndex(collection.to_owned()));
        }
        if options.sort == SortSpec::TextScore && search.is_none() {
            return Err(StoreError::Backend(
                "text score ordering needs a text predicate".to_owned(),
            ));
        }

        let mut rows: Vec<(f64, &Document)> = coll
            .docs
            .values()
            .filter_map(|d| {
                let score = search.map_or(0.0, |s| text_score(d, &text_fields, s));
                matcher.matches(d, score).then_some((score, d))
            })
            .collect();
        order_rows(&mut rows, &options.sort);

        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let score_field = options.score_field.as_deref().filter(|_| search.is_some());

        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(score, d)| {
                let mut out = project(d, options.projection.as_deref());
                if let Some(field) = score_field {
                    out.insert(field.to_owned(), Json::from(score));
                }
                out
            })
            .collect())
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, StoreError> {
        let rows = self
            .find(collection, predicate, &FindOptions::default())
            .await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.round_trip().await;
        let id = doc_id(&doc)?;
        let mut guard = self.collections.write();
        let coll = guard.entry(collection.to_owned()).or_default();
        if coll.docs.contains_key(&id) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_owned(),
                key: ID_FIELD.to_owned(),
            });
        }
        coll.check_unique(collection, &id, &doc)?;
        coll.docs.insert(id, doc);
        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        id: ObjectId,
        mut doc: Document,
        upsert: bool,
    ) -> Result<bool, StoreError> {
        self.round_trip().await;
        let id = id.to_hex();
        doc.insert(ID_FIELD.to_owned(), Json::String(id.clone()));
        let mut guard = self.collections.write();
        let coll = guard.entry(collection.to_owned()).or_default();
        if !upsert && !coll.docs.contains_key(&id) {
            return Ok(false);
        }
        coll.check_unique(collection, &id, &doc)?;
        coll.docs.insert(id, doc);
        Ok(true)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> Result<bool, StoreError> {
        self.round_trip().await;
        if set.contains_key(ID_FIELD) {
            return Err(StoreError::InvalidDocument(
                "`_id` cannot be updated".to_owned(),
            ));
        }
        let id = id.to_hex();
        let mut guard = self.collections.write();
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(false);
        };
        let Some(current) = coll.docs.get(&id) else {
            return Ok(false);
        };
        let mut next = current.clone();
        next.extend(set);
        coll.check_unique(collection, &id, &next)?;
        coll.docs.insert(id, next);
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> Result<bool, StoreError> {
        self.round_trip().await;
        let mut guard = self.collections.write();
        Ok(guard
            .get_mut(collection)
            .is_some_and(|coll| coll.docs.remove(&id.to_hex()).is_some()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: &Json) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn oid(n: u32) -> ObjectId {
        ObjectId::from_parts(n, [0; 5], 0)
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_index("things", IndexSpec::text("things_text", &["name"]))
            .await
            .unwrap();
        for (n, name, rank) in [(1, "Plumb Bob", 3), (2, "Plumbing Plumbers", 1), (3, "Electric", 2)] {
            store
                .insert_one(
                    "things",
                    doc(&json!({"_id": oid(n).to_hex(), "name": name, "rank": rank})),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn find_orders_limits_and_projects() {
        let store = seeded().await;
        let opts = FindOptions::default()
            .sorted(SortSpec::Keys(vec![("rank".to_owned(), SortDir::Desc)]))
            .limit(2)
            .project(["rank"]);
        let rows = store.find("things", &Predicate::always(), &opts).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["rank"], json!(3));
        assert_eq!(rows[1]["rank"], json!(2));
        assert!(rows[0].get("name").is_none());
        assert!(rows[0].contains_key(ID_FIELD));
    }

    #[tokio::test]
    async fn text_search_scores_and_orders() {
        let store = seeded().await;
        let p = Predicate::Text {
            search: "plumb".to_owned(),
        };
        let opts = FindOptions::default()
            .sorted(SortSpec::TextScore)
            .score_into("_score");
        let rows = store.find("things", &p, &opts).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["_id"], json!(oid(2).to_hex()));
        assert_eq!(rows[0]["_score"], json!(2.0));
        assert_eq!(rows[1]["_score"], json!(1.0));
    }

    #[tokio::test]
    async fn text_search_without_index_fails() {
        let store = MemoryStore::new();
        store
            .insert_one("plain", doc(&json!({"_id": oid(1).to_hex()})))
            .await
            .unwrap();
        let p = Predicate::Text {
            search: "x".to_owned(),
        };
        let err = store
            .find("plain", &p, &FindOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::MissingTextIndex("plain".to_owned()));
    }

    #[tokio::test]
    async fn unique_indexes_are_enforced() {
        let store = MemoryStore::new();
        let ix = IndexSpec::new(
            "tenant_public_id",
            vec![
                IndexKey::Asc("tenant_id".to_owned()),
                IndexKey::Desc("public_id".to_owned()),
            ],
        )
        .unique();
        store.create_index("c", ix).await.unwrap();
        let a = doc(&json!({"_id": oid(1).to_hex(), "tenant_id": "t", "public_id": 1}));
        store.insert_one("c", a.clone()).await.unwrap();

        let dup_id = store.insert_one("c", a).await.unwrap_err();
        assert!(matches!(dup_id, StoreError::DuplicateKey { ref key, .. } if key == "_id"));

        let b = doc(&json!({"_id": oid(2).to_hex(), "tenant_id": "t", "public_id": 1}));
        let dup_key = store.insert_one("c", b).await.unwrap_err();
        assert!(
            matches!(dup_key, StoreError::DuplicateKey { ref key, .. } if key == "tenant_public_id")
        );

        let other_tenant = doc(&json!({"_id": oid(3).to_hex(), "tenant_id": "u", "public_id": 1}));
        store.insert_one("c", other_tenant).await.unwrap();
    }

    #[tokio::test]
    async fn writes_report_whether_they_matched() {
        let store = seeded().await;
        let set = doc(&json!({"rank": 9}));
        assert!(store.update_one("things", oid(1), set.clone()).await.unwrap());
        assert!(!store.update_one("things", oid(42), set).await.unwrap());

        let replacement = doc(&json!({"name": "new"}));
        assert!(!store
            .replace_one("things", oid(42), replacement.clone(), false)
            .await
            .unwrap());
        assert!(store
            .replace_one("things", oid(42), replacement, true)
            .await
            .unwrap());

        assert!(store.delete_one("things", oid(42)).await.unwrap());
        assert!(!store.delete_one("things", oid(42)).await.unwrap());
        assert!(!store.delete_one("nowhere", oid(1)).await.unwrap());
        assert_eq!(store.count("things", &Predicate::always()).await.unwrap(), 3);
    }
}
