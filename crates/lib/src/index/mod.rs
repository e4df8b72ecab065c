//! Secondary indexes over documents.
//!
//! Two derived index families live alongside the documents in the same
//! keyspace:
//!
//! - the **field index** maps every (path, typed leaf) pair observed in a
//!   document back to its key, one entry per `i/...` row;
//! - the **geo index** maps every path holding a geo point to the grid cell of
//!   that point, one entry per `g/...` row.
//!
//! Index maintenance is a pure diff. Each commit derives the entry sets of the
//! old and new document and stages deletes for entries that disappeared and
//! puts for entries that appeared, inside the same atomic batch as the document
//! write itself. Readers therefore never observe an index that disagrees with
//! the documents.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    Result,
    field::{FieldPath, Leaf},
    store::{Backend, WriteBatch, keys},
};

pub mod geo;

pub use geo::{GeoCover, GeoPoint};

/// One field-index entry derivable from a document.
pub type FieldEntry = (FieldPath, Leaf);

/// One geo-index entry derivable from a document.
pub type GeoEntry = (FieldPath, u64);

/// Derive every (path, typed leaf) pair in a document.
///
/// Arrays contribute at the path of the array itself: each scalar element is a
/// leaf of that path, and object elements extend the path without adding a
/// segment for their position.
pub fn field_entries(doc: &Value) -> BTreeSet<FieldEntry> {
    let mut out = BTreeSet::new();
    collect_fields(doc, &mut Vec::new(), &mut out);
    out
}

fn collect_fields(value: &Value, segments: &mut Vec<String>, out: &mut BTreeSet<FieldEntry>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                segments.push(name.clone());
                collect_fields(child, segments, out);
                segments.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_fields(item, segments, out);
            }
        }
        other => {
            if let Some(leaf) = Leaf::from_value(other) {
                out.insert((FieldPath::new(segments.join(".")), leaf));
            }
        }
    }
}

/// Derive every (path, cell) pair for paths holding a geo point.
pub fn geo_entries(doc: &Value) -> BTreeSet<GeoEntry> {
    let mut out = BTreeSet::new();
    collect_geo(doc, &mut Vec::new(), &mut out);
    out
}

fn collect_geo(value: &Value, segments: &mut Vec<String>, out: &mut BTreeSet<GeoEntry>) {
    match value {
        Value::Object(map) => {
            if let Some(point) = GeoPoint::from_value(value) {
                out.insert((FieldPath::new(segments.join(".")), point.cell()));
            }
            for (name, child) in map {
                segments.push(name.clone());
                collect_geo(child, segments, out);
                segments.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_geo(item, segments, out);
            }
        }
        _ => {}
    }
}

/// Stage the index updates for one document transition into a batch.
///
/// `old` is the document previously stored at `key` (if any) and `new` the
/// document after the transaction (if any). Entries present in both states are
/// left untouched.
pub fn stage_index_diff(
    batch: &mut WriteBatch,
    key: &str,
    old: Option<&Value>,
    new: Option<&Value>,
) {
    let old_fields = old.map(field_entries).unwrap_or_default();
    let new_fields = new.map(field_entries).unwrap_or_default();

    for (path, leaf) in old_fields.difference(&new_fields) {
        batch.delete(keys::field_entry_key(
            path.as_str(),
            leaf.kind().tag(),
            &leaf.encode(),
            key,
        ));
    }
    for (path, leaf) in new_fields.difference(&old_fields) {
        batch.put(
            keys::field_entry_key(path.as_str(), leaf.kind().tag(), &leaf.encode(), key),
            Vec::new(),
        );
    }

    let old_geo = old.map(geo_entries).unwrap_or_default();
    let new_geo = new.map(geo_entries).unwrap_or_default();

    for (path, cell) in old_geo.difference(&new_geo) {
        batch.delete(keys::geo_entry_key(path.as_str(), *cell, key));
    }
    for (path, cell) in new_geo.difference(&old_geo) {
        batch.put(keys::geo_entry_key(path.as_str(), *cell, key), Vec::new());
    }
}

/// Read-side index probes.
///
/// Every probe returns a sorted set of document keys so the planner can take
/// unions, intersections, and complements without re-sorting.
pub struct IndexReader<'a> {
    backend: &'a dyn Backend,
}

impl<'a> IndexReader<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    fn collect_keys(entries: Vec<(Vec<u8>, Vec<u8>)>) -> BTreeSet<String> {
        entries
            .iter()
            .filter_map(|(k, _)| keys::index_entry_user_key(k))
            .collect()
    }

    /// Keys of documents carrying exactly this (path, leaf) pair.
    pub async fn keys_with_leaf(&self, path: &FieldPath, leaf: &Leaf) -> Result<BTreeSet<String>> {
        let prefix = keys::field_leaf_prefix(path.as_str(), leaf.kind().tag(), &leaf.encode());
        Ok(Self::collect_keys(self.backend.scan_prefix(&prefix).await?))
    }

    /// Keys of documents with any leaf of `kind` at `path` inside the bounds.
    ///
    /// Bounds are `(leaf, inclusive)`; `None` leaves that side open within the
    /// (path, kind) subtree.
    pub async fn keys_in_range(
        &self,
        path: &FieldPath,
        lower: Option<(&Leaf, bool)>,
        upper: Option<(&Leaf, bool)>,
        kind_tag: u8,
    ) -> Result<BTreeSet<String>> {
        let prefix = keys::field_kind_prefix(path.as_str(), kind_tag);

        let start = match lower {
            None => prefix.clone(),
            Some((leaf, inclusive)) => {
                let mut s = prefix.clone();
                s.extend_from_slice(&keys::escape(&leaf.encode()));
                if !inclusive {
                    // Entries for the bound itself continue with the separator,
                    // which sorts below 0x01.
                    s.push(0x01);
                }
                s
            }
        };

        let end = match upper {
            None => keys::prefix_end(&prefix),
            Some((leaf, inclusive)) => {
                let mut e = prefix.clone();
                e.extend_from_slice(&keys::escape(&leaf.encode()));
                if inclusive {
                    e.push(0x01);
                }
                Some(e)
            }
        };

        let entries = self.backend.scan_range(&start, end.as_deref()).await?;
        Ok(Self::collect_keys(
            entries
                .into_iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect(),
        ))
    }

    /// Keys of every document carrying `path` at all, regardless of type.
    pub async fn keys_with_path(&self, path: &FieldPath) -> Result<BTreeSet<String>> {
        let prefix = keys::field_path_prefix(path.as_str());
        Ok(Self::collect_keys(self.backend.scan_prefix(&prefix).await?))
    }

    /// The universe: every stored document key.
    pub async fn all_doc_keys(&self) -> Result<BTreeSet<String>> {
        let entries = self.backend.scan_prefix(keys::DOC_PREFIX).await?;
        Ok(entries
            .iter()
            .filter_map(|(k, _)| keys::doc_key_user(k))
            .collect())
    }

    /// Keys of documents whose geo point at `path` falls in the cover.
    pub async fn keys_in_cover(
        &self,
        path: &FieldPath,
        cover: &GeoCover,
    ) -> Result<BTreeSet<String>> {
        match cover {
            GeoCover::FullPath => {
                let prefix = keys::geo_path_prefix(path.as_str());
                Ok(Self::collect_keys(self.backend.scan_prefix(&prefix).await?))
            }
            GeoCover::Cells(cells) => {
                let mut out = BTreeSet::new();
                for &cell in cells {
                    let prefix = keys::geo_cell_prefix(path.as_str(), cell);
                    out.extend(Self::collect_keys(
                        self.backend.scan_prefix(&prefix).await?,
                    ));
                }
                Ok(out)
            }
        }
    }
}
