//! In-process [`Store`] implementation.
//!
//! Rows live in a `BTreeMap` keyed by their [`Cursor`], so the map's own
//! ordering is the listing order and range scans are plain `range` calls.
//! Good for demos, tests and small fixed datasets; anything persistent
//! implements [`Store`] over its own connection pool.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::pagination::{Cursor, Keyed, Scan, Store};

/// A sorted, lock-protected collection of rows.
pub struct MemoryStore<R> {
    rows: RwLock<BTreeMap<Cursor, R>>,
}

impl<R: Keyed + Clone + Send + Sync + 'static> MemoryStore<R> {
    pub fn new() -> Self {
        Self { rows: RwLock::new(BTreeMap::new()) }
    }

    /// Inserts `row`, replacing any row with the same id.
    pub async fn insert(&self, row: R) {
        let mut rows = self.rows.write().await;
        rows.retain(|cursor, _| cursor.id() != row.id());
        rows.insert(Cursor::of(&row), row);
    }

    /// Removes the row with `id`, returning it.
    pub async fn remove(&self, id: u64) -> Option<R> {
        let mut rows = self.rows.write().await;
        let cursor = rows.keys().find(|c| c.id() == id)?.clone();
        rows.remove(&cursor)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl<R: Keyed + Clone + Send + Sync + 'static> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Keyed + Clone + Send + Sync + 'static> FromIterator<R> for MemoryStore<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let rows = iter.into_iter().map(|row| (Cursor::of(&row), row)).collect();
        Self { rows: RwLock::new(rows) }
    }
}

#[async_trait]
impl<R: Keyed + Clone + Send + Sync + 'static> Store for MemoryStore<R> {
    type Row = R;
    type Error = Infallible;

    async fn query_first(&self, limit: usize) -> Result<Vec<R>, Infallible> {
        Ok(self.rows.read().await.values().take(limit).cloned().collect())
    }

    async fn query_range(&self, bound: &Cursor, scan: Scan, limit: usize) -> Result<Vec<R>, Infallible> {
        let rows = self.rows.read().await;
        let found: Vec<R> = match scan {
            Scan::Above => rows
                .range((Bound::Excluded(bound), Bound::Unbounded))
                .take(limit)
                .map(|(_, row)| row.clone())
                .collect(),
            Scan::Below => rows
                .range((Bound::Unbounded, Bound::Excluded(bound)))
                .rev()
                .take(limit)
                .map(|(_, row)| row.clone())
                .collect(),
        };
        Ok(found)
    }

    async fn find(&self, id: u64) -> Result<Option<R>, Infallible> {
        Ok(self.rows.read().await.values().find(|row| row.id() == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row(&'static str, u64);

    impl Keyed for Row {
        fn sort_key(&self) -> &str { self.0 }
        fn id(&self) -> u64 { self.1 }
    }

    fn names(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.0).collect()
    }

    #[tokio::test]
    async fn ranges_are_strict_and_ordered() {
        let store: MemoryStore<Row> = [Row("C", 3), Row("A", 1), Row("B", 2), Row("D", 4)].into_iter().collect();
        let bound = Cursor::new("B", 2);

        let above = store.query_range(&bound, Scan::Above, 10).await.unwrap();
        assert_eq!(names(&above), ["C", "D"]);

        let below = store.query_range(&bound, Scan::Below, 10).await.unwrap();
        assert_eq!(names(&below), ["A"]);

        let first = store.query_first(3).await.unwrap();
        assert_eq!(names(&first), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn below_keeps_the_rows_nearest_the_bound() {
        let store: MemoryStore<Row> = [Row("A", 1), Row("B", 2), Row("C", 3), Row("D", 4)].into_iter().collect();
        let below = store.query_range(&Cursor::new("D", 4), Scan::Below, 2).await.unwrap();
        assert_eq!(names(&below), ["C", "B"]);
    }

    #[tokio::test]
    async fn equal_keys_are_split_by_id() {
        let store: MemoryStore<Row> = [Row("Kim", 1), Row("Kim", 2), Row("Kim", 3)].into_iter().collect();
        let above = store.query_range(&Cursor::new("Kim", 1), Scan::Above, 10).await.unwrap();
        assert_eq!(above.iter().map(|r| r.1).collect::<Vec<_>>(), [2, 3]);
    }

    #[tokio::test]
    async fn insert_replaces_by_id_and_remove_finds_by_id() {
        let store = MemoryStore::new();
        store.insert(Row("Ana", 1)).await;
        store.insert(Row("Zoe", 1)).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.find(1).await.unwrap(), Some(Row("Zoe", 1)));

        assert_eq!(store.remove(1).await, Some(Row("Zoe", 1)));
        assert_eq!(store.remove(1).await, None);
        assert_eq!(store.find(1).await.unwrap(), None);
    }
}
