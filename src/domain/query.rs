//! Paging bounds attached to a translated query.

use crate::domain::cql::{Predicate, SortKey, Translation};

/// A translated query with the page the caller asked for.
///
/// Bounds are not validated here; the store applies them as given.
#[derive(Debug, Clone)]
pub struct BoundedQuery {
    pub column: String,
    pub predicate: Predicate,
    pub sort: Vec<SortKey>,
    pub limit: u32,
    pub offset: u32,
}

pub fn paginate(translation: Translation, limit: u32, offset: u32) -> BoundedQuery {
    BoundedQuery {
        column: translation.column,
        predicate: translation.predicate,
        sort: translation.sort,
        limit,
        offset,
    }
}

impl BoundedQuery {
    /// Applies offset and limit to an already filtered sequence.
    pub fn window<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_keeps_translation() {
        let q = paginate(Translation::all("t.jsonb"), 5, 10);
        assert_eq!(q.column, "t.jsonb");
        assert!(matches!(q.predicate, Predicate::All));
        assert_eq!((q.limit, q.offset), (5, 10));
    }

    #[test]
    fn test_window() {
        let q = paginate(Translation::all("t.jsonb"), 2, 1);
        assert_eq!(q.window(vec![1, 2, 3, 4]), vec![2, 3]);
        let empty = paginate(Translation::all("t.jsonb"), 0, 0);
        assert!(empty.window(vec![1, 2]).is_empty());
    }
}
