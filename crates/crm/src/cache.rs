use std::collections::{BTreeSet, HashMap};

use timesheet_core::ReportRow;

use crate::odata::{CrmError, ReferenceKind, ReferenceLookup};

/// Remembers every key it has asked about, found or not, for the lifetime of
/// the cache. Only unseen keys reach the underlying lookup.
pub struct ReferenceCache<L> {
    lookup: L,
    entries: HashMap<ReferenceKind, HashMap<String, Option<String>>>,
}

impl<L: ReferenceLookup> ReferenceCache<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            entries: HashMap::new(),
        }
    }

    /// Maps each key to its internal id, or `None` when the CRM has no such record.
    pub async fn resolve(
        &mut self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, Option<String>>, CrmError> {
        let cache = self.entries.entry(kind).or_default();

        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !cache.contains_key(k.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if !missing.is_empty() {
            let found = self.lookup.lookup(kind, &missing).await?;
            for key in missing {
                let id = found.get(&key).cloned();
                cache.insert(key, id);
            }
        }

        Ok(keys
            .iter()
            .map(|k| (k.clone(), cache.get(k).cloned().flatten()))
            .collect())
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

/// Distinct order and case references mentioned by a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub orders: BTreeSet<String>,
    pub cases: BTreeSet<String>,
}

impl References {
    pub fn record(&mut self, row: &ReportRow) {
        if !row.order.is_empty() {
            self.orders.insert(row.order.clone());
        }
        if !row.case_reference.is_empty() {
            self.cases.insert(row.case_reference.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::Mutex;

    struct CountingLookup {
        known: HashMap<String, String>,
        requests: Mutex<Vec<Vec<String>>>,
    }

    impl CountingLookup {
        fn new(known: &[(&str, &str)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Vec<String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ReferenceLookup for CountingLookup {
        async fn lookup(
            &self,
            _kind: ReferenceKind,
            keys: &[String],
        ) -> Result<HashMap<String, String>, CrmError> {
            self.requests.lock().unwrap().push(keys.to_vec());
            Ok(keys
                .iter()
                .filter_map(|k| self.known.get(k).map(|id| (k.clone(), id.clone())))
                .collect())
        }
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn resolves_found_and_missing_keys() {
        let mut cache = ReferenceCache::new(CountingLookup::new(&[("SO-1", "id-1")]));
        let resolved = cache
            .resolve(ReferenceKind::SalesOrder, &keys(&["SO-1", "SO-2"]))
            .await
            .unwrap();
        assert_eq!(resolved["SO-1"].as_deref(), Some("id-1"));
        assert_eq!(resolved["SO-2"], None);
    }

    #[tokio::test]
    async fn repeated_keys_are_served_from_cache() {
        let mut cache = ReferenceCache::new(CountingLookup::new(&[("SO-1", "id-1")]));
        cache
            .resolve(ReferenceKind::SalesOrder, &keys(&["SO-1", "SO-2"]))
            .await
            .unwrap();
        cache
            .resolve(ReferenceKind::SalesOrder, &keys(&["SO-2", "SO-1"]))
            .await
            .unwrap();
        assert_eq!(cache.lookup().requests().len(), 1);
    }

    #[tokio::test]
    async fn only_unseen_keys_are_requested() {
        let mut cache = ReferenceCache::new(CountingLookup::new(&[]));
        cache
            .resolve(ReferenceKind::Case, &keys(&["CAS-1", "CAS-1"]))
            .await
            .unwrap();
        cache
            .resolve(ReferenceKind::Case, &keys(&["CAS-1", "CAS-2"]))
            .await
            .unwrap();
        assert_eq!(
            cache.lookup().requests(),
            vec![keys(&["CAS-1"]), keys(&["CAS-2"])]
        );
    }

    #[tokio::test]
    async fn kinds_are_cached_separately() {
        let mut cache = ReferenceCache::new(CountingLookup::new(&[]));
        cache
            .resolve(ReferenceKind::Case, &keys(&["X"]))
            .await
            .unwrap();
        cache
            .resolve(ReferenceKind::SalesOrder, &keys(&["X"]))
            .await
            .unwrap();
        assert_eq!(cache.lookup().requests().len(), 2);
    }

    #[test]
    fn records_distinct_non_empty_references() {
        let row = |order: &str, case: &str| ReportRow {
            description: "x".to_string(),
            start: DateTime::parse_from_rfc3339("2024-01-15T09:00:00+00:00").unwrap(),
            minutes: 60,
            category: None,
            owner: "jdoe".to_string(),
            case_reference: case.to_string(),
            order: order.to_string(),
            opportunity: String::new(),
            quote: String::new(),
            invoice: String::new(),
        };
        let mut refs = References::default();
        for r in [row("SO-1", "CAS-1"), row("SO-1", ""), row("", "CAS-2")] {
            refs.record(&r);
        }
        assert_eq!(refs.orders, BTreeSet::from(["SO-1".to_string()]));
        assert_eq!(
            refs.cases,
            BTreeSet::from(["CAS-1".to_string(), "CAS-2".to_string()])
        );
    }
}
