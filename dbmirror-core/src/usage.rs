//! Column usage policies and key topology
//!
//! A policy decides, per column, whether it goes into a payload:
//!
//! | policy                 | include column when |
//! |------------------------|---------------------|
//! | `AllColumns`           | always              |
//! | `KeysOnly`             | PK and not FK       |
//! | `NonKeyColumns`        | not PK              |
//! | `KeyAndForeignColumns` | PK or FK            |
//!
//! Dropped columns are filtered out before the policy is consulted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which columns of a row image are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnUsage {
    /// Primary-key columns
    KeysOnly,
    /// Everything outside the primary key
    NonKeyColumns,
    /// Primary-key and foreign-key columns
    KeyAndForeignColumns,
    /// Every live column
    AllColumns,
}

impl ColumnUsage {
    /// Inclusion predicate for a column with the given key roles
    pub fn includes(self, is_primary: bool, is_foreign: bool) -> bool {
        match self {
            ColumnUsage::AllColumns => true,
            ColumnUsage::KeysOnly => is_primary && !is_foreign,
            ColumnUsage::NonKeyColumns => !is_primary,
            ColumnUsage::KeyAndForeignColumns => is_primary || is_foreign,
        }
    }

    /// Whether encoding under this policy needs the primary key
    pub fn needs_primary_key(self) -> bool {
        !matches!(self, ColumnUsage::AllColumns)
    }

    /// Whether foreign-key columns have to be looked up
    pub fn needs_foreign_keys(self) -> bool {
        matches!(self, ColumnUsage::KeyAndForeignColumns)
    }
}

/// Primary-key order and foreign-key set of a table.
///
/// Transient: resolved from the catalog for every event that needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTopology {
    primary_key: Vec<i16>,
    foreign_keys: BTreeSet<i16>,
}

impl KeyTopology {
    /// Create a topology from primary-key ordinals (in key order) and
    /// foreign-key ordinals (any order, duplicates collapse)
    pub fn new(primary_key: Vec<i16>, foreign_keys: impl IntoIterator<Item = i16>) -> Self {
        Self {
            primary_key,
            foreign_keys: foreign_keys.into_iter().collect(),
        }
    }

    /// Primary-key ordinals in key order
    pub fn primary_key(&self) -> &[i16] {
        &self.primary_key
    }

    /// Foreign-key ordinals, aggregated over all constraints
    pub fn foreign_keys(&self) -> &BTreeSet<i16> {
        &self.foreign_keys
    }

    /// True when at least one primary-key column is known
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Whether `ordinal` is part of the primary key
    pub fn is_primary(&self, ordinal: i16) -> bool {
        self.primary_key.contains(&ordinal)
    }

    /// Whether `ordinal` is referenced by a foreign-key constraint
    pub fn is_foreign(&self, ordinal: i16) -> bool {
        self.foreign_keys.contains(&ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_usage() -> impl Strategy<Value = ColumnUsage> {
        prop_oneof![
            Just(ColumnUsage::KeysOnly),
            Just(ColumnUsage::NonKeyColumns),
            Just(ColumnUsage::KeyAndForeignColumns),
            Just(ColumnUsage::AllColumns),
        ]
    }

    #[test]
    fn test_truth_table() {
        use ColumnUsage::*;

        // (policy, pk, fk, included)
        let table = [
            (AllColumns, false, false, true),
            (AllColumns, true, false, true),
            (AllColumns, false, true, true),
            (AllColumns, true, true, true),
            (KeysOnly, false, false, false),
            (KeysOnly, true, false, true),
            (KeysOnly, false, true, false),
            (KeysOnly, true, true, false),
            (NonKeyColumns, false, false, true),
            (NonKeyColumns, true, false, false),
            (NonKeyColumns, false, true, true),
            (NonKeyColumns, true, true, false),
            (KeyAndForeignColumns, false, false, false),
            (KeyAndForeignColumns, true, false, true),
            (KeyAndForeignColumns, false, true, true),
            (KeyAndForeignColumns, true, true, true),
        ];

        for (usage, pk, fk, expected) in table {
            assert_eq!(
                usage.includes(pk, fk),
                expected,
                "{:?} pk={} fk={}",
                usage,
                pk,
                fk
            );
        }
    }

    #[test]
    fn test_lookup_requirements() {
        assert!(!ColumnUsage::AllColumns.needs_primary_key());
        assert!(ColumnUsage::KeysOnly.needs_primary_key());
        assert!(ColumnUsage::NonKeyColumns.needs_primary_key());
        assert!(ColumnUsage::KeyAndForeignColumns.needs_primary_key());

        assert!(ColumnUsage::KeyAndForeignColumns.needs_foreign_keys());
        assert!(!ColumnUsage::KeysOnly.needs_foreign_keys());
    }

    #[test]
    fn test_topology_membership() {
        let topology = KeyTopology::new(vec![3, 1], [2, 4, 2]);

        assert_eq!(topology.primary_key(), &[3, 1]);
        assert_eq!(topology.foreign_keys().len(), 2);
        assert!(topology.is_primary(1));
        assert!(!topology.is_primary(2));
        assert!(topology.is_foreign(4));
        assert!(topology.has_primary_key());
        assert!(!KeyTopology::default().has_primary_key());
    }

    proptest! {
        #[test]
        fn prop_policies_partition_as_documented(
            usage in any_usage(),
            pk in any::<bool>(),
            fk in any::<bool>(),
        ) {
            let expected = match usage {
                ColumnUsage::AllColumns => true,
                ColumnUsage::KeysOnly => pk && !fk,
                ColumnUsage::NonKeyColumns => !pk,
                ColumnUsage::KeyAndForeignColumns => pk || fk,
            };
            prop_assert_eq!(usage.includes(pk, fk), expected);
        }

        #[test]
        fn prop_keys_only_is_subset_of_key_and_foreign(pk in any::<bool>(), fk in any::<bool>()) {
            if ColumnUsage::KeysOnly.includes(pk, fk) {
                prop_assert!(ColumnUsage::KeyAndForeignColumns.includes(pk, fk));
            }
        }

        #[test]
        fn prop_non_key_complements_primary(pk in any::<bool>(), fk in any::<bool>()) {
            prop_assert_ne!(ColumnUsage::NonKeyColumns.includes(pk, fk), pk);
        }
    }
}
