//! Batched relation resolution helpers.
//!
//! One relation over a base set costs exactly one query: the base records
//! are indexed by their correlation key, the distinct keys feed an IN-list
//! query, and the related rows are distributed back by key. A key may map
//! to several base positions.

use rowmodel_core::record::Record;
use rowmodel_core::value::{Key, Value};
use std::collections::HashMap;

/// Correlation index over a base record set.
#[derive(Debug, Default)]
pub struct RelationIndex {
    positions: HashMap<Key, Vec<usize>>,
    /// Distinct key values in first-seen order, for the IN-list
    keys: Vec<Value>,
}

impl RelationIndex {
    /// Index base records by the raw value of one attribute. Records with
    /// a NULL, missing, or unkeyable value are left out.
    pub fn build(records: &[Record], attribute: &str) -> Self {
        let mut index = RelationIndex::default();
        for (position, record) in records.iter().enumerate() {
            let Some(value) = record.get_raw(attribute) else {
                continue;
            };
            let Some(key) = value.as_key() else {
                continue;
            };
            let slot = index.positions.entry(key).or_default();
            if slot.is_empty() {
                index.keys.push(value.clone());
            }
            slot.push(position);
        }
        index
    }

    /// Distinct key values, in first-seen order.
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// Whether no base record produced a key.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Base positions indexed under a key value.
    fn positions_for(&self, value: &Value) -> &[usize] {
        value
            .as_key()
            .and_then(|key| self.positions.get(&key))
            .map_or(&[], Vec::as_slice)
    }
}

/// Distribute to-many rows: each related record is appended to every base
/// record whose key equals the related record's `attribute` value.
pub fn distribute_has_many(
    records: &mut [Record],
    index: &RelationIndex,
    name: &str,
    attribute: &str,
    related: Vec<Record>,
) {
    for rel in related {
        let Some(value) = rel.get_raw(attribute).cloned() else {
            continue;
        };
        for &position in index.positions_for(&value) {
            records[position].attach_many(name, rel.clone());
        }
    }
}

/// Distribute to-one rows: each related record is set on every base record
/// whose foreign key equals the related record's `primary_key` value. Last
/// write wins on duplicates.
pub fn distribute_belongs_to(
    records: &mut [Record],
    index: &RelationIndex,
    name: &str,
    primary_key: &str,
    related: Vec<Record>,
) {
    for rel in related {
        let Some(value) = rel.get_raw(primary_key).cloned() else {
            continue;
        };
        for &position in index.positions_for(&value) {
            records[position].attach_one(name, rel.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmodel_core::record::Related;

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut record = Record::new();
        for (name, value) in pairs {
            record.set_raw(*name, value.clone());
        }
        record
    }

    #[test]
    fn index_skips_nulls_and_dedupes_keys() {
        let records = vec![
            record(&[("id", Value::BigInt(1))]),
            record(&[("id", Value::Null)]),
            record(&[("id", Value::BigInt(1))]),
            record(&[("id", Value::BigInt(2))]),
        ];
        let index = RelationIndex::build(&records, "id");
        assert_eq!(index.keys(), &[Value::BigInt(1), Value::BigInt(2)]);
        assert_eq!(index.positions_for(&Value::BigInt(1)), &[0, 2]);
    }

    #[test]
    fn has_many_distribution() {
        let mut base = vec![
            record(&[("id", Value::BigInt(1))]),
            record(&[("id", Value::BigInt(2))]),
        ];
        let index = RelationIndex::build(&base, "id");
        let related = vec![
            record(&[("user_id", Value::BigInt(1)), ("n", Value::BigInt(10))]),
            record(&[("user_id", Value::BigInt(1)), ("n", Value::BigInt(11))]),
            record(&[("user_id", Value::BigInt(2)), ("n", Value::BigInt(12))]),
        ];
        distribute_has_many(&mut base, &index, "orders", "user_id", related);

        match base[0].related("orders") {
            Some(Related::Many(rows)) => assert_eq!(rows.len(), 2),
            other => panic!("expected two orders, got {other:?}"),
        }
        match base[1].related("orders") {
            Some(Related::Many(rows)) => assert_eq!(rows.len(), 1),
            other => panic!("expected one order, got {other:?}"),
        }
    }

    #[test]
    fn belongs_to_shares_parent_across_duplicates() {
        let mut base = vec![
            record(&[("user_id", Value::BigInt(7))]),
            record(&[("user_id", Value::BigInt(7))]),
        ];
        let index = RelationIndex::build(&base, "user_id");
        assert_eq!(index.keys().len(), 1);

        let parent = record(&[("id", Value::BigInt(7)), ("name", Value::Text("ann".into()))]);
        distribute_belongs_to(&mut base, &index, "user", "id", vec![parent.clone()]);

        for rec in &base {
            assert_eq!(rec.related("user"), Some(&Related::One(parent.clone())));
        }
    }
}
