//! Change operations and the sink that collects them.
//!
//! A reconciliation run produces at most one operation per identity. The
//! sink enforces that: the first operation accepted for a key is final and
//! later ones are dropped, so callers can emit freely from any path.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeSeq;

use crate::record::IdentityKey;
use crate::record::Record;

/// What to do with one identity in the persistent store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Insert,
    Update,
    Noop,
    Delete,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        return match self {
            OpKind::Insert => "insert",
            OpKind::Update => "update",
            OpKind::Noop => "noop",
            OpKind::Delete => "delete",
        };
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// An operation on one identity.
///
/// For inserts, updates and noops `record` is the resolved target record.
/// For deletes it is the baseline record.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub kind: OpKind,
    pub record: Record,
}

impl Operation {
    pub fn new(kind: OpKind, record: Record) -> Operation {
        return Operation { kind, record };
    }

    pub fn key(&self) -> &IdentityKey {
        return &self.record.key;
    }

    pub fn into_record(self) -> Record {
        return self.record;
    }
}

/// Wire shape: `[kind, name, key, phone, assistants, ...extra]`.
impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1 + self.record.cell_count()))?;
        seq.serialize_element(&self.kind)?;
        self.record.serialize_cells(&mut seq)?;
        return seq.end();
    }
}

/// Deduplicating, order-preserving collector of operations.
#[derive(Clone, Debug, Default)]
pub struct OpSink {
    /// Identities that already have an operation.
    emitted: FxHashSet<IdentityKey>,
    ops: Vec<Operation>,
}

impl OpSink {
    /// Create a new empty sink.
    pub fn new() -> OpSink {
        return OpSink {
            emitted: FxHashSet::default(),
            ops: Vec::new(),
        };
    }

    /// Append an operation unless its identity already has one.
    ///
    /// Returns true if the operation was accepted.
    pub fn emit(&mut self, kind: OpKind, record: Record) -> bool {
        if self.emitted.contains(&record.key) {
            tracing::trace!(key = %record.key, %kind, "operation dropped, identity already emitted");
            return false;
        }

        tracing::trace!(key = %record.key, %kind, "operation accepted");
        self.emitted.insert(record.key.clone());
        self.ops.push(Operation::new(kind, record));
        return true;
    }

    /// All accepted operations in acceptance order.
    pub fn into_operations(self) -> Vec<Operation> {
        return self.ops;
    }
}

/// Per-kind operation counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub inserts: usize,
    pub updates: usize,
    pub noops: usize,
    pub deletes: usize,
}

impl Summary {
    /// Count the operations of each kind.
    pub fn of(ops: &[Operation]) -> Summary {
        let mut summary = Summary::default();
        for op in ops {
            match op.kind {
                OpKind::Insert => summary.inserts += 1,
                OpKind::Update => summary.updates += 1,
                OpKind::Noop => summary.noops += 1,
                OpKind::Delete => summary.deletes += 1,
            }
        }
        return summary;
    }

    /// Operations that change the store (everything but noops).
    pub fn changes(&self) -> usize {
        return self.inserts + self.updates + self.deletes;
    }

    pub fn total(&self) -> usize {
        return self.changes() + self.noops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sink_accepts_first_operation_per_identity() {
        let mut sink = OpSink::new();
        assert!(sink.emit(OpKind::Insert, Record::new("Kamal", "kamal@envoy.com")));
        assert!(!sink.emit(OpKind::Update, Record::new("Kamal Changed", "kamal@envoy.com")));
        assert!(!sink.emit(OpKind::Delete, Record::new("Kamal", "KAMAL@envoy.com")));

        let ops = sink.into_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].key(), &IdentityKey::new("kamal@envoy.com"));
        assert_eq!(ops[0].kind, OpKind::Insert);
        assert_eq!(ops[0].record.name.as_deref(), Some("Kamal"));
    }

    #[test]
    fn sink_preserves_acceptance_order() {
        let mut sink = OpSink::new();
        sink.emit(OpKind::Noop, Record::new("Adolfo", "adolfo@envoy.com"));
        sink.emit(OpKind::Update, Record::new("Kamal", "kamal@envoy.com"));
        sink.emit(OpKind::Insert, Record::new("Adolfo again", "adolfo@envoy.com"));
        sink.emit(OpKind::Delete, Record::new("Matthew", "matthew@envoy.com"));

        let ops = sink.into_operations();
        let keys: Vec<&str> = ops.iter().map(|op| op.key().as_str()).collect();
        assert_eq!(keys, vec!["adolfo@envoy.com", "kamal@envoy.com", "matthew@envoy.com"]);
        let kinds: Vec<OpKind> = ops.iter().map(|op| op.kind).collect();
        assert_eq!(kinds, vec![OpKind::Noop, OpKind::Update, OpKind::Delete]);
    }

    #[test]
    fn operation_serializes_with_kind_first() {
        let op = Operation::new(
            OpKind::Insert,
            Record::new("Kamal", "kamal@envoy.com").with_phone("415-935-3143").with_extra("foo"),
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!(["insert", "Kamal", "kamal@envoy.com", "415-935-3143", null, "foo"])
        );
    }

    #[test]
    fn kinds_render_lowercase() {
        let kinds = [OpKind::Insert, OpKind::Update, OpKind::Noop, OpKind::Delete];
        let rendered: Vec<String> = kinds.iter().map(|kind| kind.to_string()).collect();
        assert_eq!(rendered, vec!["insert", "update", "noop", "delete"]);
        assert_eq!(serde_json::to_value(OpKind::Noop).unwrap(), json!("noop"));
    }

    #[test]
    fn summary_counts_each_kind() {
        let ops = vec![
            Operation::new(OpKind::Insert, Record::new("A", "a@x")),
            Operation::new(OpKind::Insert, Record::new("B", "b@x")),
            Operation::new(OpKind::Noop, Record::new("C", "c@x")),
            Operation::new(OpKind::Delete, Record::new("D", "d@x")),
        ];
        let summary = Summary::of(&ops);
        assert_eq!(summary, Summary { inserts: 2, updates: 0, noops: 1, deletes: 1 });
        assert_eq!(summary.changes(), 3);
        assert_eq!(summary.total(), 4);
    }
}
