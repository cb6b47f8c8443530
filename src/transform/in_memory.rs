//! The in-memory reconciliation engine.
//!
//! Both snapshots are indexed by identity key, every target identity is
//! resolved in first-seen order, and then every identity that only exists in
//! the baseline is swept so its delete is emitted even if nothing in the
//! target referenced it.

use rustc_hash::FxHashSet;

use super::Options;
use super::Transformer;
use super::resolve::Owner;
use crate::directory::Directory;
use crate::error::Result;
use crate::index::IdentityIndex;
use crate::op::OpKind;
use crate::op::OpSink;
use crate::op::Operation;
use crate::op::Summary;
use crate::record::IdentityKey;
use crate::record::Record;

/// Reconciles two snapshots held entirely in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemory;

impl Transformer for InMemory {
    fn name(&self) -> &str {
        return "in_memory";
    }

    fn transform(&self, baseline: Directory, target: Directory, options: &Options) -> Result<Vec<Operation>> {
        let mut run = Run::new(baseline, target, options);
        run.drive();
        return Ok(run.finish());
    }
}

/// State for one reconciliation. Dropped when the run ends.
pub(super) struct Run<'o> {
    /// Working copy of the target; reference lists are cleaned in place.
    pub(super) target: IdentityIndex,
    pub(super) baseline: IdentityIndex,
    /// Identities that have been entered during this run.
    pub(super) visited: FxHashSet<IdentityKey>,
    pub(super) sink: OpSink,
    options: &'o Options,
}

impl<'o> Run<'o> {
    fn new(baseline: Directory, target: Directory, options: &'o Options) -> Run<'o> {
        return Run {
            target: IdentityIndex::build(target),
            baseline: IdentityIndex::build(baseline),
            visited: FxHashSet::default(),
            sink: OpSink::new(),
            options,
        };
    }

    fn drive(&mut self) {
        let present: Vec<IdentityKey> = self.target.keys().cloned().collect();
        for key in &present {
            self.resolve(key, &Owner::Target(key.clone()));
        }

        let removed: Vec<IdentityKey> = self
            .baseline
            .keys()
            .filter(|key| !self.target.contains(key))
            .cloned()
            .collect();
        for key in &removed {
            self.resolve(key, &Owner::Baseline(key.clone()));
        }
    }

    fn finish(self) -> Vec<Operation> {
        let ops = self.sink.into_operations();
        let summary = Summary::of(&ops);
        tracing::debug!(
            inserts = summary.inserts,
            updates = summary.updates,
            noops = summary.noops,
            deletes = summary.deletes,
            "reconciliation finished"
        );
        return ops;
    }

    /// Emit the operation for a target identity whose references are resolved.
    ///
    /// `declared` tells whether the target record named any assistants other
    /// than itself. When it did not, the relationship is left as the baseline
    /// had it: only name, key and phone are compared, and a changed record
    /// carries the baseline's assistants (those still present in the target).
    ///
    /// Returns an update that must wait until its backfilled references have
    /// been resolved.
    pub(super) fn classify(&mut self, key: &IdentityKey, declared: bool) -> Option<Record> {
        let record = self.target.get(key)?.clone();
        let Some(old) = self.baseline.get(key) else {
            self.sink.emit(OpKind::Insert, record);
            return None;
        };

        if declared {
            if record.same_entry(old) {
                self.noop(record);
            } else {
                self.sink.emit(OpKind::Update, record);
            }
            return None;
        }

        if record.same_contact(old) {
            self.noop(record);
            return None;
        }

        let mut record = record;
        record.assistants = old.assistants.clone();
        record.retain_assistants(|other| other != key && self.target.contains(other));
        if record.assistants.is_some() {
            return Some(record);
        }
        self.sink.emit(OpKind::Update, record);
        return None;
    }

    fn noop(&mut self, record: Record) {
        if self.options.skip_noop {
            tracing::trace!(key = %record.key, "noop skipped");
            return;
        }
        self.sink.emit(OpKind::Noop, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(baseline: Vec<Record>, target: Vec<Record>) -> Vec<(OpKind, String)> {
        let ops = InMemory
            .transform(baseline.into(), target.into(), &Options::default())
            .unwrap();
        return ops
            .into_iter()
            .map(|op| (op.kind, op.record.key.as_str().to_string()))
            .collect();
    }

    fn op(kind: OpKind, key: &str) -> (OpKind, String) {
        return (kind, key.to_string());
    }

    #[test]
    fn name_is_in_memory() {
        assert_eq!(InMemory.name(), "in_memory");
    }

    #[test]
    fn empty_snapshots_produce_nothing() {
        assert!(run(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn unreferenced_removals_are_swept_in_baseline_order() {
        let ops = run(
            vec![
                Record::new("Matthew", "matthew@envoy.com"),
                Record::new("Kamal", "kamal@envoy.com"),
                Record::new("Adolfo", "adolfo@envoy.com"),
            ],
            vec![Record::new("Kamal", "kamal@envoy.com")],
        );
        assert_eq!(
            ops,
            vec![
                op(OpKind::Noop, "kamal@envoy.com"),
                op(OpKind::Delete, "matthew@envoy.com"),
                op(OpKind::Delete, "adolfo@envoy.com"),
            ]
        );
    }

    #[test]
    fn backfilled_references_are_resolved_first() {
        // The target drops the assistant column for Kamal but changes the
        // phone, so Kamal's update carries Adolfo from the baseline.
        let ops = InMemory
            .transform(
                vec![
                    Record::new("Kamal", "kamal@envoy.com").with_assistants("adolfo@envoy.com"),
                    Record::new("Adolfo", "adolfo@envoy.com"),
                ]
                .into(),
                vec![
                    Record::new("Kamal", "kamal@envoy.com").with_phone("555"),
                    Record::new("Adolfo", "adolfo@envoy.com").with_phone("556"),
                ]
                .into(),
                &Options::default(),
            )
            .unwrap();

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, OpKind::Update);
        assert_eq!(ops[0].key().as_str(), "adolfo@envoy.com");
        assert_eq!(ops[1].kind, OpKind::Update);
        assert_eq!(ops[1].key().as_str(), "kamal@envoy.com");
        assert_eq!(ops[1].record.assistants_csv().as_deref(), Some("adolfo@envoy.com"));
    }

    #[test]
    fn backfill_drops_references_missing_from_target() {
        let ops = InMemory
            .transform(
                vec![
                    Record::new("Kamal", "kamal@envoy.com").with_assistants("adolfo@envoy.com,kamal@envoy.com"),
                    Record::new("Adolfo", "adolfo@envoy.com"),
                ]
                .into(),
                vec![Record::new("Kamal", "kamal@envoy.com").with_phone("555")].into(),
                &Options::default(),
            )
            .unwrap();

        assert_eq!(ops[0].kind, OpKind::Update);
        assert!(ops[0].record.assistants.is_none());
        assert_eq!(ops[1].kind, OpKind::Delete);
        assert_eq!(ops[1].key().as_str(), "adolfo@envoy.com");
    }

    #[test]
    fn skip_noop_suppresses_only_noops() {
        let ops = InMemory
            .transform(
                vec![Record::new("Kamal", "kamal@envoy.com"), Record::new("Matthew", "matthew@envoy.com")].into(),
                vec![Record::new("Kamal", "kamal@envoy.com"), Record::new("Adolfo", "adolfo@envoy.com")].into(),
                &Options::default().skip_noop(true),
            )
            .unwrap();
        let kinds: Vec<OpKind> = ops.iter().map(|op| op.kind).collect();
        assert_eq!(kinds, vec![OpKind::Insert, OpKind::Delete]);
    }
}
