//! Reference resolution.
//!
//! Resolving an identity means resolving every identity it references first,
//! then emitting its own operation. That gives dependency-first output: an
//! assistant's operation lands before the operation of the person pointing
//! at it.
//!
//! The walk is a depth-first post-order traversal over an explicit stack.
//! Each identity is entered at most once per run (the visited set), which
//! breaks reference cycles: the member of a cycle reached last is emitted
//! first.
//!
//! References that do not resolve in the target are not errors. When an
//! identity is missing from the target, a delete is emitted for its baseline
//! record (if any) and the reference is removed from whichever record
//! pointed at it.

use super::in_memory::Run;
use crate::op::OpKind;
use crate::record::AssistantRefs;
use crate::record::IdentityKey;
use crate::record::Record;

/// The record whose reference led to an identity.
#[derive(Clone, Debug)]
pub(super) enum Owner {
    /// A record of the target snapshot.
    Target(IdentityKey),
    /// A record of the baseline snapshot (the sweep over removed identities).
    Baseline(IdentityKey),
}

impl Owner {
    fn key(&self) -> &IdentityKey {
        return match self {
            Owner::Target(key) | Owner::Baseline(key) => key,
        };
    }
}

/// Work left for one identity on the resolution stack.
struct Frame {
    key: IdentityKey,
    /// References to resolve before this identity can be emitted.
    refs: AssistantRefs,
    next: usize,
    stage: Stage,
}

enum Stage {
    /// Walking the references the target record declared.
    Declared,
    /// Walking backfilled references of an update that is waiting to be emitted.
    Backfill(Record),
}

impl Run<'_> {
    /// Resolve `root`, reached through `owner`, and everything it references.
    pub(super) fn resolve(&mut self, root: &IdentityKey, owner: &Owner) {
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.enter(root, owner) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.refs.len() {
                let reference = frame.refs[frame.next].clone();
                frame.next += 1;
                let owner = Owner::Target(frame.key.clone());
                if let Some(child) = self.enter(&reference, &owner) {
                    stack.push(child);
                }
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            if let Some(next) = self.leave(frame) {
                stack.push(next);
            }
        }
    }

    /// Visit an identity. Returns a frame if its references still need walking.
    fn enter(&mut self, key: &IdentityKey, owner: &Owner) -> Option<Frame> {
        if !self.visited.insert(key.clone()) {
            if self.target.contains(key) {
                tracing::debug!(%key, owner = %owner.key(), "already visited, skipping");
            } else {
                self.detach(key, owner);
            }
            return None;
        }

        if !self.target.contains(key) {
            self.retire(key);
            self.detach(key, owner);
            return None;
        }

        let refs = self.declared_refs(key);
        return Some(Frame {
            key: key.clone(),
            refs,
            next: 0,
            stage: Stage::Declared,
        });
    }

    /// All references of a frame are resolved; classify or emit.
    fn leave(&mut self, frame: Frame) -> Option<Frame> {
        return match frame.stage {
            Stage::Declared => {
                let declared = !frame.refs.is_empty();
                let pending = self.classify(&frame.key, declared)?;
                let refs = pending.assistants.clone().unwrap_or_default();
                Some(Frame {
                    key: frame.key,
                    refs,
                    next: 0,
                    stage: Stage::Backfill(pending),
                })
            }
            Stage::Backfill(record) => {
                self.sink.emit(OpKind::Update, record);
                None
            }
        };
    }

    /// Drop self-references from a target record and return what it declares.
    fn declared_refs(&mut self, key: &IdentityKey) -> AssistantRefs {
        let Some(record) = self.target.get_mut(key) else {
            return AssistantRefs::new();
        };
        record.detach(key);
        return record.assistants.clone().unwrap_or_default();
    }

    /// Emit a delete for an identity that is gone from the target.
    fn retire(&mut self, key: &IdentityKey) {
        let Some(old) = self.baseline.get(key) else {
            return;
        };
        let mut record = old.clone();
        record.detach(key);
        self.sink.emit(OpKind::Delete, record);
    }

    /// Remove the reference to `key` from the owner's record.
    fn detach(&mut self, key: &IdentityKey, owner: &Owner) {
        let record = match owner {
            Owner::Target(owner) => self.target.get_mut(owner),
            Owner::Baseline(owner) => self.baseline.get_mut(owner),
        };
        if let Some(record) = record {
            if record.detach(key) {
                tracing::debug!(%key, owner = %owner.key(), "detached unresolved reference");
            }
        }
    }
}
