//! AFL fuzz harness for reconciliation
//!
//! Every four input bytes describe one row of either the baseline or the
//! target directory. After reconciling, the harness checks:
//! 1. Uniqueness: at most one operation per identity
//! 2. Completeness: every identity of either directory has an operation
//! 3. Clean references: no emitted record refers to itself, and resolved
//!    records only refer to people in the target
//! 4. Fixed point: reconciling the resolved records with themselves is all noops

use afl::fuzz;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use directory_diff::IdentityKey;
use directory_diff::OpKind;
use directory_diff::Operation;
use directory_diff::Options;
use directory_diff::Record;
use directory_diff::reconcile;

const PEOPLE: u8 = 12;
const NAMES: [&str; 3] = ["Kamal", "Adolfo", "Matthew"];
const NO_REF: u8 = 0xff;

fn email(person: u8, shout: bool) -> String {
    let email = format!("person{}@envoy.com", person);
    if shout {
        return email.to_uppercase();
    }
    return email;
}

/// Decode one row: `[side|person, name|phone, ref, ref]`.
fn row(bytes: &[u8]) -> (bool, Record) {
    let in_target = bytes[0] & 0x80 != 0;
    let person = (bytes[0] & 0x7f) % PEOPLE;
    let name = NAMES[(bytes[1] % 3) as usize];
    let phone = (bytes[1] >> 2) % 4;

    let mut record = Record::new(name, &email(person, bytes[1] & 0x40 != 0));
    if phone != 0 {
        record = record.with_phone(format!("555-000{}", phone));
    }
    let refs: Vec<String> = bytes[2..4]
        .iter()
        .filter(|&&r| r != NO_REF)
        .map(|&r| email(r % (PEOPLE + 2), r & 1 == 0))
        .collect();
    return (in_target, record.with_assistants(&refs.join(",")));
}

fn check(baseline: &[Record], target: &[Record], ops: &[Operation]) {
    let target_keys: FxHashSet<&IdentityKey> = target.iter().map(|r| &r.key).collect();

    let mut seen: FxHashSet<&IdentityKey> = FxHashSet::default();
    for op in ops {
        assert!(seen.insert(op.key()), "Duplicate operation for {}", op.key());
        assert!(!op.record.refers_to(op.key()), "{} refers to itself", op.key());
        if op.kind == OpKind::Delete {
            assert!(!target_keys.contains(op.key()), "Deleted {} is still in the target", op.key());
            continue;
        }
        for reference in op.record.assistants.iter().flatten() {
            assert!(target_keys.contains(reference), "{} -> {} dangles", op.key(), reference);
        }
    }

    for record in baseline.iter().chain(target) {
        assert!(seen.contains(&record.key), "No operation for {}", record.key);
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut baseline = Vec::new();
        let mut target = Vec::new();
        for chunk in data.chunks_exact(4) {
            let (in_target, record) = row(chunk);
            if in_target {
                target.push(record);
            } else {
                baseline.push(record);
            }
        }

        let ops = reconcile(baseline.clone())
            .into(target.clone(), &Options::default())
            .unwrap();
        check(&baseline, &target, &ops);

        // Resolved records must reconcile with themselves to noops.
        let resolved: Vec<Record> = ops
            .into_iter()
            .filter(|op| op.kind != OpKind::Delete)
            .map(Operation::into_record)
            .collect();
        let by_key: FxHashMap<&IdentityKey, &Record> = resolved.iter().map(|r| (&r.key, r)).collect();
        let again = reconcile(resolved.clone())
            .into(resolved.clone(), &Options::default())
            .unwrap();
        assert_eq!(again.len(), resolved.len(), "Fixed point changed size");
        for op in &again {
            assert_eq!(op.kind, OpKind::Noop, "{} is not a fixed point", op.key());
            assert_eq!(&op.record, by_key[op.key()], "{} changed on second pass", op.key());
        }
    });
}
