//! Directory Diff - reconcile two snapshots of a people directory.
//!
//! Given the directory as it is now (the baseline) and as it should be (the
//! target), produce the operations that turn one into the other: one
//! insert, update, noop or delete per identity, ordered so that every
//! assistant a record points at is emitted before the record itself.
//!
//! # Quick Start
//!
//! ```
//! use directory_diff::OpKind;
//! use directory_diff::Options;
//! use directory_diff::Record;
//! use directory_diff::reconcile;
//!
//! let baseline = vec![
//!     Record::new("Kamal", "kamal@envoy.com"),
//!     Record::new("Adolfo", "adolfo@envoy.com"),
//! ];
//! let target = vec![
//!     Record::new("Kamal", "kamal@envoy.com").with_assistants("adolfo@envoy.com"),
//!     Record::new("Adolfo", "adolfo@envoy.com"),
//! ];
//!
//! let ops = reconcile(baseline).into(target, &Options::default()).unwrap();
//! let kinds: Vec<OpKind> = ops.iter().map(|op| op.kind).collect();
//! assert_eq!(kinds, vec![OpKind::Noop, OpKind::Update]);
//! ```

pub mod directory;
pub mod error;
pub mod index;
pub mod op;
pub mod record;
pub mod transform;

pub use directory::Directory;
pub use error::Error;
pub use error::Result;
pub use op::OpKind;
pub use op::Operation;
pub use op::Summary;
pub use record::IdentityKey;
pub use record::Record;
pub use transform::InMemory;
pub use transform::Options;
pub use transform::Processor;
pub use transform::Reconciler;
pub use transform::Transformer;
pub use transform::reconcile;
