//! Reconciling a baseline directory into a target directory.
//!
//! ```
//! use directory_diff::Options;
//! use directory_diff::Record;
//! use directory_diff::reconcile;
//!
//! let baseline = vec![Record::new("Kamal", "kamal@envoy.com")];
//! let target = vec![Record::new("Kamal", "Kamal@envoy.com").with_phone("555")];
//!
//! let ops = reconcile(baseline).into(target, &Options::default()).unwrap();
//! assert_eq!(ops.len(), 1);
//! ```
//!
//! The work is done by a [`Transformer`]. [`InMemory`] is built in; an engine
//! backed by a database for very large snapshots can be plugged in through
//! [`Processor::External`] as long as it honors the same contract: the same
//! operation kinds and at most one operation per identity.

mod in_memory;
mod resolve;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::directory::Directory;
use crate::error::Error;
use crate::error::Result;
use crate::op::Operation;
use crate::record::Record;

pub use in_memory::InMemory;

/// Something that turns a baseline and a target directory into operations.
pub trait Transformer: Send + Sync {
    /// A short name used in logs and errors.
    fn name(&self) -> &str;

    fn transform(&self, baseline: Directory, target: Directory, options: &Options) -> Result<Vec<Operation>>;
}

/// Which transformer runs a reconciliation.
#[derive(Clone, Default)]
pub enum Processor {
    #[default]
    InMemory,
    /// A caller-supplied engine.
    External(Arc<dyn Transformer>),
}

impl Processor {
    fn transformer(&self) -> &dyn Transformer {
        return match self {
            Processor::InMemory => &InMemory,
            Processor::External(transformer) => transformer.as_ref(),
        };
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Processor::InMemory => f.write_str("InMemory"),
            Processor::External(transformer) => write!(f, "External({})", transformer.name()),
        };
    }
}

impl FromStr for Processor {
    type Err = Error;

    fn from_str(name: &str) -> Result<Processor> {
        return match name {
            "in_memory" | "in-memory" => Ok(Processor::InMemory),
            other => Err(Error::UnknownProcessor(other.to_string())),
        };
    }
}

/// Options for one reconciliation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(try_from = "RawOptions")]
pub struct Options {
    /// Do not emit noop operations. Resolution still happens.
    pub skip_noop: bool,
    pub processor: Processor,
}

/// Options as written in JSON, before the processor name is looked up.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawOptions {
    skip_noop: bool,
    processor: Option<String>,
}

impl TryFrom<RawOptions> for Options {
    type Error = Error;

    fn try_from(raw: RawOptions) -> Result<Options> {
        let processor = match raw.processor {
            Some(name) => name.parse()?,
            None => Processor::default(),
        };
        return Ok(Options {
            skip_noop: raw.skip_noop,
            processor,
        });
    }
}

impl Options {
    /// Parse options from JSON, e.g. `{"skip_noop": true}`.
    ///
    /// An unknown processor name is reported as
    /// [`Error::UnknownProcessor`], anything else that does not parse as
    /// [`Error::Json`].
    pub fn from_json(json: &str) -> Result<Options> {
        let raw: RawOptions = serde_json::from_str(json)?;
        return Options::try_from(raw);
    }

    pub fn skip_noop(mut self, skip_noop: bool) -> Options {
        self.skip_noop = skip_noop;
        return self;
    }

    pub fn processor(mut self, processor: Processor) -> Options {
        self.processor = processor;
        return self;
    }
}

/// A baseline directory waiting for its target.
#[derive(Clone, Debug)]
pub struct Reconciler {
    baseline: Directory,
}

/// Start a reconciliation from `baseline`.
pub fn reconcile<I>(baseline: I) -> Reconciler
where
    I: IntoIterator<Item = Record>,
{
    return Reconciler {
        baseline: baseline.into_iter().collect(),
    };
}

impl Reconciler {
    pub fn baseline(&self) -> &Directory {
        return &self.baseline;
    }

    /// Reconcile into `target`, returning operations in the order they should
    /// be applied.
    pub fn into<I>(self, target: I, options: &Options) -> Result<Vec<Operation>>
    where
        I: IntoIterator<Item = Record>,
    {
        let target: Directory = target.into_iter().collect();
        let transformer = options.processor.transformer();
        tracing::debug!(
            processor = transformer.name(),
            baseline = self.baseline.len(),
            target = target.len(),
            skip_noop = options.skip_noop,
            "reconciling directories"
        );
        return transformer.transform(self.baseline, target, options);
    }
}
