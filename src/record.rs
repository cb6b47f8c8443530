//! Directory records and their positional row encoding.
//!
//! A record is one person in a directory snapshot. On the wire it is a
//! positional row:
//!
//! ```text
//! [display name?, identity key, phone?, assistants csv?, ...extra]
//! ```
//!
//! Identity keys are case-insensitive. `IdentityKey` folds case when it is
//! built, so every key the engine ever compares is already canonical.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::de::SeqAccess;
use serde::de::Visitor;
use serde::ser::SerializeSeq;
use serde_json::Value;
use smallvec::SmallVec;

/// A canonical (lower-cased) identity key, such as an email address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Canonicalize a raw key.
    pub fn new(raw: &str) -> IdentityKey {
        return IdentityKey(raw.to_lowercase());
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl From<&str> for IdentityKey {
    fn from(raw: &str) -> IdentityKey {
        return IdentityKey::new(raw);
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "IdentityKey({})", self.0);
    }
}

/// Ordered assistant references. Most people have zero to two assistants.
pub type AssistantRefs = SmallVec<[IdentityKey; 2]>;

/// Split a comma-joined assistant list.
///
/// Entries are trimmed and empty entries dropped. Returns `None` when nothing
/// is left, since an empty list and an absent list mean the same thing.
pub fn parse_assistants(csv: &str) -> Option<AssistantRefs> {
    let refs: AssistantRefs = csv
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(IdentityKey::new)
        .collect();
    if refs.is_empty() {
        return None;
    }
    return Some(refs);
}

/// Join assistant references back into their comma-joined form.
pub fn join_assistants(refs: &[IdentityKey]) -> String {
    return refs
        .iter()
        .map(IdentityKey::as_str)
        .collect::<Vec<_>>()
        .join(",");
}

/// One directory entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Display name. A null name cell stays `None` and is distinct from `""`.
    pub name: Option<String>,
    pub key: IdentityKey,
    pub phone: Option<String>,
    /// `None` means "leave the relationship alone". Never `Some` of an empty list.
    pub assistants: Option<AssistantRefs>,
    /// Opaque trailing cells, passed through untouched and never compared.
    pub extra: Vec<Value>,
}

impl Record {
    /// Create a record with only a name and identity key.
    pub fn new(name: impl Into<String>, key: &str) -> Record {
        return Record {
            name: Some(name.into()),
            key: IdentityKey::new(key),
            phone: None,
            assistants: None,
            extra: Vec::new(),
        };
    }

    /// Clear the display name, as a row with a null name cell decodes.
    pub fn without_name(mut self) -> Record {
        self.name = None;
        return self;
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Record {
        self.phone = Some(phone.into());
        return self;
    }

    /// Set assistants from their comma-joined form.
    pub fn with_assistants(mut self, csv: &str) -> Record {
        self.assistants = parse_assistants(csv);
        return self;
    }

    pub fn with_extra(mut self, value: impl Into<Value>) -> Record {
        self.extra.push(value.into());
        return self;
    }

    /// The comma-joined assistant list, if any.
    pub fn assistants_csv(&self) -> Option<String> {
        return self.assistants.as_deref().map(join_assistants);
    }

    /// True if the records agree on name, key and phone.
    pub fn same_contact(&self, other: &Record) -> bool {
        return self.name == other.name && self.key == other.key && self.phone == other.phone;
    }

    /// True if the records agree on every compared field. Extra cells are ignored.
    pub fn same_entry(&self, other: &Record) -> bool {
        return self.same_contact(other) && self.assistants == other.assistants;
    }

    /// Does this record list `key` among its assistants?
    pub fn refers_to(&self, key: &IdentityKey) -> bool {
        return self
            .assistants
            .as_ref()
            .is_some_and(|refs| refs.contains(key));
    }

    /// Keep only the assistants matching `keep`, unsetting the list if it empties.
    pub fn retain_assistants<F>(&mut self, mut keep: F)
    where
        F: FnMut(&IdentityKey) -> bool,
    {
        if let Some(refs) = self.assistants.as_mut() {
            refs.retain(|key| keep(key));
            if refs.is_empty() {
                self.assistants = None;
            }
        }
    }

    /// Remove every reference to `key`. Returns true if anything was removed.
    pub fn detach(&mut self, key: &IdentityKey) -> bool {
        let had = self.refers_to(key);
        self.retain_assistants(|other| other != key);
        return had;
    }

    /// Number of cells in the wire row.
    pub(crate) fn cell_count(&self) -> usize {
        return 4 + self.extra.len();
    }

    /// Write the wire cells into an open sequence.
    pub(crate) fn serialize_cells<S: SerializeSeq>(&self, seq: &mut S) -> Result<(), S::Error> {
        seq.serialize_element(&self.name)?;
        seq.serialize_element(self.key.as_str())?;
        seq.serialize_element(&self.phone)?;
        seq.serialize_element(&self.assistants_csv())?;
        for value in &self.extra {
            seq.serialize_element(value)?;
        }
        return Ok(());
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cell_count()))?;
        self.serialize_cells(&mut seq)?;
        return seq.end();
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str("a row of [name, identity key, phone, assistants, ...extra]");
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Record, A::Error> {
        let name = seq.next_element::<Option<String>>()?.flatten();
        let Some(key) = seq.next_element::<Option<String>>()?.flatten() else {
            return Err(de::Error::custom("missing identity key"));
        };
        let phone = seq.next_element::<Option<String>>()?.flatten();
        let assistants = seq
            .next_element::<Option<String>>()?
            .flatten()
            .and_then(|csv| parse_assistants(&csv));

        let mut extra = Vec::new();
        while let Some(value) = seq.next_element::<Value>()? {
            extra.push(value);
        }

        return Ok(Record {
            name,
            key: IdentityKey::new(&key),
            phone,
            assistants,
            extra,
        });
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Record, D::Error> {
        return deserializer.deserialize_seq(RowVisitor);
    }
}
