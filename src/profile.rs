//! De-identification profiles: named, ordered lists of per-tag rules.
//!
//! Profiles are loaded from a JSON catalog document:
//!
//! ```json
//! {
//!   "profiles": {
//!     "default": [
//!       { "tag": "(0010,0010)", "action": "remove" },
//!       { "tag": "(0010,0020)", "action": "hash_persistent" },
//!       { "tag": "(0008,0050)", "action": "replace", "value": "ANON" }
//!     ]
//!   }
//! }
//! ```
//!
//! The core applies a resolved [`Profile`]; how the catalog is stored and
//! named is the caller's concern.

use crate::tag::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile {0:?} not found")]
    NotFound(String),

    #[error("invalid profile catalog: {0}")]
    InvalidCatalog(#[from] serde_json::Error),
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

/// The action to perform on the data element a rule targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Leave the element untouched. This is also the implicit behaviour for
    /// any tag no rule targets.
    Keep,

    /// Delete the element from the dataset.
    Remove,

    /// Replace the element value with the VR-appropriate empty value; the
    /// tag and VR remain present.
    Empty,

    /// Replace the element value with a literal, re-encoded per the
    /// element's VR.
    Replace { value: String },

    /// Replace the element value with the unsalted SHA-256 hex digest of its
    /// current textual value.
    ///
    /// Hashing reads the then-current value, so applying this action twice
    /// digests the first digest's hex text. That makes `hash` the one
    /// non-idempotent action; it is intended behaviour, not a defect.
    Hash,

    /// Like [`Action::Hash`], but salted with the process-wide persistent
    /// secret, so the same input yields the same digest across runs and
    /// deployments sharing that secret.
    HashPersistent,
}

/// One profile entry: the tag to act on and the action to take.
///
/// A tag listed in a profile but absent from a given dataset is a silent
/// no-op. When two rules target the same tag, the later one wins, reading
/// whatever value the earlier one left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub tag: Tag,

    #[serde(flatten)]
    pub action: Action,

    /// Free-text annotation in catalog files, typically the tag alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Rule {
    pub fn new(tag: Tag, action: Action) -> Self {
        Self {
            tag,
            action,
            comment: None,
        }
    }
}

/// A named, ordered list of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl Profile {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

/// All profiles of one catalog document, keyed by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Vec<Rule>>,
}

impl ProfileCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Resolve a profile by name. Unknown and empty names are rejected; a
    /// missing profile never silently degrades to "no rules".
    pub fn get(&self, name: &str) -> Result<Profile> {
        if name.is_empty() {
            return Err(ProfileError::NotFound(name.into()));
        }
        match self.profiles.get(name) {
            Some(rules) => Ok(Profile::new(name, rules.clone())),
            None => Err(ProfileError::NotFound(name.into())),
        }
    }
}
