//! Rule-driven transformation of parsed datasets.

use crate::dataset::Dataset;
use crate::element::Value;
use crate::hashing::{Hasher, Sha256Hasher};
use crate::profile::{Action, Profile, Rule};
use crate::tag::Tag;
use crate::vr::VR;
use log::warn;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

static IS_REGEX: OnceLock<Regex> = OnceLock::new();
static DS_REGEX: OnceLock<Regex> = OnceLock::new();
static UI_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("rule for tag {tag} could not be applied: {reason}")]
    RuleApplication { tag: Tag, reason: String },
}

pub type Result<T, E = ApplyError> = std::result::Result<T, E>;

/// Applies the rules of a [`Profile`] to a [`Dataset`], in profile order.
///
/// A rule whose tag is absent from the dataset is a silent no-op; later
/// rules read whatever value earlier rules left behind. An element no rule
/// names is passed through unchanged.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    hasher: Sha256Hasher,
    persistent_hasher: Sha256Hasher,
}

impl RuleEngine {
    /// Create an engine whose `hash_persistent` action is salted with
    /// `secret`. With an empty secret, `hash_persistent` degenerates to
    /// plain `hash`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            hasher: Sha256Hasher::new(),
            persistent_hasher: Sha256Hasher::with_salt(secret),
        }
    }

    pub fn apply(&self, dataset: &mut Dataset, profile: &Profile) -> Result<()> {
        for rule in &profile.rules {
            self.apply_rule(dataset, rule)?;
        }
        Ok(())
    }

    fn apply_rule(&self, dataset: &mut Dataset, rule: &Rule) -> Result<()> {
        if !dataset.contains(rule.tag) {
            return Ok(());
        }
        match &rule.action {
            Action::Keep => {}
            Action::Remove => {
                dataset.remove(rule.tag);
            }
            Action::Empty => {
                if let Some(elem) = dataset.get_mut(rule.tag) {
                    elem.set_value(empty_value(elem.vr()));
                }
            }
            Action::Replace { value } => {
                if let Some(elem) = dataset.get_mut(rule.tag) {
                    let encoded = encode_literal(elem.vr(), value).map_err(|reason| {
                        ApplyError::RuleApplication {
                            tag: rule.tag,
                            reason,
                        }
                    })?;
                    elem.set_value(encoded);
                }
            }
            Action::Hash => hash_in_place(dataset, rule.tag, &self.hasher),
            Action::HashPersistent => hash_in_place(dataset, rule.tag, &self.persistent_hasher),
        }
        Ok(())
    }
}

fn hash_in_place(dataset: &mut Dataset, tag: Tag, hasher: &Sha256Hasher) {
    if let Some(elem) = dataset.get_mut(tag) {
        match elem.string_value() {
            Some(text) => elem.set_string(&hasher.hash(&text)),
            // sequences have no textual value to digest
            None => warn!("did not hash sequence element {tag}"),
        }
    }
}

fn empty_value(vr: VR) -> Value {
    match vr {
        VR::SQ => Value::Sequence(Vec::new()),
        _ => Value::Primitive(Vec::new()),
    }
}

/// Re-encode a replacement literal per the target element's VR.
///
/// Binary numeric VRs parse the literal and emit little-endian bytes; the
/// validated string VRs (`IS`, `DS`, `UI`) keep the literal as text after a
/// shape check; other-byte VRs take the literal as a hex string. Plain text
/// VRs accept any literal as-is.
fn encode_literal(vr: VR, literal: &str) -> std::result::Result<Value, String> {
    let bytes = match vr {
        VR::SQ => return Err("cannot replace a sequence with a literal".into()),
        VR::US => parse_number::<u16>(vr, literal)?.to_le_bytes().to_vec(),
        VR::UL => parse_number::<u32>(vr, literal)?.to_le_bytes().to_vec(),
        VR::SS => parse_number::<i16>(vr, literal)?.to_le_bytes().to_vec(),
        VR::SL => parse_number::<i32>(vr, literal)?.to_le_bytes().to_vec(),
        VR::FL => parse_number::<f32>(vr, literal)?.to_le_bytes().to_vec(),
        VR::FD => parse_number::<f64>(vr, literal)?.to_le_bytes().to_vec(),
        VR::AT => {
            let tag = Tag::from_str(literal)
                .map_err(|_| format!("{literal:?} is not a valid tag literal"))?;
            let mut bytes = tag.group().to_le_bytes().to_vec();
            bytes.extend_from_slice(&tag.element().to_le_bytes());
            bytes
        }
        VR::IS => {
            let regex = IS_REGEX.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
            if !regex.is_match(literal) || literal.trim_start_matches('+').parse::<i32>().is_err() {
                return Err(format!("{literal:?} is not a valid integer string"));
            }
            literal.as_bytes().to_vec()
        }
        VR::DS => {
            let regex = DS_REGEX.get_or_init(|| {
                Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap()
            });
            if !regex.is_match(literal) {
                return Err(format!("{literal:?} is not a valid decimal string"));
            }
            literal.as_bytes().to_vec()
        }
        VR::UI => {
            // dot-separated numeric components, no leading zeros
            let regex = UI_REGEX
                .get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").unwrap());
            if literal.len() > 64 || !regex.is_match(literal) {
                return Err(format!("{literal:?} is not a valid UID"));
            }
            literal.as_bytes().to_vec()
        }
        VR::OB | VR::OW | VR::OL | VR::OD | VR::OF | VR::UN => hex::decode(literal)
            .map_err(|_| format!("{literal:?} is not a valid hex string for VR {vr}"))?,
        _ => literal.as_bytes().to_vec(),
    };
    Ok(Value::Primitive(bytes))
}

fn parse_number<T: FromStr>(vr: VR, literal: &str) -> std::result::Result<T, String> {
    literal
        .parse::<T>()
        .map_err(|_| format!("{literal:?} is not a valid value for VR {vr}"))
}
