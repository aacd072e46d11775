use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A DICOM data element tag: a (group, element) pair of unsigned 16-bit integers.
///
/// Tags are totally ordered by (group, element) and uniquely identify an element
/// within one dataset scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u16, pub u16);

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{0} is not a valid tag")]
pub struct TagParseError(String);

impl Tag {
    #[inline]
    pub fn group(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn element(self) -> u16 {
        self.1
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:#06X}, {:#06X})", self.0, self.1)
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl FromStr for Tag {
    type Err = TagParseError;

    /// Parses `(GGGG,EEEE)`, `GGGG,EEEE` and `GGGGEEEE` forms, hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);

        let (group, element) = match inner.split_once(',') {
            Some((g, e)) => (g.trim(), e.trim()),
            None if inner.len() == 8 => inner.split_at(4),
            None => return Err(TagParseError(s.into())),
        };

        if group.len() != 4 || element.len() != 4 {
            return Err(TagParseError(s.into()));
        }

        let group = u16::from_str_radix(group, 16).map_err(|_| TagParseError(s.into()))?;
        let element = u16::from_str_radix(element, 16).map_err(|_| TagParseError(s.into()))?;
        Ok(Tag(group, element))
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Tag(0x0008, 0x0018) < Tag(0x0010, 0x0010));
        assert!(Tag(0x0010, 0x0010) < Tag(0x0010, 0x0020));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Tag(0x0010, 0x0020)), "(0010,0020)");
        assert_eq!(format!("{}", Tag(0x7FE0, 0x0010)), "(7FE0,0010)");
    }

    #[test]
    fn test_parse_parenthesized() {
        let tag: Tag = "(0010,0020)".parse().unwrap();
        assert_eq!(tag, Tag(0x0010, 0x0020));
    }

    #[test]
    fn test_parse_with_comma() {
        let tag: Tag = "0008,0018".parse().unwrap();
        assert_eq!(tag, Tag(0x0008, 0x0018));
    }

    #[test]
    fn test_parse_compact() {
        let tag: Tag = "00100010".parse().unwrap();
        assert_eq!(tag, Tag(0x0010, 0x0010));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("(0010)".parse::<Tag>().is_err());
        assert!("001000".parse::<Tag>().is_err());
        assert!("(00GG,0010)".parse::<Tag>().is_err());
        assert!("".parse::<Tag>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let tag = Tag(0x0012, 0x0062);
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"(0012,0062)\"");
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}
