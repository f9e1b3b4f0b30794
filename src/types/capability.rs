use std::fmt;

use serde::{Deserialize, Serialize};

/// GlobalCapability is a bitmask over the closed set of system-wide actions.
///
/// The name↔bit mapping lives in [`GlobalCapability::TABLE`]; nothing else may
/// enumerate the set. Adding a capability is one new entry in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalCapability(u32);

impl GlobalCapability {
    pub const CREATE_SPACE: GlobalCapability = GlobalCapability(1 << 0);

    /// Central definition of the global capability set.
    pub const TABLE: &'static [(&'static str, GlobalCapability)] =
        &[("create_space", Self::CREATE_SPACE)];

    /// Every capability granted (the immutable "admin" row template).
    #[must_use]
    pub fn all() -> Self {
        Self::TABLE
            .iter()
            .fold(Self::default(), |acc, (_, c)| acc.union(*c))
    }

    #[must_use]
    pub const fn has(self, required: GlobalCapability) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: GlobalCapability) -> GlobalCapability {
        GlobalCapability(self.0 | other.0)
    }

    pub fn parse(s: &str) -> Option<GlobalCapability> {
        Self::TABLE
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, c)| *c)
    }

    /// Builds a bitmask from (name, granted) pairs, as submitted by the
    /// ACL update endpoints. Unknown names are rejected.
    pub fn from_pairs<'a, I>(pairs: I) -> Option<GlobalCapability>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut result = GlobalCapability::default();
        for (name, granted) in pairs {
            let cap = Self::parse(name)?;
            if granted {
                result = result.union(cap);
            }
        }
        Some(result)
    }

    /// Expands the bitmask into the full (name, granted) map, covering every
    /// capability in the set.
    #[must_use]
    pub fn to_pairs(self) -> Vec<(&'static str, bool)> {
        Self::TABLE
            .iter()
            .map(|(name, c)| (*name, self.has(*c)))
            .collect()
    }
}

impl fmt::Display for GlobalCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let granted: Vec<&str> = self
            .to_pairs()
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
        write!(f, "{}", granted.join(", "))
    }
}

impl From<i64> for GlobalCapability {
    fn from(bits: i64) -> Self {
        Self(bits as u32)
    }
}

impl From<GlobalCapability> for i64 {
    fn from(c: GlobalCapability) -> Self {
        c.0 as i64
    }
}

/// SpaceCapability is a bitmask over the closed set of per-space actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceCapability(u32);

impl SpaceCapability {
    pub const JOIN_SPACE: SpaceCapability = SpaceCapability(1 << 0);
    pub const READ_TIMELINE: SpaceCapability = SpaceCapability(1 << 1);
    pub const POST: SpaceCapability = SpaceCapability(1 << 2);
    pub const COMMENT: SpaceCapability = SpaceCapability(1 << 3);
    pub const READ_WIKI: SpaceCapability = SpaceCapability(1 << 4);
    pub const WRITE_WIKI: SpaceCapability = SpaceCapability(1 << 5);
    pub const READ_FILES: SpaceCapability = SpaceCapability(1 << 6);
    pub const WRITE_FILES: SpaceCapability = SpaceCapability(1 << 7);

    /// Central definition of the per-space capability set.
    pub const TABLE: &'static [(&'static str, SpaceCapability)] = &[
        ("join_space", Self::JOIN_SPACE),
        ("read_timeline", Self::READ_TIMELINE),
        ("post", Self::POST),
        ("comment", Self::COMMENT),
        ("read_wiki", Self::READ_WIKI),
        ("write_wiki", Self::WRITE_WIKI),
        ("read_files", Self::READ_FILES),
        ("write_files", Self::WRITE_FILES),
    ];

    #[must_use]
    pub fn all() -> Self {
        Self::TABLE
            .iter()
            .fold(Self::default(), |acc, (_, c)| acc.union(*c))
    }

    #[must_use]
    pub const fn has(self, required: SpaceCapability) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: SpaceCapability) -> SpaceCapability {
        SpaceCapability(self.0 | other.0)
    }

    pub fn parse(s: &str) -> Option<SpaceCapability> {
        Self::TABLE
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, c)| *c)
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Option<SpaceCapability>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut result = SpaceCapability::default();
        for (name, granted) in pairs {
            let cap = Self::parse(name)?;
            if granted {
                result = result.union(cap);
            }
        }
        Some(result)
    }

    #[must_use]
    pub fn to_pairs(self) -> Vec<(&'static str, bool)> {
        Self::TABLE
            .iter()
            .map(|(name, c)| (*name, self.has(*c)))
            .collect()
    }
}

impl fmt::Display for SpaceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let granted: Vec<&str> = self
            .to_pairs()
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
        write!(f, "{}", granted.join(", "))
    }
}

impl From<i64> for SpaceCapability {
    fn from(bits: i64) -> Self {
        Self(bits as u32)
    }
}

impl From<SpaceCapability> for i64 {
    fn from(c: SpaceCapability) -> Self {
        c.0 as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_capability_has() {
        let c = SpaceCapability::POST.union(SpaceCapability::COMMENT);
        assert!(c.has(SpaceCapability::POST));
        assert!(c.has(SpaceCapability::COMMENT));
        assert!(!c.has(SpaceCapability::WRITE_FILES));
    }

    #[test]
    fn test_all_covers_table() {
        let all = SpaceCapability::all();
        for (_, cap) in SpaceCapability::TABLE {
            assert!(all.has(*cap));
        }
        assert!(GlobalCapability::all().has(GlobalCapability::CREATE_SPACE));
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            SpaceCapability::parse("read_timeline"),
            Some(SpaceCapability::READ_TIMELINE)
        );
        assert_eq!(SpaceCapability::parse("nope"), None);
        assert_eq!(
            GlobalCapability::parse("create_space"),
            Some(GlobalCapability::CREATE_SPACE)
        );
    }

    #[test]
    fn test_from_pairs_rejects_unknown() {
        assert!(SpaceCapability::from_pairs([("post", true), ("bogus", true)]).is_none());
        let c = SpaceCapability::from_pairs([("post", true), ("comment", false)]).unwrap();
        assert!(c.has(SpaceCapability::POST));
        assert!(!c.has(SpaceCapability::COMMENT));
    }

    #[test]
    fn test_to_pairs_round_trip() {
        let c = SpaceCapability::JOIN_SPACE.union(SpaceCapability::READ_FILES);
        let back = SpaceCapability::from_pairs(c.to_pairs()).unwrap();
        assert_eq!(c, back);
    }
}
