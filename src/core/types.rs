use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Slash separated path of member names from the root type down, e.g. `PersonForm/MainBox/NameField`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberPath(Vec<String>);

impl MemberPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Last segment (the member's own name)
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// First segment (the top-level type)
    pub fn root_name(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// True if `self` equals `other` or lies below it
    pub fn starts_with(&self, other: &MemberPath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }

    /// Same path with the last segment replaced
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        if let Some(last) = segments.last_mut() {
            *last = name.into();
        }
        Self(segments)
    }

    /// Re-root this path from `from` onto `to` (used when a subtree moves)
    pub fn rebase(&self, from: &MemberPath, to: &MemberPath) -> Option<Self> {
        if !self.starts_with(from) {
            return None;
        }
        let mut segments = to.0.clone();
        segments.extend_from_slice(&self.0[from.0.len()..]);
        Some(Self(segments))
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for MemberPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(format!("empty member path: {:?}", s));
        }
        Ok(Self(segments))
    }
}

/// Floating point order key; strictly increasing with a member's position among its siblings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderKey(pub f64);

impl OrderKey {
    pub fn value(self) -> f64 {
        self.0
    }

    /// Rank based key: `rank * step` (rank starts at 1)
    pub fn nth(rank: usize, step: f64) -> Self {
        Self(rank as f64 * step)
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for OrderKey {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map(OrderKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_path_roundtrip() {
        let path: MemberPath = "PersonForm/MainBox/NameField".parse().unwrap();
        assert_eq!(path.name(), "NameField");
        assert_eq!(path.root_name(), "PersonForm");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "PersonForm/MainBox/NameField");
        assert_eq!(path.parent().unwrap().to_string(), "PersonForm/MainBox");
        assert!("".parse::<MemberPath>().is_err());
    }

    #[test]
    fn test_member_path_rebase() {
        let path: MemberPath = "Form/Box/Inner/Field".parse().unwrap();
        let from: MemberPath = "Form/Box/Inner".parse().unwrap();
        let to: MemberPath = "Form/Other/Inner".parse().unwrap();
        assert_eq!(
            path.rebase(&from, &to).unwrap().to_string(),
            "Form/Other/Inner/Field"
        );
        assert!(to.rebase(&from, &to).is_none());
    }

    #[test]
    fn test_order_key_format() {
        assert_eq!(OrderKey(10.0).to_string(), "10.0");
        assert_eq!(OrderKey(15.5).to_string(), "15.5");
        assert_eq!("20".parse::<OrderKey>().unwrap(), OrderKey(20.0));
        assert_eq!(OrderKey::nth(3, 10.0), OrderKey(30.0));
    }
}
