//! Labels and label matchers
//!
//! A [`Labels`] value is the canonical label set of one series: sorted by
//! name with unique names. [`Matcher`] is a predicate over one label's value.
//! A label that is absent from a set behaves as if its value were empty, so
//! `name != ""` selects exactly the sets carrying a non-empty `name`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A (name, value) string pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

impl Label {
    /// Create a label
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Label {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Canonical label set: sorted by name, names unique
///
/// Built from an ordered sequence of pairs with [`Labels::from_pairs`], which
/// keeps the *first* occurrence of each name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Label>", into = "Vec<Label>")]
pub struct Labels {
    inner: SmallVec<[Label; 8]>,
}

impl Labels {
    /// Empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalise an ordered sequence of labels
    ///
    /// Later labels whose name was already seen are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        let mut inner: SmallVec<[Label; 8]> = SmallVec::new();
        for label in pairs {
            if inner.iter().any(|l| l.name == label.name) {
                continue;
            }
            inner.push(label);
        }
        inner.sort_by(|a, b| a.name.cmp(&b.name));
        Labels { inner }
    }

    /// Value of `name`, or `""` when absent
    pub fn get(&self, name: &str) -> &str {
        self.inner
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .map(|idx| self.inner[idx].value.as_str())
            .unwrap_or("")
    }

    /// Whether a label with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .is_ok()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate labels in name order
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.inner.iter()
    }

    /// Whether every matcher accepts this set
    pub fn matches_all(&self, matchers: &[Matcher]) -> bool {
        matchers.iter().all(|m| m.matches(self.get(&m.name)))
    }
}

impl From<Vec<Label>> for Labels {
    fn from(labels: Vec<Label>) -> Self {
        Labels::from_pairs(labels)
    }
}

impl From<Labels> for Vec<Label> {
    fn from(labels: Labels) -> Self {
        labels.inner.into_vec()
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, l) in self.inner.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", l.name, l.value)?;
        }
        write!(f, "}}")
    }
}

/// How a matcher compares a label value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    /// Value must equal
    Equal,
    /// Value must differ
    NotEqual,
}

/// Predicate over a single label's value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matcher {
    /// Comparison kind
    pub match_type: MatchType,
    /// Label name
    pub name: String,
    /// Operand
    pub value: String,
}

impl Matcher {
    /// `name == value`
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Matcher {
            match_type: MatchType::Equal,
            name: name.into(),
            value: value.into(),
        }
    }

    /// `name != value`
    pub fn not_equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Matcher {
            match_type: MatchType::NotEqual,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether a label value (empty when absent) satisfies the matcher
    pub fn matches(&self, value: &str) -> bool {
        match self.match_type {
            MatchType::Equal => value == self.value,
            MatchType::NotEqual => value != self.value,
        }
    }

    /// Whether an absent label satisfies the matcher
    pub fn matches_empty(&self) -> bool {
        self.matches("")
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.match_type {
            MatchType::Equal => "=",
            MatchType::NotEqual => "!=",
        };
        write!(f, "{}{}{:?}", self.name, op, self.value)
    }
}
