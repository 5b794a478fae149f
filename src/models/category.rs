//! Question categories used to stratify accuracy.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Official LoCoMo category labels.
pub const CATEGORY_LABELS: &[(i64, &str)] = &[
    (1, "Single-hop (Factual)"),
    (2, "Temporal"),
    (3, "Multi-hop"),
    (4, "Commonsense"),
    (5, "Adversarial"),
];

/// Category identifier attached to each benchmark question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl CategoryId {
    /// Returns the human-readable label, or `Unknown(<id>)` for unmapped ids.
    #[must_use]
    pub fn label(self) -> Cow<'static, str> {
        label_for(self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CategoryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Maps a category id to its label.
#[must_use]
pub fn label_for(category: i64) -> Cow<'static, str> {
    CATEGORY_LABELS
        .iter()
        .find(|(id, _)| *id == category)
        .map_or_else(
            || Cow::Owned(format!("Unknown({category})")),
            |(_, label)| Cow::Borrowed(*label),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, "Single-hop (Factual)")]
    #[test_case(2, "Temporal")]
    #[test_case(3, "Multi-hop")]
    #[test_case(4, "Commonsense")]
    #[test_case(5, "Adversarial")]
    #[test_case(0, "Unknown(0)")]
    #[test_case(9, "Unknown(9)")]
    #[test_case(-1, "Unknown(-1)")]
    fn test_label_for(id: i64, expected: &str) {
        assert_eq!(label_for(id), expected);
        assert_eq!(CategoryId(id).label(), expected);
    }
}
