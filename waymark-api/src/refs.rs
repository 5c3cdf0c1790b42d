//! Parsing of batch request token lists.
//!
//! A batch request names elements as a comma-separated token list where
//! each token is either a bare id (`1001`, the current version) or an id
//! with an explicit version separated by a literal `v` (`1005v1`). The
//! grammar is a wire-compatibility requirement. Parsing happens before
//! any store access; a malformed token fails the whole request.

use std::str::FromStr;

use thiserror::Error;
use waymark_core::VersionRef;

/// Errors raised while parsing a batch token list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefListError {
    /// The list contained no tokens.
    #[error("element list is empty")]
    Empty,
    /// A token was neither a bare id nor an `idvVERSION` pair.
    #[error("malformed element reference {token:?}")]
    MalformedToken {
        /// The offending token.
        token: String,
    },
}

/// The parsed shape of a batch request: bare ids wanting the current
/// version plus explicit `(id, version)` pairs.
///
/// Both sets are de-duplicated independently, first occurrence wins, so
/// the completeness check downstream can compare row count against token
/// count exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRefs {
    /// Ids requested at their current version, in first-seen order.
    pub current: Vec<i64>,
    /// Explicitly versioned references, in first-seen order.
    pub versioned: Vec<VersionRef>,
}

impl ElementRefs {
    /// Total number of distinct requested tokens.
    pub fn len(&self) -> usize {
        self.current.len() + self.versioned.len()
    }

    /// Whether no tokens were requested.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.versioned.is_empty()
    }

    fn push_current(&mut self, id: i64) {
        if !self.current.contains(&id) {
            self.current.push(id);
        }
    }

    fn push_versioned(&mut self, vref: VersionRef) {
        if !self.versioned.contains(&vref) {
            self.versioned.push(vref);
        }
    }
}

impl FromStr for ElementRefs {
    type Err = RefListError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(RefListError::Empty);
        }

        let mut refs = Self::default();
        for token in raw.split(',') {
            let token = token.trim();
            if let Ok(id) = token.parse::<i64>() {
                refs.push_current(id);
                continue;
            }
            let Some((id_part, version_part)) = token.split_once('v') else {
                return Err(RefListError::MalformedToken {
                    token: token.to_owned(),
                });
            };
            let (Ok(id), Ok(version)) = (id_part.parse::<i64>(), version_part.parse::<i64>())
            else {
                return Err(RefListError::MalformedToken {
                    token: token.to_owned(),
                });
            };
            refs.push_versioned(VersionRef::new(id, version));
        }
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_mixed_token_list() {
        let refs: ElementRefs = "1001,1002,1003,1005v1".parse().expect("parse");
        assert_eq!(refs.current, vec![1001, 1002, 1003]);
        assert_eq!(refs.versioned, vec![VersionRef::new(1005, 1)]);
        assert_eq!(refs.len(), 4);
    }

    #[rstest]
    fn deduplicates_first_seen_wins() {
        let refs: ElementRefs = "7,8,7,9v2,9v2,9v3".parse().expect("parse");
        assert_eq!(refs.current, vec![7, 8]);
        assert_eq!(
            refs.versioned,
            vec![VersionRef::new(9, 2), VersionRef::new(9, 3)]
        );
    }

    #[rstest]
    fn same_id_may_appear_bare_and_versioned() {
        let refs: ElementRefs = "5,5v1".parse().expect("parse");
        assert_eq!(refs.current, vec![5]);
        assert_eq!(refs.versioned, vec![VersionRef::new(5, 1)]);
        assert_eq!(refs.len(), 2);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_empty_input(#[case] raw: &str) {
        assert_eq!(raw.parse::<ElementRefs>(), Err(RefListError::Empty));
    }

    #[rstest]
    #[case("12x4")]
    #[case("v1")]
    #[case("12v")]
    #[case("1,two,3")]
    #[case("1005V1")]
    fn rejects_malformed_tokens(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<ElementRefs>(),
            Err(RefListError::MalformedToken { .. })
        ));
    }
}
