//! Error type shared by the compiler and the state machine.
//!
//! Compile-time errors (`Parse`, `Stratification`, `UngroundedVariable`,
//! `InvalidDescription`, `GroundingLimit`) abort building a `Game`.
//! Runtime errors are reported per call and never leave a `State` modified.

use thiserror::Error;

/// Errors emitted while compiling a game description or querying a state.
#[derive(Debug, Error)]
pub enum Error {
    /// The description text is not well-formed.
    #[error("parse error at byte {offset}: {message} (near `{fragment}`)")]
    Parse {
        /// What went wrong.
        message: String,
        /// The offending piece of source text.
        fragment: String,
        /// Byte offset of the fragment in the source.
        offset: usize,
    },

    /// A predicate depends on its own negation through recursion.
    #[error("unstratifiable negation: `{predicate}` negates `{negated}` inside a recursive cycle")]
    Stratification {
        /// The predicate whose body holds the negation.
        predicate: String,
        /// The negated predicate.
        negated: String,
    },

    /// A rule variable is not bound by any positive body literal.
    #[error("variable ?{variable} is not bound by a positive literal in rule `{rule}`")]
    UngroundedVariable {
        /// Variable name without the leading `?`.
        variable: String,
        /// The rule head, rendered as text.
        rule: String,
    },

    /// The description parses but cannot describe a playable game.
    #[error("invalid game description: {0}")]
    InvalidDescription(String),

    /// Grounding produced more rule instances than the configured limit.
    #[error("grounding exceeded the limit of {limit} rule instances")]
    GroundingLimit {
        /// The configured `max_ground_rules`.
        limit: usize,
    },

    /// A role has no legal move; the game is malformed.
    #[error("role `{role}` has no legal move in this state")]
    IllegalState {
        /// Name of the role without moves.
        role: String,
    },

    /// A joint move is incomplete, duplicated or contains an illegal move.
    #[error("illegal joint move: {0}")]
    IllegalMove(String),

    /// Zero or several distinct goal values are derivable for a role.
    #[error("goal for role `{role}` is undefined (derived scores: {scores:?})")]
    GoalUndefined {
        /// Name of the role.
        role: String,
        /// The distinct scores that were derived.
        scores: Vec<i64>,
    },

    /// A portable snapshot mentions a fact the game cannot represent.
    #[error("fact `{0}` is not a base fact of this game")]
    UnknownFact(String),

    /// A portable snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    /// Reading a description from disk failed.
    #[error("failed to read game description: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a parse error from a source slice starting at `offset`.
    pub(crate) fn parse(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let rest = source.get(offset..).unwrap_or("");
        let fragment: String = rest
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        Error::Parse {
            message: message.into(),
            fragment,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_fragment_is_truncated() {
        let source = "(role x)\n(<= (foo ?x) (bar ?x) (baz ?x) (qux ?x) (quux ?x) (corge ?x))";
        let err = Error::parse("boom", source, 9);
        match err {
            Error::Parse { fragment, offset, .. } => {
                assert_eq!(offset, 9);
                assert_eq!(fragment.chars().count(), 40);
                assert!(fragment.starts_with("(<= (foo"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = Error::IllegalState { role: "white".into() };
        assert_eq!(err.to_string(), "role `white` has no legal move in this state");

        let err = Error::GoalUndefined { role: "black".into(), scores: vec![0, 100] };
        assert!(err.to_string().contains("[0, 100]"));
    }
}
