//! Parse a regular-expression pattern into a syntax tree, normalize its
//! character classes into a minimal canonical form, and write a tree back
//! out as minimal pattern text. This is a transformation library; it never
//! matches a pattern against input text.

pub mod ast;
pub mod classes;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod writer;

pub use ast::Root;
pub use error::{Error, ParseError, TreeError};
pub use normalize::normalize;
pub use writer::write;

/// Tokenize a pattern into a tree rooted at a single `Root` node.
pub fn tokenize(pattern: &str) -> Result<Root, ParseError> {
    parser::Parser::new(pattern).parse()
}

/// Tokenize a pattern, attaching `flags` to the root verbatim. Flags are
/// never validated.
pub fn tokenize_with_flags(pattern: &str, flags: &str) -> Result<Root, ParseError> {
    parser::Parser::new(pattern).parse_with_flags(flags)
}

/// The whole pipeline: tokenize, normalize the sets, and write the result
/// back out as canonical pattern text.
pub fn canonicalize(pattern: &str) -> Result<String, Error> {
    let mut root = tokenize(pattern)?;
    normalize(&mut root)?;
    Ok(write(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_patterns_round_trip() {
        for pattern in [
            "abc",
            "a|b|c",
            "(a|b)c?",
            r"\w\d\s\W\D\S.",
            "[a-c]",
            "[^a-c]",
            "(?=a)(?!b)(?:c)",
            "a{2,3}b{4,}c{5}",
            r"^a$",
            r"\ba\B",
            r"(a)\1",
            "a?+",
        ] {
            let root = tokenize(pattern).expect("pattern must parse");
            assert_eq!(write(&root), pattern, "round trip failed for {pattern}");
        }
    }

    #[test]
    fn canonicalize_merges_ranges() {
        assert_eq!(canonicalize("[a-cb-d]").expect("valid pattern"), "[a-d]");
        assert_eq!(canonicalize("[abc]").expect("valid pattern"), "[a-c]");
        assert_eq!(canonicalize("[z-a]").expect("valid pattern"), "[]");
    }

    #[test]
    fn canonicalize_keeps_empty_set_polarity() {
        // [^] matches every character; dropping the flag would invert it.
        assert_eq!(canonicalize("[^]").expect("valid pattern"), "[^]");
        assert_eq!(canonicalize("[^z-a]").expect("valid pattern"), "[^]");
        assert_eq!(canonicalize("[]").expect("valid pattern"), "[]");
    }

    #[test]
    fn recognized_newline_class_round_trips_with_residue() {
        assert_eq!(canonicalize("[^\na]").expect("valid pattern"), "[^\na]");
    }

    #[test]
    fn canonicalize_recognizes_named_classes() {
        assert_eq!(canonicalize("[0-9]").expect("valid pattern"), r"\d");
        assert_eq!(canonicalize("[^0-9]").expect("valid pattern"), r"\D");
        assert_eq!(canonicalize("[0-9a-z_A-Z]").expect("valid pattern"), r"\w");
        assert_eq!(canonicalize(r"[a\W]").expect("valid pattern"), r"[a\W]");
    }

    #[test]
    fn canonicalize_is_stable_on_shorthands() {
        for pattern in [r"\d", r"\D", r"\w", r"\W", r"\s", r"\S", "."] {
            assert_eq!(canonicalize(pattern).expect("valid pattern"), pattern);
        }
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for pattern in ["[aygh]", "[x-ya-b]", r"[a-c\d-]", "(a|[0-9b-d])+"] {
            let once = canonicalize(pattern).expect("valid pattern");
            let twice = canonicalize(&once).expect("canonical output must parse");
            assert_eq!(twice, once, "not idempotent for {pattern}");
        }
    }

    #[test]
    fn canonicalize_reports_parse_errors() {
        assert_eq!(
            canonicalize("(").expect_err("unterminated"),
            Error::Parse(ParseError::UnterminatedGroup(0))
        );
    }

    #[test]
    fn flags_ride_along_unvalidated() {
        let root = tokenize_with_flags("a", "gimzzz").expect("valid pattern");
        assert_eq!(root.flags, "gimzzz");
        // The writer never emits flags.
        assert_eq!(write(&root), "a");
    }
}
