use thiserror::Error;

/// Errors raised while tokenizing a pattern. Each variant carries the column
/// of the offending character in the original pattern text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unmatched ) at column {0}")]
    UnmatchedParen(usize),

    #[error("unterminated group opened at column {0}")]
    UnterminatedGroup(usize),

    #[error("unterminated character class opened at column {0}")]
    UnterminatedClass(usize),

    #[error("invalid group, {} after '?' at column {at}", found_text(.found))]
    InvalidGroup { found: Option<char>, at: usize },

    #[error("nothing to repeat at column {0}")]
    NothingToRepeat(usize),

    #[error("too many nested groups at column {0}")]
    NestingTooDeep(usize),
}

/// Structural errors: the normalizer was handed a tree that the tokenizer
/// could not have produced. Not user-recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("nested set where a character or range was required")]
    NestedSet,

    #[error("set element is not a character, range or set")]
    InvalidSetElement,
}

fn found_text(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("character '{c}'"),
        None => "end of input".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
