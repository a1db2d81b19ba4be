/// A parsed pattern: the token body plus the flags string attached verbatim
/// by the caller. Flags are never validated or interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub body: Body,
    pub flags: String,
}

/// The contents of a `Root` or `Group`: a single token sequence, or an
/// ordered list of alternative sequences once an alternation operator has
/// appeared. The first alternative listed is tried first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Sequence(Vec<Token>),
    Alternatives(Vec<Vec<Token>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Group(Group),
    Repetition(Repetition),
    Position(Anchor),
    Reference(u32),
    Char(u32),
    Range { from: u32, to: u32 },
    Set(Set),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub body: Body,
    pub capturing: bool,
    pub lookahead: Option<Lookahead>,
}

/// Wraps exactly one child token. `max` of `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    pub min: u32,
    pub max: Option<u32>,
    pub token: Box<Token>,
}

/// A character class: an ordered list of Char/Range/Set elements. Nested sets
/// occur syntactically (named classes inside `[...]`) and are flattened by the
/// normalizer before any set algebra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    pub elements: Vec<Token>,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
    WordBoundary,
    NonWordBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    Positive,
    Negative,
}
