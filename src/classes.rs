//! The four built-in shorthand character classes. Pure data: every call
//! builds a fresh token list, so callers may mutate freely.

use crate::ast::{Set, Token};

/// Fixed recognition order used by the normalizer: word characters, digits,
/// any-character, whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassId {
    Words,
    Digits,
    AnyChar,
    Whitespace,
}

impl ClassId {
    pub const ALL: [ClassId; 4] = [
        ClassId::Words,
        ClassId::Digits,
        ClassId::AnyChar,
        ClassId::Whitespace,
    ];

    /// The canonical element list for this class, in the provider's order.
    pub fn elements(self) -> Vec<Token> {
        match self {
            ClassId::Words => word_elements(),
            ClassId::Digits => digit_elements(),
            ClassId::AnyChar => any_char_elements(),
            ClassId::Whitespace => whitespace_elements(),
        }
    }
}

/// `\d`: one range, 0-9.
pub fn digit_elements() -> Vec<Token> {
    vec![Token::Range { from: 48, to: 57 }]
}

/// `\w`: underscore, a-z, A-Z, 0-9. Four elements.
pub fn word_elements() -> Vec<Token> {
    vec![
        Token::Char(95),
        Token::Range { from: 97, to: 122 },
        Token::Range { from: 65, to: 90 },
        Token::Range { from: 48, to: 57 },
    ]
}

/// `\s`: fifteen elements, ASCII whitespace plus the Unicode space points.
pub fn whitespace_elements() -> Vec<Token> {
    vec![
        Token::Char(9),
        Token::Char(10),
        Token::Char(11),
        Token::Char(12),
        Token::Char(13),
        Token::Char(32),
        Token::Char(160),
        Token::Char(5760),
        Token::Range {
            from: 8192,
            to: 8202,
        },
        Token::Char(8232),
        Token::Char(8233),
        Token::Char(8239),
        Token::Char(8287),
        Token::Char(12288),
        Token::Char(65279),
    ]
}

/// `.`: a single range holding only the newline; the set carrying it is
/// always negated.
pub fn any_char_elements() -> Vec<Token> {
    vec![Token::Range { from: 10, to: 10 }]
}

pub fn digits() -> Token {
    class_set(ClassId::Digits, false)
}

pub fn not_digits() -> Token {
    class_set(ClassId::Digits, true)
}

pub fn words() -> Token {
    class_set(ClassId::Words, false)
}

pub fn not_words() -> Token {
    class_set(ClassId::Words, true)
}

pub fn whitespace() -> Token {
    class_set(ClassId::Whitespace, false)
}

pub fn not_whitespace() -> Token {
    class_set(ClassId::Whitespace, true)
}

/// The `.` token: any character except newline.
pub fn any_char() -> Token {
    class_set(ClassId::AnyChar, true)
}

pub fn class_set(id: ClassId, negated: bool) -> Token {
    Token::Set(Set {
        elements: id.elements(),
        negated,
    })
}
