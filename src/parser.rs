use std::mem;

use crate::ast::{Anchor, Body, Group, Lookahead, Repetition, Root, Set, Token};
use crate::classes;
use crate::decode::{decode, Decoded};
use crate::error::ParseError;

/// Group nesting deeper than this is rejected up front. The tokenizer itself
/// is iterative, but the normalizer and writer recurse over tree depth, so
/// the bound has to be enforced where the tree is built.
const NEST_LIMIT: usize = 250;

/// Tokenizer for regular expressions.
///
/// The `Parser` struct holds the decoded character stream, the cursor, the
/// frame currently being appended to, and the stack of enclosing frames.
/// All state is local to one `parse` call.
pub struct Parser {
    decoded: Decoded,
    pos: usize,
    frame: Frame,
    stack: Vec<Frame>,
}

/// One group (or the root) under construction: the sequence currently being
/// appended to, plus the alternatives completed so far once a `|` has split
/// this frame.
struct Frame {
    kind: FrameKind,
    alternatives: Vec<Vec<Token>>,
    split: bool,
    sequence: Vec<Token>,
}

enum FrameKind {
    Root,
    Group {
        capturing: bool,
        lookahead: Option<Lookahead>,
        opened_at: usize,
    },
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            alternatives: Vec::new(),
            split: false,
            sequence: Vec::new(),
        }
    }

    fn push(&mut self, token: Token) {
        self.sequence.push(token);
    }

    fn finish(mut self) -> (FrameKind, Body) {
        let body = if self.split {
            self.alternatives.push(self.sequence);
            Body::Alternatives(self.alternatives)
        } else {
            Body::Sequence(self.sequence)
        };
        (self.kind, body)
    }
}

impl Parser {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &str) -> Self {
        Self {
            decoded: decode(pattern),
            pos: 0,
            frame: Frame::new(FrameKind::Root),
            stack: Vec::new(),
        }
    }

    /// Peek at the next logical character without advancing.
    fn peek(&self) -> Option<char> {
        self.decoded.chars.get(self.pos).copied()
    }

    /// Advance the parser by one logical character and return it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Column in the original pattern for logical index `i`.
    fn column(&self, i: usize) -> usize {
        self.decoded.column(i)
    }

    /// Parse the pattern into a `Root` with an empty flags string.
    pub fn parse(self) -> Result<Root, ParseError> {
        self.parse_with_flags("")
    }

    /// Parse the pattern, attaching `flags` to the root verbatim.
    ///
    /// Examples:
    /// - Pattern: `a|b` → Alternatives([[Char a], [Char b]])
    /// - Pattern: `a?+` → Repetition(1,∞, Repetition(0,1, Char a))
    pub fn parse_with_flags(mut self, flags: &str) -> Result<Root, ParseError> {
        while let Some(c) = self.advance() {
            let at = self.pos - 1;
            match c {
                '\\' => self.parse_escape()?,
                '^' => self.frame.push(Token::Position(Anchor::Start)),
                '$' => self.frame.push(Token::Position(Anchor::End)),
                '[' => self.parse_char_class(at)?,
                '.' => self.frame.push(classes::any_char()),
                '(' => self.open_group(at)?,
                ')' => self.close_group(at)?,
                '|' => {
                    // First `|` in this frame turns the single sequence into
                    // the alternatives list; each `|` starts a fresh sequence.
                    self.frame.split = true;
                    let done = mem::take(&mut self.frame.sequence);
                    self.frame.alternatives.push(done);
                }
                '?' => self.apply_repeat(0, Some(1), at)?,
                '+' => self.apply_repeat(1, None, at)?,
                '*' => self.apply_repeat(0, None, at)?,
                '{' => self.parse_brace(at)?,
                // Default is a character that is not `\[](){}?+*^$`.
                _ => self.frame.push(Token::Char(c as u32)),
            }
        }

        // Check that every group has been closed.
        let (kind, body) = self.frame.finish();
        if let FrameKind::Group { opened_at, .. } = kind {
            return Err(ParseError::UnterminatedGroup(self.decoded.column(opened_at)));
        }
        Ok(Root {
            body,
            flags: flags.to_owned(),
        })
    }

    /// Parse the character after a structural `\`: positions, named classes,
    /// back-references, or an escaped literal.
    ///
    /// Examples:
    /// - Pattern: `\b` → Position(WordBoundary)
    /// - Pattern: `\d` → the digits Set
    /// - Pattern: `\1` → Reference(1)
    /// - Pattern: `\$` → Char('$')
    fn parse_escape(&mut self) -> Result<(), ParseError> {
        let Some(c) = self.advance() else {
            // Trailing backslash: a literal one.
            self.frame.push(Token::Char(92));
            return Ok(());
        };
        let token = match c {
            'b' => Token::Position(Anchor::WordBoundary),
            'B' => Token::Position(Anchor::NonWordBoundary),
            'w' => classes::words(),
            'W' => classes::not_words(),
            'd' => classes::digits(),
            'D' => classes::not_digits(),
            's' => classes::whitespace(),
            'S' => classes::not_whitespace(),
            _ => match c.to_digit(10) {
                Some(n) => Token::Reference(n),
                None => Token::Char(c as u32),
            },
        };
        self.frame.push(token);
        Ok(())
    }

    /// Open a group at `(`, reading the `?=` / `?!` / `?:` modifier if
    /// present, and make it the current frame.
    fn open_group(&mut self, at: usize) -> Result<(), ParseError> {
        let mut capturing = true;
        let mut lookahead = None;
        if self.peek() == Some('?') {
            self.advance();
            // The modifier character is required; running out of input here
            // is a bad group, not merely an unclosed one.
            let Some(kind) = self.advance() else {
                return Err(ParseError::InvalidGroup {
                    found: None,
                    at: self.column(self.pos),
                });
            };
            match kind {
                '=' => lookahead = Some(Lookahead::Positive),
                '!' => lookahead = Some(Lookahead::Negative),
                ':' => {}
                found => {
                    return Err(ParseError::InvalidGroup {
                        found: Some(found),
                        at: self.column(self.pos - 1),
                    })
                }
            }
            capturing = false;
        }
        if self.stack.len() >= NEST_LIMIT {
            return Err(ParseError::NestingTooDeep(self.column(at)));
        }
        let frame = Frame::new(FrameKind::Group {
            capturing,
            lookahead,
            opened_at: at,
        });
        self.stack.push(mem::replace(&mut self.frame, frame));
        Ok(())
    }

    /// Close the current group at `)` and append it to the enclosing frame.
    fn close_group(&mut self, at: usize) -> Result<(), ParseError> {
        let Some(parent) = self.stack.pop() else {
            return Err(ParseError::UnmatchedParen(self.column(at)));
        };
        let closed = mem::replace(&mut self.frame, parent);
        match closed.finish() {
            (
                FrameKind::Group {
                    capturing,
                    lookahead,
                    ..
                },
                body,
            ) => {
                self.frame.push(Token::Group(Group {
                    body,
                    capturing,
                    lookahead,
                }));
                Ok(())
            }
            (FrameKind::Root, _) => unreachable!("the root frame is never stacked behind a group"),
        }
    }

    /// Pop the most recent token and wrap it as a Repetition. Repetitions
    /// stack: each application re-wraps the previous one.
    fn apply_repeat(&mut self, min: u32, max: Option<u32>, at: usize) -> Result<(), ParseError> {
        let Some(token) = self.frame.sequence.pop() else {
            return Err(ParseError::NothingToRepeat(self.column(at)));
        };
        self.frame.push(Token::Repetition(Repetition {
            min,
            max,
            token: Box::new(token),
        }));
        Ok(())
    }

    /// Handle `{`: a valid `{m}`, `{m,}` or `{m,n}` quantifier, otherwise a
    /// literal brace character.
    fn parse_brace(&mut self, at: usize) -> Result<(), ParseError> {
        match self.scan_brace_quantifier() {
            Some((min, max, consumed)) => {
                self.pos += consumed;
                self.apply_repeat(min, max, at)
            }
            None => {
                self.frame.push(Token::Char(123));
                Ok(())
            }
        }
    }

    /// Scan `m[,[n]]}` after a `{`, returning the bounds and the number of
    /// characters consumed. `None` means the brace is not a quantifier.
    fn scan_brace_quantifier(&self) -> Option<(u32, Option<u32>, usize)> {
        let chars = self.decoded.chars.get(self.pos..)?;
        let mut j = 0;
        let min = scan_number(chars, &mut j)?;
        match chars.get(j)? {
            '}' => Some((min, Some(min), j + 1)),
            ',' => {
                j += 1;
                let max = scan_number(chars, &mut j);
                if chars.get(j) == Some(&'}') {
                    Some((min, max, j + 1))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a character class body after `[`, e.g. `[a-c]`, `[^abc]` or
    /// `[\d\-]`. The opening bracket has already been consumed; `at` is its
    /// logical position.
    ///
    /// Examples:
    /// - Pattern: `[a-c]`  → Set { elements: [Range a-c], negated: false }
    /// - Pattern: `[^a\d]` → Set { elements: [Char a, digits Set], negated: true }
    fn parse_char_class(&mut self, at: usize) -> Result<(), ParseError> {
        let negated = if self.peek() == Some('^') {
            self.advance();
            true
        } else {
            false
        };
        let mut elements = Vec::new();
        loop {
            let Some(c) = self.advance() else {
                return Err(ParseError::UnterminatedClass(self.column(at)));
            };
            if c == ']' {
                break;
            }
            let element = self.parse_class_atom(c);
            // A literal char followed by `-` and another atom forms a range;
            // a `-` before the closing bracket stays literal.
            if let Token::Char(from) = element {
                let dash = self.peek() == Some('-');
                let upper = self.decoded.chars.get(self.pos + 1).copied();
                if dash && upper.is_some() && upper != Some(']') {
                    self.advance();
                    let Some(c2) = self.advance() else {
                        return Err(ParseError::UnterminatedClass(self.column(at)));
                    };
                    match self.parse_class_atom(c2) {
                        Token::Char(to) => elements.push(Token::Range { from, to }),
                        // `a-\d` is not a range: keep the pieces literal.
                        other => {
                            elements.push(Token::Char(from));
                            elements.push(Token::Char(45));
                            elements.push(other);
                        }
                    }
                    continue;
                }
            }
            elements.push(element);
        }
        self.frame.push(Token::Set(Set { elements, negated }));
        Ok(())
    }

    /// One class element: a named class, a class-local escape, or a literal.
    fn parse_class_atom(&mut self, c: char) -> Token {
        if c != '\\' {
            return Token::Char(c as u32);
        }
        let Some(escaped) = self.advance() else {
            return Token::Char(92);
        };
        match escaped {
            'd' => classes::digits(),
            'D' => classes::not_digits(),
            'w' => classes::words(),
            'W' => classes::not_words(),
            's' => classes::whitespace(),
            'S' => classes::not_whitespace(),
            // Inside a class, `\b` is the backspace character.
            'b' => Token::Char(8),
            other => Token::Char(other as u32),
        }
    }
}

/// Scan a decimal number at `*j`, advancing past it. `None` if there are no
/// digits or the value overflows.
fn scan_number(chars: &[char], j: &mut usize) -> Option<u32> {
    let start = *j;
    let mut value: u32 = 0;
    while let Some(d) = chars.get(*j).and_then(|c| c.to_digit(10)) {
        value = value.checked_mul(10)?.checked_add(d)?;
        *j += 1;
    }
    (*j > start).then_some(value)
}
