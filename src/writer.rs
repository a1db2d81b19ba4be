//! Canonical serialization: the inverse of the tokenizer. The writer only
//! reads the tree; it assumes the tree is well formed and performs no
//! validation.

use crate::ast::{Anchor, Body, Lookahead, Root, Set, Token};
use crate::classes::{any_char_elements, digit_elements, whitespace_elements, word_elements};

/// Render a tree as canonical pattern text, with no enclosing delimiters and
/// no flags.
pub fn write(root: &Root) -> String {
    let mut out = String::new();
    write_body(&root.body, &mut out);
    out
}

fn write_body(body: &Body, out: &mut String) {
    match body {
        Body::Sequence(tokens) => write_tokens(tokens, out),
        Body::Alternatives(alternatives) => {
            for (i, tokens) in alternatives.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                write_tokens(tokens, out);
            }
        }
    }
}

fn write_tokens(tokens: &[Token], out: &mut String) {
    for token in tokens {
        write_token(token, out);
    }
}

fn write_token(token: &Token, out: &mut String) {
    match token {
        Token::Group(group) => {
            out.push('(');
            match group.lookahead {
                Some(Lookahead::Positive) => out.push_str("?="),
                Some(Lookahead::Negative) => out.push_str("?!"),
                None => {
                    if !group.capturing {
                        out.push_str("?:");
                    }
                }
            }
            write_body(&group.body, out);
            out.push(')');
        }
        Token::Repetition(repetition) => {
            write_token(&repetition.token, out);
            match (repetition.min, repetition.max) {
                (0, Some(1)) => out.push('?'),
                (1, None) => out.push('+'),
                (0, None) => out.push('*'),
                (min, None) => out.push_str(&format!("{{{min},}}")),
                (min, Some(max)) if min == max => out.push_str(&format!("{{{min}}}")),
                (min, Some(max)) => out.push_str(&format!("{{{min},{max}}}")),
            }
        }
        Token::Position(anchor) => out.push_str(match anchor {
            Anchor::Start => "^",
            Anchor::End => "$",
            Anchor::WordBoundary => "\\b",
            Anchor::NonWordBoundary => "\\B",
        }),
        Token::Reference(n) => {
            out.push('\\');
            out.push_str(&n.to_string());
        }
        Token::Char(value) => push_char(*value, out),
        // A bare range outside a set only occurs in hand-built trees.
        Token::Range { from, to } if from == to => push_set_char(*from, out),
        Token::Range { from, to } => {
            push_set_char(*from, out);
            out.push('-');
            push_set_char(*to, out);
        }
        Token::Set(set) => out.push_str(&write_set_tokens(set, false)),
    }
}

/// Render a set. Sets that exactly match a named class come out as the
/// shorthand escape; the any-character shorthand only applies when the set is
/// negated and not nested inside another set.
pub fn write_set_tokens(set: &Set, is_nested: bool) -> String {
    match set.elements.len() {
        1 => {
            if is_same_set(&set.elements, &digit_elements()) {
                return if set.negated { "\\D" } else { "\\d" }.to_owned();
            }
            if set.negated && !is_nested && is_same_set(&set.elements, &any_char_elements()) {
                return ".".to_owned();
            }
        }
        4 => {
            if is_same_set(&set.elements, &word_elements()) {
                return if set.negated { "\\W" } else { "\\w" }.to_owned();
            }
        }
        15 => {
            if is_same_set(&set.elements, &whitespace_elements()) {
                return if set.negated { "\\S" } else { "\\s" }.to_owned();
            }
        }
        _ => {}
    }

    let mut contents = String::new();
    if set.negated {
        contents.push('^');
    }
    for element in &set.elements {
        write_set_element(element, &mut contents);
    }
    if is_nested {
        contents
    } else {
        format!("[{contents}]")
    }
}

fn write_set_element(element: &Token, out: &mut String) {
    match element {
        Token::Char(value) => push_set_char(*value, out),
        // A single-width range is a character; no dash is ever emitted for it.
        Token::Range { from, to } if from == to => push_set_char(*from, out),
        Token::Range { from, to } => {
            push_set_char(*from, out);
            out.push('-');
            push_set_char(*to, out);
        }
        Token::Set(inner) => out.push_str(&write_set_tokens(inner, true)),
        // Behavior on a malformed tree is unspecified; skip quietly.
        _ => {}
    }
}

/// Exact structural match against a class definition: every element must
/// consume a distinct entry of the lookup, so duplicates and nested sets
/// fail. Lengths are checked by the caller.
fn is_same_set(elements: &[Token], class: &[Token]) -> bool {
    let mut remaining: Vec<&Token> = class.iter().collect();
    for element in elements {
        if matches!(element, Token::Set(_)) {
            return false;
        }
        match remaining.iter().position(|candidate| *candidate == element) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => return false,
        }
    }
    true
}

// Characters the tokenizer would interpret structurally at the top level.
fn push_char(value: u32, out: &mut String) {
    let c = char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER);
    if matches!(
        c,
        '^' | '$' | '\\' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | '{'
    ) {
        out.push('\\');
    }
    out.push(c);
}

// The set escape table: ^ \ ] - are always escaped inside brackets.
fn push_set_char(value: u32, out: &mut String) {
    let c = char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER);
    if matches!(c, '^' | '\\' | ']' | '-') {
        out.push('\\');
    }
    out.push(c);
}
