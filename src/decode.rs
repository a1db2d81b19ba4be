//! Turns raw pattern text into the logical character stream the tokenizer
//! scans. Escapes with a fixed character value (`\n`, `\t`, `\xHH`, `\uHHHH`,
//! `\cX`) are resolved here; structural escapes (`\w`, `\b`, digits, and any
//! other escaped character) pass through as a backslash + character pair for
//! the tokenizer to interpret.

/// The decoded stream plus, for each logical character, the column of the
/// character in the original pattern that produced it. Error reporting maps
/// logical positions back through `columns`.
#[derive(Debug)]
pub struct Decoded {
    pub chars: Vec<char>,
    pub columns: Vec<usize>,
}

impl Decoded {
    /// Column in the original pattern for logical index `i`. Indexes past the
    /// end report the pattern length, for errors at end of input.
    pub fn column(&self, i: usize) -> usize {
        match self.columns.get(i) {
            Some(col) => *col,
            None => self.columns.last().map_or(0, |col| col + 1),
        }
    }
}

pub fn decode(pattern: &str) -> Decoded {
    let raw: Vec<char> = pattern.chars().collect();
    let mut chars = Vec::with_capacity(raw.len());
    let mut columns = Vec::with_capacity(raw.len());
    let mut i = 0;

    let mut push = |c: char, col: usize| {
        chars.push(c);
        columns.push(col);
    };

    while i < raw.len() {
        let c = raw[i];
        if c != '\\' {
            push(c, i);
            i += 1;
            continue;
        }
        // Lone backslash at end of input stays as-is.
        let Some(&next) = raw.get(i + 1) else {
            push('\\', i);
            i += 1;
            continue;
        };
        match next {
            'n' => {
                push('\n', i);
                i += 2;
            }
            'r' => {
                push('\r', i);
                i += 2;
            }
            't' => {
                push('\t', i);
                i += 2;
            }
            'v' => {
                push('\u{b}', i);
                i += 2;
            }
            'f' => {
                push('\u{c}', i);
                i += 2;
            }
            'c' => {
                // Control escape: \cM is carriage return, etc.
                match raw.get(i + 2) {
                    Some(&ctrl) if ctrl.is_ascii() => {
                        let code = (ctrl as u32) % 32;
                        // The code is < 32, always a valid char.
                        if let Some(decoded) = char::from_u32(code) {
                            push(decoded, i);
                        }
                        i += 3;
                    }
                    _ => {
                        push('\\', i);
                        push('c', i + 1);
                        i += 2;
                    }
                }
            }
            'x' => match hex_char(&raw, i + 2, 2) {
                Some(decoded) => {
                    push(decoded, i);
                    i += 4;
                }
                None => {
                    push('\\', i);
                    push('x', i + 1);
                    i += 2;
                }
            },
            'u' => match hex_char(&raw, i + 2, 4) {
                Some(decoded) => {
                    push(decoded, i);
                    i += 6;
                }
                None => {
                    push('\\', i);
                    push('u', i + 1);
                    i += 2;
                }
            },
            // Everything else is left for the tokenizer: \w \b \1 \\ \$ ...
            _ => {
                push('\\', i);
                push(next, i + 1);
                i += 2;
            }
        }
    }

    Decoded { chars, columns }
}

// Reads `len` hex digits at `at` and returns the character they encode.
fn hex_char(raw: &[char], at: usize, len: usize) -> Option<char> {
    let digits = raw.get(at..at + len)?;
    let mut code: u32 = 0;
    for d in digits {
        code = code * 16 + d.to_digit(16)?;
    }
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(pattern: &str) -> Vec<char> {
        decode(pattern).chars
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(chars("abc"), vec!['a', 'b', 'c']);
    }

    #[test]
    fn control_escapes_are_resolved() {
        assert_eq!(chars(r"a\nb"), vec!['a', '\n', 'b']);
        assert_eq!(chars(r"\t\r"), vec!['\t', '\r']);
        assert_eq!(chars(r"\v\f"), vec!['\u{b}', '\u{c}']);
        assert_eq!(chars(r"\cM"), vec!['\r']);
    }

    #[test]
    fn hex_and_unicode_escapes() {
        assert_eq!(chars(r"\x41"), vec!['A']);
        assert_eq!(chars("\\u0041"), vec!['A']);
        assert_eq!(chars("\\u00e9"), vec!['é']);
    }

    #[test]
    fn malformed_hex_passes_through() {
        assert_eq!(chars(r"\xg1"), vec!['\\', 'x', 'g', '1']);
        assert_eq!(chars(r"\u12"), vec!['\\', 'u', '1', '2']);
    }

    #[test]
    fn structural_escapes_pass_through() {
        assert_eq!(chars(r"\w"), vec!['\\', 'w']);
        assert_eq!(chars(r"\b"), vec!['\\', 'b']);
        assert_eq!(chars(r"\1"), vec!['\\', '1']);
        assert_eq!(chars(r"\\"), vec!['\\', '\\']);
    }

    #[test]
    fn lone_trailing_backslash() {
        assert_eq!(chars("a\\"), vec!['a', '\\']);
    }

    #[test]
    fn columns_map_back_to_the_original() {
        let decoded = decode(r"a\x41b");
        assert_eq!(decoded.chars, vec!['a', 'A', 'b']);
        assert_eq!(decoded.columns, vec![0, 1, 5]);
        assert_eq!(decoded.column(2), 5);
        assert_eq!(decoded.column(3), 6);
    }
}
