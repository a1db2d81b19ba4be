//! Set normalization: flattens nested sets, merges ranges into the minimal
//! sorted form, recognizes the named classes, and subtracts them so only
//! residual literal ranges remain.

use crate::ast::{Body, Root, Set, Token};
use crate::classes::{class_set, ClassId};
use crate::error::TreeError;

/// Normalize every Set node reachable from `root`, in place. Nothing else in
/// the tree is touched.
pub fn normalize(root: &mut Root) -> Result<(), TreeError> {
    normalize_body(&mut root.body)
}

fn normalize_body(body: &mut Body) -> Result<(), TreeError> {
    match body {
        Body::Sequence(tokens) => normalize_tokens(tokens),
        Body::Alternatives(alternatives) => {
            for tokens in alternatives {
                normalize_tokens(tokens)?;
            }
            Ok(())
        }
    }
}

fn normalize_tokens(tokens: &mut [Token]) -> Result<(), TreeError> {
    for token in tokens {
        normalize_token(token)?;
    }
    Ok(())
}

fn normalize_token(token: &mut Token) -> Result<(), TreeError> {
    match token {
        Token::Set(set) => *set = normalize_set(set)?,
        Token::Group(group) => normalize_body(&mut group.body)?,
        Token::Repetition(repetition) => normalize_token(&mut repetition.token)?,
        Token::Position(_) | Token::Reference(_) | Token::Char(_) | Token::Range { .. } => {}
    }
    Ok(())
}

/// Normalize one set: flatten, clean, recognize named classes, subtract them,
/// and rebuild the minimal stored form.
fn normalize_set(set: &Set) -> Result<Set, TreeError> {
    let (normal, not) = flatten(set)?;
    let normal = clean_set(normal)?;
    let not = clean_set(not)?;

    let normal_classes = recognize(&normal)?;
    let not_classes = recognize(&not)?;

    let normal = subtract_classes(&normal, &normal_classes)?;
    let not = subtract_classes(&not, &not_classes)?;

    Ok(rebuild(normal_classes, normal, not_classes, not, set.negated))
}

/// Flatten nested sets into two scalar lists. Each set contributes its direct
/// Char/Range children to the list matching its own negation flag; nested
/// sets are visited with the same two accumulators.
fn flatten(set: &Set) -> Result<(Vec<Token>, Vec<Token>), TreeError> {
    let mut normal = Vec::new();
    let mut not = Vec::new();
    let mut work = vec![set];
    while let Some(current) = work.pop() {
        for element in &current.elements {
            match element {
                Token::Set(inner) => work.push(inner),
                Token::Char(_) | Token::Range { .. } => {
                    if current.negated {
                        not.push(element.clone());
                    } else {
                        normal.push(element.clone());
                    }
                }
                _ => return Err(TreeError::InvalidSetElement),
            }
        }
    }
    Ok((normal, not))
}

/// Canonicalize a scalar element list: sorted by ascending minimum, with
/// overlapping or touching elements merged and single-value ranges collapsed
/// to chars. Shaped like a merge sort.
pub(crate) fn clean_set(mut elements: Vec<Token>) -> Result<Vec<Token>, TreeError> {
    match elements.len() {
        0 => Ok(elements),
        1 => {
            if let Token::Range { from, to } = elements[0] {
                // [z-a] matches nothing; [a-a] is just a char.
                if to < from {
                    return Ok(Vec::new());
                }
                if from == to {
                    return Ok(vec![Token::Char(from)]);
                }
            }
            min_val(&elements[0])?;
            Ok(elements)
        }
        len => {
            let right = elements.split_off(len.div_ceil(2));
            let left = clean_set(elements)?;
            let right = clean_set(right)?;
            merge(left, right)
        }
    }
}

/// Merge two cleaned lists by ascending minimum, absorbing any element that
/// overlaps or touches the running maximum.
fn merge(left: Vec<Token>, right: Vec<Token>) -> Result<Vec<Token>, TreeError> {
    let mut out: Vec<Token> = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => min_val(l)? <= min_val(r)?,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        let Some(next) = next else { break };

        let (next_min, next_max) = bounds(&next)?;
        if let Some(last) = out.last_mut() {
            let (last_min, last_max) = bounds(last)?;
            if next_min <= last_max.saturating_add(1) {
                if next_max > last_max {
                    *last = Token::Range {
                        from: last_min,
                        to: next_max,
                    };
                }
                continue;
            }
        }
        out.push(next);
    }
    Ok(out)
}

/// Which of the named classes are fully present in a cleaned list, in the
/// fixed recognition order. A class wholly contained in another recognized
/// class is dropped as redundant.
fn recognize(list: &[Token]) -> Result<Vec<ClassId>, TreeError> {
    let mut found = Vec::new();
    for id in ClassId::ALL {
        let def = clean_set(id.elements())?;
        let present = if id == ClassId::AnyChar {
            // Any-character is a single code point inside the whitespace run;
            // containment would recognize it in every whitespace superset, so
            // it has to appear as an exact element.
            def.first().is_some_and(|element| list.contains(element))
        } else {
            contains_all(list, &def)?
        };
        if present {
            found.push(id);
        }
    }
    prune_subsumed(found)
}

/// Lockstep scan: advance through the class definition whenever the current
/// list element fully contains the current class element. Cleaning can fuse
/// several class elements into one list element, so the inner cursor may
/// advance more than once per element.
fn contains_all(list: &[Token], def: &[Token]) -> Result<bool, TreeError> {
    let mut next = 0;
    for element in list {
        let (min, max) = bounds(element)?;
        while next < def.len() {
            let (def_min, def_max) = bounds(&def[next])?;
            if min <= def_min && max >= def_max {
                next += 1;
            } else {
                break;
            }
        }
    }
    Ok(next == def.len())
}

// Digits sit inside the word class; emitting both would not be minimal.
fn prune_subsumed(found: Vec<ClassId>) -> Result<Vec<ClassId>, TreeError> {
    let mut kept = Vec::with_capacity(found.len());
    for id in &found {
        let def = clean_set(id.elements())?;
        let mut subsumed = false;
        for other in &found {
            if other == id {
                continue;
            }
            let other_def = clean_set(other.elements())?;
            if contains_all(&other_def, &def)? {
                subsumed = true;
                break;
            }
        }
        if !subsumed {
            kept.push(*id);
        }
    }
    Ok(kept)
}

fn subtract_classes(list: &[Token], found: &[ClassId]) -> Result<Vec<Token>, TreeError> {
    if found.is_empty() {
        return Ok(list.to_vec());
    }
    let mut removals = Vec::with_capacity(found.len());
    for id in found {
        removals.push(clean_set(id.elements())?);
    }
    diff(list, &removals)
}

/// Subtract the union of the removal lists from `left`. All lists must be
/// cleaned ascending lists; one cursor per removal list walks it exactly once
/// across the whole scan.
pub(crate) fn diff(left: &[Token], remove: &[Vec<Token>]) -> Result<Vec<Token>, TreeError> {
    let mut cursors = vec![0usize; remove.len()];
    let mut out = Vec::new();
    for element in left {
        let (min, max) = bounds(element)?;

        // Every removal entry inside this element's bounds, from every list.
        let mut cuts: Vec<(u32, u32)> = Vec::new();
        for (list, cursor) in remove.iter().zip(cursors.iter_mut()) {
            while *cursor < list.len() {
                let (cut_min, cut_max) = bounds(&list[*cursor])?;
                if cut_min >= min && cut_max <= max {
                    cuts.push((cut_min, cut_max));
                    *cursor += 1;
                } else {
                    break;
                }
            }
        }
        cuts.sort_unstable();

        // Coalesce adjacent or overlapping cuts, then emit the gaps.
        let mut merged: Vec<(u32, u32)> = Vec::new();
        for (cut_min, cut_max) in cuts {
            if let Some(last) = merged.last_mut() {
                if cut_min <= last.1.saturating_add(1) {
                    if cut_max > last.1 {
                        last.1 = cut_max;
                    }
                    continue;
                }
            }
            merged.push((cut_min, cut_max));
        }

        let mut low = min;
        for (cut_min, cut_max) in merged {
            if cut_min > low {
                out.push(span(low, cut_min - 1));
            }
            low = cut_max.saturating_add(1);
        }
        if low <= max {
            out.push(span(low, max));
        }
    }
    Ok(out)
}

/// Rebuild the stored set. Recognized classes keep their canonical element
/// lists (so the writer can re-emit shorthands); a list that is exactly one
/// class collapses to the canonical class set itself. An entirely empty
/// result keeps the source polarity: `[^]` matches every character and must
/// not come back as `[]`.
fn rebuild(
    normal_classes: Vec<ClassId>,
    normal: Vec<Token>,
    not_classes: Vec<ClassId>,
    not: Vec<Token>,
    negated: bool,
) -> Set {
    if normal_classes.is_empty() && normal.is_empty() && not_classes.is_empty() && not.is_empty() {
        return Set {
            elements: Vec::new(),
            negated,
        };
    }

    let only = |classes: &[ClassId], residual: &[Token]| -> Option<ClassId> {
        if classes.len() == 1 && residual.is_empty() {
            Some(classes[0])
        } else {
            None
        }
    };

    if not_classes.is_empty() && not.is_empty() {
        if let Some(id) = only(&normal_classes, &normal) {
            return Set {
                elements: id.elements(),
                negated: false,
            };
        }
        let mut elements: Vec<Token> = normal_classes
            .into_iter()
            .map(|id| class_set(id, false))
            .collect();
        elements.extend(normal);
        return Set {
            elements,
            negated: false,
        };
    }

    if normal_classes.is_empty() && normal.is_empty() {
        if let Some(id) = only(&not_classes, &not) {
            return Set {
                elements: id.elements(),
                negated: true,
            };
        }
        let mut elements: Vec<Token> = not_classes
            .into_iter()
            .map(|id| class_set(id, false))
            .collect();
        elements.extend(not);
        return Set {
            elements,
            negated: true,
        };
    }

    // Mixed polarity: asserted parts stay at the top level, each negated
    // class becomes its own negated nested set, and any negated residue is
    // wrapped in one.
    let mut elements: Vec<Token> = normal_classes
        .into_iter()
        .map(|id| class_set(id, false))
        .collect();
    elements.extend(normal);
    elements.extend(not_classes.into_iter().map(|id| class_set(id, true)));
    if !not.is_empty() {
        elements.push(Token::Set(Set {
            elements: not,
            negated: true,
        }));
    }
    Set {
        elements,
        negated: false,
    }
}

fn span(from: u32, to: u32) -> Token {
    if from == to {
        Token::Char(from)
    } else {
        Token::Range { from, to }
    }
}

fn min_val(token: &Token) -> Result<u32, TreeError> {
    Ok(bounds(token)?.0)
}

/// Inclusive bounds of a scalar element. A Set here means the tree was never
/// flattened; anything else is not a set element at all.
fn bounds(token: &Token) -> Result<(u32, u32), TreeError> {
    match token {
        Token::Char(value) => Ok((*value, *value)),
        Token::Range { from, to } => Ok((*from, *to)),
        Token::Set(_) => Err(TreeError::NestedSet),
        _ => Err(TreeError::InvalidSetElement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes;

    fn chr(c: char) -> Token {
        Token::Char(c as u32)
    }

    fn range(from: char, to: char) -> Token {
        Token::Range {
            from: from as u32,
            to: to as u32,
        }
    }

    fn clean(elements: Vec<Token>) -> Vec<Token> {
        clean_set(elements).expect("scalars only")
    }

    #[test]
    fn clean_merges_overlapping_ranges() {
        assert_eq!(
            clean(vec![range('a', 'c'), range('b', 'd')]),
            vec![range('a', 'd')]
        );
    }

    #[test]
    fn clean_merges_adjacent_chars_into_a_range() {
        assert_eq!(
            clean(vec![chr('a'), chr('b'), chr('c')]),
            vec![range('a', 'c')]
        );
    }

    #[test]
    fn clean_sorts_by_minimum() {
        assert_eq!(
            clean(vec![range('x', 'y'), range('a', 'b'), chr('d')]),
            vec![range('a', 'b'), chr('d'), range('x', 'y')]
        );
    }

    #[test]
    fn clean_drops_inverted_ranges() {
        assert_eq!(clean(vec![range('z', 'a')]), vec![]);
        assert_eq!(clean(vec![range('z', 'a'), chr('q')]), vec![chr('q')]);
    }

    #[test]
    fn clean_collapses_single_value_ranges() {
        assert_eq!(clean(vec![range('a', 'a')]), vec![chr('a')]);
    }

    #[test]
    fn clean_is_idempotent() {
        let once = clean(vec![chr('y'), range('a', 'c'), chr('d'), chr('g')]);
        assert_eq!(clean(once.clone()), once);
    }

    #[test]
    fn clean_rejects_nested_sets() {
        let err = clean_set(vec![classes::digits(), chr('a')]).expect_err("sets are not scalars");
        assert_eq!(err, TreeError::NestedSet);
    }

    #[test]
    fn diff_splits_around_a_removal() {
        let result = diff(
            &[range('a', 'z')],
            &[vec![range('m', 'p')]],
        )
        .expect("cleaned input");
        assert_eq!(result, vec![range('a', 'l'), range('q', 'z')]);
    }

    #[test]
    fn diff_emits_single_width_gaps_as_chars() {
        let result = diff(&[range('a', 'e')], &[vec![range('b', 'd')]]).expect("cleaned input");
        assert_eq!(result, vec![chr('a'), chr('e')]);
    }

    #[test]
    fn diff_consumes_multiple_lists() {
        let left = vec![range('0', '9'), range('a', 'f')];
        let result = diff(
            &left,
            &[vec![range('0', '9')], vec![range('a', 'f')]],
        )
        .expect("cleaned input");
        assert_eq!(result, vec![]);
    }

    #[test]
    fn diff_collects_every_entry_in_bounds() {
        // Both cuts sit inside the one left element; missing either would
        // leave part of the class behind.
        let result = diff(
            &[range('a', 'z')],
            &[vec![chr('c'), chr('e')]],
        )
        .expect("cleaned input");
        assert_eq!(
            result,
            vec![range('a', 'b'), chr('d'), range('f', 'z')]
        );
    }

    #[test]
    fn word_class_is_recognized_with_empty_residue() {
        let cleaned = clean(classes::word_elements());
        let found = recognize(&cleaned).expect("scalars only");
        assert_eq!(found, vec![ClassId::Words]);
        let residue = subtract_classes(&cleaned, &found).expect("cleaned input");
        assert_eq!(residue, vec![]);
    }

    #[test]
    fn digit_subset_of_words_is_pruned() {
        let cleaned = clean(classes::word_elements());
        // Digits are contained in the word class; keeping both would emit a
        // redundant \d next to \w.
        assert_eq!(
            recognize(&cleaned).expect("scalars only"),
            vec![ClassId::Words]
        );
    }

    #[test]
    fn whitespace_survives_cleaning() {
        // Cleaning fuses 9..13 into one range; recognition still has to see
        // the full class.
        let cleaned = clean(classes::whitespace_elements());
        assert_eq!(
            recognize(&cleaned).expect("scalars only"),
            vec![ClassId::Whitespace]
        );
    }

    #[test]
    fn any_char_needs_an_exact_element() {
        let found = recognize(&[Token::Char(10)]).expect("scalars only");
        assert_eq!(found, vec![ClassId::AnyChar]);
        // Inside a wider run the newline is not the any-char class.
        let found = recognize(&[Token::Range { from: 9, to: 13 }]).expect("scalars only");
        assert_eq!(found, vec![]);
    }

    #[test]
    fn normalize_set_collapses_to_the_named_class() {
        let set = Set {
            elements: vec![
                range('0', '9'),
                chr('_'),
                range('A', 'Z'),
                range('a', 'z'),
            ],
            negated: false,
        };
        assert_eq!(
            normalize_set(&set).expect("well-formed set"),
            Set {
                elements: classes::word_elements(),
                negated: false,
            }
        );
    }

    #[test]
    fn normalize_set_keeps_residue_next_to_the_class() {
        let set = Set {
            elements: vec![classes::digits(), chr('-')],
            negated: false,
        };
        assert_eq!(
            normalize_set(&set).expect("well-formed set"),
            Set {
                elements: vec![classes::digits(), chr('-')],
                negated: false,
            }
        );
    }

    #[test]
    fn normalize_set_handles_mixed_polarity() {
        let set = Set {
            elements: vec![chr('a'), classes::not_words()],
            negated: false,
        };
        assert_eq!(
            normalize_set(&set).expect("well-formed set"),
            Set {
                elements: vec![chr('a'), classes::not_words()],
                negated: false,
            }
        );
    }

    #[test]
    fn empty_sets_keep_their_polarity() {
        let empty = Set {
            elements: vec![],
            negated: true,
        };
        assert_eq!(normalize_set(&empty).expect("well-formed set"), empty);
        // An inverted range cleans to nothing; the flag must still survive.
        let inverted = Set {
            elements: vec![range('z', 'a')],
            negated: true,
        };
        assert_eq!(
            normalize_set(&inverted).expect("well-formed set"),
            Set {
                elements: vec![],
                negated: true,
            }
        );
    }

    #[test]
    fn normalize_set_rejects_foreign_tokens() {
        let set = Set {
            elements: vec![Token::Reference(1)],
            negated: false,
        };
        assert_eq!(
            normalize_set(&set).expect_err("references are not set elements"),
            TreeError::InvalidSetElement
        );
    }

    #[test]
    fn named_classes_are_fixed_points() {
        for token in [
            classes::digits(),
            classes::not_digits(),
            classes::words(),
            classes::not_words(),
            classes::whitespace(),
            classes::not_whitespace(),
            classes::any_char(),
        ] {
            let Token::Set(set) = &token else {
                panic!("named classes are sets");
            };
            assert_eq!(&Token::Set(normalize_set(set).expect("well-formed set")), &token);
        }
    }
}
