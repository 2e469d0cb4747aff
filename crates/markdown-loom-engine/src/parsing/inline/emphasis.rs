//! Delimiter-stack resolution of `*` and `_` runs into emphasis and strong.
//!
//! Runs are first emitted as plain text nodes and recorded on a stack; once the
//! whole run is scanned, [`process_emphasis`] pairs closers with the nearest
//! compatible opener and wraps the nodes between them.

use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::node::{Inline, InlineKind, InlineText};
use crate::parsing::rope::Span;

/// One `*`/`_` run on the delimiter stack.
#[derive(Debug, Clone)]
pub struct DelimiterRun {
    pub delimiter: u8,
    /// Delimiters still unmatched.
    pub count: usize,
    /// Length of the run as scanned, used by the multiple-of-three rule.
    pub original: usize,
    /// Index of the run's text node in the node list.
    pub node: usize,
    pub can_open: bool,
    pub can_close: bool,
    pub active: bool,
}

/// Unicode punctuation or symbol, approximated for non-ASCII characters.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// Whether a run with `before`/`after` neighbours (None at the edges) is
/// left- and right-flanking.
pub fn flanking(before: Option<char>, after: Option<char>) -> (bool, bool) {
    let before = before.unwrap_or(' ');
    let after = after.unwrap_or(' ');
    let left = !after.is_whitespace()
        && (!is_punctuation(after) || before.is_whitespace() || is_punctuation(before));
    let right = !before.is_whitespace()
        && (!is_punctuation(before) || after.is_whitespace() || is_punctuation(after));
    (left, right)
}

impl DelimiterRun {
    pub fn new(delimiter: u8, count: usize, node: usize, before: Option<char>, after: Option<char>) -> Self {
        let (left, right) = flanking(before, after);
        let (can_open, can_close) = if delimiter == b'_' {
            (
                left && (!right || before.is_some_and(is_punctuation)),
                right && (!left || after.is_some_and(is_punctuation)),
            )
        } else {
            (left, right)
        };
        Self {
            delimiter,
            count,
            original: count,
            node,
            can_open,
            can_close,
            active: true,
        }
    }

    fn blocked_by_rule_of_three(opener: &DelimiterRun, closer: &DelimiterRun) -> bool {
        (opener.can_close || closer.can_open)
            && (opener.original + closer.original) % 3 == 0
            && !(opener.original % 3 == 0 && closer.original % 3 == 0)
    }
}

/// Resolves the stack against `nodes`. `src` is the parsed run and `base` its
/// offset, so wrapper nodes can take their symbolic text from the source.
pub fn process_emphasis(
    nodes: &mut Vec<Inline>,
    stack: &mut Vec<DelimiterRun>,
    src: &str,
    base: usize,
    block_id: NodeId,
    ids: &mut dyn IdGenerator,
) {
    let mut closer_idx = 0;
    while closer_idx < stack.len() {
        if !stack[closer_idx].can_close || !stack[closer_idx].active {
            closer_idx += 1;
            continue;
        }

        let opener_idx = (0..closer_idx).rev().find(|&i| {
            let opener = &stack[i];
            opener.delimiter == stack[closer_idx].delimiter
                && opener.active
                && opener.can_open
                && opener.count > 0
                && !DelimiterRun::blocked_by_rule_of_three(opener, &stack[closer_idx])
        });

        let Some(opener_idx) = opener_idx else {
            closer_idx += 1;
            continue;
        };

        let used = if stack[opener_idx].count >= 2 && stack[closer_idx].count >= 2 { 2 } else { 1 };
        let op = stack[opener_idx].node;
        let cl = stack[closer_idx].node;

        // Consume the delimiters nearest the content.
        let wrap_start = nodes[op].span.end - used;
        let wrap_end = nodes[cl].span.start + used;
        trim_delimiters(&mut nodes[op], used, true);
        trim_delimiters(&mut nodes[cl], used, false);
        stack[opener_idx].count -= used;
        stack[closer_idx].count -= used;

        let children: Vec<Inline> = nodes.drain(op + 1..cl).collect();
        let symbolic = src
            .get(wrap_start - base..wrap_end - base)
            .unwrap_or_default()
            .to_string();
        let semantic: String = children.iter().map(|c| c.text.semantic.as_str()).collect();
        let kind = if used == 2 { InlineKind::Strong } else { InlineKind::Emphasis };
        let mut wrapper = Inline::new(ids.next_id(), kind, block_id, InlineText::new(symbolic, semantic), wrap_start);
        wrapper.span = Span::new(wrap_start, wrap_end);
        wrapper.children = children;

        // Layout is now [.., opener, wrapper, closer, ..]; drop exhausted runs.
        nodes.insert(op + 1, wrapper);
        let old_len = cl - op + 1;
        let mut new_len = 3;
        let closer_node = op + 2;
        let closer_gone = stack[closer_idx].count == 0;
        if closer_gone {
            nodes.remove(closer_node);
            new_len -= 1;
        }
        let opener_gone = stack[opener_idx].count == 0;
        if opener_gone {
            nodes.remove(op);
            new_len -= 1;
        }

        // Runs strictly between opener and closer are now inside the wrapper.
        let mut next = Vec::with_capacity(stack.len());
        let mut new_closer_idx = 0;
        for (i, mut run) in stack.drain(..).enumerate() {
            if i > opener_idx && i < closer_idx {
                continue;
            }
            if i == opener_idx && opener_gone {
                continue;
            }
            if i == closer_idx {
                new_closer_idx = next.len();
                if closer_gone {
                    continue;
                }
                run.node = if opener_gone { op + 1 } else { op + 2 };
            } else if i > closer_idx {
                run.node = run.node + new_len - old_len;
            }
            next.push(run);
        }
        *stack = next;
        closer_idx = new_closer_idx;
    }
}

fn trim_delimiters(node: &mut Inline, used: usize, from_end: bool) {
    let sym = &node.text.symbolic;
    let keep = sym.len().saturating_sub(used);
    let kept = if from_end { sym[..keep].to_string() } else { sym[used..].to_string() };
    if from_end {
        node.span.end -= used;
    } else {
        node.span.start += used;
    }
    node.text = InlineText::same(kept);
}

/// Merges adjacent text nodes, recursively.
pub fn merge_text(nodes: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        merge_text(&mut node.children);
        if let Some(last) = out.last_mut()
            && matches!(last.kind, InlineKind::Text)
            && matches!(node.kind, InlineKind::Text)
            && last.span.end == node.span.start
        {
            last.text.symbolic.push_str(&node.text.symbolic);
            last.text.semantic.push_str(&node.text.semantic);
            last.span.end = node.span.end;
            continue;
        }
        if matches!(node.kind, InlineKind::Text) && node.text.symbolic.is_empty() {
            continue;
        }
        out.push(node);
    }
    *nodes = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some('a'), (true, false))]
    #[case(Some('a'), None, (false, true))]
    #[case(Some('a'), Some('b'), (true, true))]
    #[case(Some(' '), Some(' '), (false, false))]
    #[case(Some(' '), Some('"'), (true, false))]
    #[case(Some('"'), Some(' '), (false, true))]
    fn flanking_rules(#[case] before: Option<char>, #[case] after: Option<char>, #[case] expected: (bool, bool)) {
        assert_eq!(flanking(before, after), expected);
    }

    #[test]
    fn intraword_underscore_neither_opens_nor_closes() {
        let run = DelimiterRun::new(b'_', 1, 0, Some('a'), Some('b'));
        assert!(!run.can_open);
        assert!(!run.can_close);
        let star = DelimiterRun::new(b'*', 1, 0, Some('a'), Some('b'));
        assert!(star.can_open && star.can_close);
    }

    #[test]
    fn rule_of_three_uses_original_lengths() {
        let opener = DelimiterRun::new(b'*', 1, 0, Some('a'), Some('b'));
        let closer = DelimiterRun::new(b'*', 2, 2, Some('a'), None);
        assert!(DelimiterRun::blocked_by_rule_of_three(&opener, &closer));
        let closer3 = DelimiterRun::new(b'*', 3, 2, Some('a'), None);
        let opener3 = DelimiterRun::new(b'*', 3, 0, None, Some('a'));
        assert!(!DelimiterRun::blocked_by_rule_of_three(&opener3, &closer3));
    }
}
