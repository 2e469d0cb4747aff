use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::node::{Inline, InlineKind, InlineText};
use crate::options::Extensions;
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::rope::Span;

use super::{
    cursor::Cursor,
    emphasis::{DelimiterRun, merge_text, process_emphasis},
    kinds::{Autolink, CodeSpan, Emoji, Entity, Escape, FootnoteRef, Link, RawHtml, Strikethrough, link::unescape},
};

/// Turns an inline run into [`Inline`] nodes owned by `block_id`.
///
/// Constructs are tried in a fixed precedence at each position; anything that
/// does not form a complete construct is kept as literal text. Plain text is
/// accumulated lazily and only flushed when a construct starts or the run ends.
pub struct InlineParser<'a> {
    refs: &'a LinkRefs,
    extensions: Extensions,
    block_id: NodeId,
    ids: &'a mut dyn IdGenerator,
}

/// Plain text gathered since the last construct.
struct Pending {
    start: usize,
    semantic: String,
}

struct Run<'s> {
    cur: Cursor<'s>,
    out: Vec<Inline>,
    stack: Vec<DelimiterRun>,
    pending: Pending,
}

impl<'s> Run<'s> {
    fn new(s: &'s str, base: usize) -> Self {
        Self {
            cur: Cursor::new(s, base),
            out: Vec::new(),
            stack: Vec::new(),
            pending: Pending {
                start: 0,
                semantic: String::new(),
            },
        }
    }

    /// Accepts `n` bytes as plain text.
    fn plain(&mut self, n: usize) {
        let from = self.cur.i;
        self.cur.bump_n(n);
        if let Some(s) = self.cur.s.get(from..self.cur.i) {
            self.pending.semantic.push_str(s);
        }
    }
}

impl<'a> InlineParser<'a> {
    pub fn new(refs: &'a LinkRefs, extensions: Extensions, block_id: NodeId, ids: &'a mut dyn IdGenerator) -> Self {
        Self {
            refs,
            extensions,
            block_id,
            ids,
        }
    }

    /// Parses `s`, reporting spans offset by `base`.
    pub fn parse(&mut self, s: &str, base: usize) -> Vec<Inline> {
        let mut run = Run::new(s, base);

        while let Some(b) = run.cur.peek() {
            let consumed = match b {
                Escape::BACKSLASH => self.escape(&mut run),
                Entity::AMP => self.entity(&mut run),
                CodeSpan::TICK => self.code_span(&mut run),
                b'<' => self.angle(&mut run),
                Link::IMAGE if run.cur.peek_at(1) == Some(Link::OPEN) => self.image(&mut run),
                Link::OPEN => self.link_or_footnote(&mut run),
                b'~' if self.extensions.strikethrough => self.strikethrough(&mut run),
                b'*' | b'_' => {
                    self.delimiter_run(&mut run, b);
                    true
                }
                Emoji::COLON if self.extensions.emoji => self.emoji(&mut run),
                b'\n' => {
                    self.line_break(&mut run);
                    true
                }
                b'h' | b'w' if self.extensions.autolinks => self.bare_url(&mut run),
                _ => false,
            };
            if !consumed {
                let n = run.cur.peek_char().map(char::len_utf8).unwrap_or(1);
                run.plain(n);
            }
        }

        self.flush(&mut run);
        let Run {
            mut out, mut stack, ..
        } = run;
        process_emphasis(&mut out, &mut stack, s, base, self.block_id, self.ids);
        merge_text(&mut out);
        out
    }

    fn node(&mut self, kind: InlineKind, text: InlineText, start: usize) -> Inline {
        Inline::new(self.ids.next_id(), kind, self.block_id, text, start)
    }

    fn flush(&mut self, run: &mut Run<'_>) {
        let end = run.cur.i;
        if end > run.pending.start {
            let symbolic = run.cur.s.get(run.pending.start..end).unwrap_or_default().to_string();
            let semantic = std::mem::take(&mut run.pending.semantic);
            let node = self.node(
                InlineKind::Text,
                InlineText::new(symbolic, semantic),
                run.cur.base + run.pending.start,
            );
            run.out.push(node);
        }
        run.pending.semantic.clear();
        run.pending.start = end;
    }

    /// Emits a leaf construct of `len` source bytes at the cursor.
    fn emit(&mut self, run: &mut Run<'_>, kind: InlineKind, len: usize, semantic: String) {
        self.flush(run);
        let start = run.cur.i;
        let symbolic = run.cur.s.get(start..start + len).unwrap_or_default().to_string();
        let node = self.node(kind, InlineText::new(symbolic, semantic), run.cur.base + start);
        run.out.push(node);
        run.cur.bump_n(len);
        run.pending.start = run.cur.i;
    }

    /// Emits a composite construct whose children come from `inner`.
    fn emit_composite(&mut self, run: &mut Run<'_>, kind: InlineKind, len: usize, inner: Span) {
        self.flush(run);
        let start = run.cur.i;
        let base = run.cur.base;
        let src = run.cur.s;
        let children = self.parse(src.get(inner.start..inner.end).unwrap_or_default(), base + inner.start);
        let semantic: String = children.iter().map(|c| c.text.semantic.as_str()).collect();
        let symbolic = src.get(start..start + len).unwrap_or_default().to_string();
        let mut node = self.node(kind, InlineText::new(symbolic, semantic), base + start);
        node.children = children;
        run.out.push(node);
        run.cur.bump_n(len);
        run.pending.start = run.cur.i;
    }

    fn escape(&mut self, run: &mut Run<'_>) -> bool {
        match run.cur.peek_at(1) {
            Some(b'\n') => {
                self.emit(run, InlineKind::HardBreak, 2, "\n".to_string());
                true
            }
            Some(next) if Escape::is_escapable(next) => {
                run.cur.bump_n(2);
                run.pending.semantic.push(char::from(next));
                true
            }
            _ => false,
        }
    }

    fn entity(&mut self, run: &mut Run<'_>) -> bool {
        let Some((len, decoded)) = Entity::scan(run.cur.rest()) else {
            return false;
        };
        self.emit(
            run,
            InlineKind::Entity {
                decoded: decoded.clone(),
            },
            len,
            decoded,
        );
        true
    }

    fn code_span(&mut self, run: &mut Run<'_>) -> bool {
        match CodeSpan::scan(&run.cur) {
            Ok(m) => self.emit(run, InlineKind::CodeSpan, m.len, m.content),
            Err(ticks) => run.plain(ticks),
        }
        true
    }

    fn angle(&mut self, run: &mut Run<'_>) -> bool {
        let rest = run.cur.rest();
        if let Some(m) = Autolink::scan(rest) {
            self.emit(run, InlineKind::Autolink { url: m.url }, m.len, m.text);
            return true;
        }
        if let Some(len) = RawHtml::scan(rest) {
            let symbolic = rest[..len].to_string();
            self.emit(run, InlineKind::RawHtml, len, symbolic);
            return true;
        }
        false
    }

    fn image(&mut self, run: &mut Run<'_>) -> bool {
        let Some(m) = Link::scan(&run.cur.rest()[1..], self.refs) else {
            return false;
        };
        let alt = unescape(&run.cur.rest()[1 + m.label_start..1 + m.label_end]);
        self.emit(
            run,
            InlineKind::Image {
                url: m.url,
                alt: alt.clone(),
                title: m.title,
            },
            m.len + 1,
            alt,
        );
        true
    }

    fn link_or_footnote(&mut self, run: &mut Run<'_>) -> bool {
        if let Some(m) = Link::scan(run.cur.rest(), self.refs) {
            let inner = Span::new(run.cur.i + m.label_start, run.cur.i + m.label_end);
            self.emit_composite(
                run,
                InlineKind::Link {
                    url: m.url,
                    title: m.title,
                },
                m.len,
                inner,
            );
            return true;
        }
        if self.extensions.footnotes
            && let Some((label, len)) = FootnoteRef::scan(run.cur.rest())
        {
            let label = label.to_string();
            self.emit(run, InlineKind::FootnoteRef { label: label.clone() }, len, label);
            return true;
        }
        false
    }

    fn strikethrough(&mut self, run: &mut Run<'_>) -> bool {
        let Some((content, len)) = Strikethrough::scan(run.cur.rest()) else {
            if run.cur.starts_with(b"~~") {
                // An unmatched `~~` (or longer run) stays literal as a whole.
                let n = run.cur.rest().bytes().take_while(|b| *b == b'~').count();
                run.plain(n);
                return true;
            }
            return false;
        };
        let open = Strikethrough::DELIM.len();
        let inner = Span::new(run.cur.i + open, run.cur.i + open + content);
        self.emit_composite(run, InlineKind::Strikethrough, len, inner);
        true
    }

    fn delimiter_run(&mut self, run: &mut Run<'_>, delim: u8) {
        self.flush(run);
        let before = run.cur.prev_char();
        let start = run.cur.i;
        let count = run.cur.eat_run(delim);
        let after = run.cur.peek_char();
        let symbolic = run.cur.s[start..run.cur.i].to_string();
        let node = self.node(InlineKind::Text, InlineText::same(symbolic), run.cur.base + start);
        run.out.push(node);
        let delim_run = DelimiterRun::new(delim, count, run.out.len() - 1, before, after);
        if delim_run.can_open || delim_run.can_close {
            run.stack.push(delim_run);
        }
        run.pending.start = run.cur.i;
    }

    fn emoji(&mut self, run: &mut Run<'_>) -> bool {
        let Some((name, len)) = Emoji::scan(run.cur.rest()) else {
            return false;
        };
        let name = name.to_string();
        let semantic = Emoji::resolve(&name);
        self.emit(run, InlineKind::Emoji { name }, len, semantic);
        true
    }

    /// Two or more trailing spaces before a newline make a hard break;
    /// a bare newline is a soft break.
    fn line_break(&mut self, run: &mut Run<'_>) {
        let pending = run.cur.s.get(run.pending.start..run.cur.i).unwrap_or_default();
        let spaces = pending.len() - pending.trim_end_matches(' ').len();
        if spaces >= 2 {
            let keep = run.pending.semantic.len().saturating_sub(spaces);
            run.pending.semantic.truncate(keep);
            run.cur.i -= spaces;
            self.flush(run);
            self.emit(run, InlineKind::HardBreak, spaces + 1, "\n".to_string());
        } else {
            self.emit(run, InlineKind::SoftBreak, 1, "\n".to_string());
        }
    }

    fn bare_url(&mut self, run: &mut Run<'_>) -> bool {
        let boundary = run
            .cur
            .prev_char()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '(' | '*' | '_' | '~'));
        if !boundary {
            return false;
        }
        let Some(m) = Autolink::scan_bare(run.cur.rest()) else {
            return false;
        };
        self.emit(run, InlineKind::Autolink { url: m.url }, m.len, m.text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use pretty_assertions::assert_eq;

    /// Compact structural rendering: `kind(symbolic)` with children in brackets.
    fn shape(nodes: &[Inline]) -> String {
        nodes
            .iter()
            .map(|n| {
                if n.children.is_empty() {
                    format!("{}({:?})", n.kind.tag(), n.text.symbolic)
                } else {
                    format!("{}[{}]", n.kind.tag(), shape(&n.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn parse(s: &str) -> Vec<Inline> {
        parse_with(s, &LinkRefs::default())
    }

    fn parse_with(s: &str, refs: &LinkRefs) -> Vec<Inline> {
        let mut ids = SequentialIds::default();
        InlineParser::new(refs, Extensions::default(), NodeId(0), &mut ids).parse(s, 0)
    }

    #[test]
    fn plain_text_is_one_node() {
        let nodes = parse("hello world");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text.symbolic, "hello world");
        assert_eq!(nodes[0].text.semantic, "hello world");
        assert_eq!(nodes[0].span, Span::new(0, 11));
    }

    #[test]
    fn strong_wraps_nested_emphasis() {
        let nodes = parse("a **b *c* d** e");
        assert_eq!(
            shape(&nodes),
            r#"text("a ") strong[text("b ") emphasis[text("c")] text(" d")] text(" e")"#
        );
        assert_eq!(nodes[1].text.symbolic, "**b *c* d**");
        assert_eq!(nodes[1].text.semantic, "b c d");
        assert_eq!(nodes[1].span, Span::new(2, 13));
    }

    #[test]
    fn triple_delimiters_nest_emphasis_and_strong() {
        let nodes = parse("***x***");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text.symbolic, "***x***");
        assert_eq!(nodes[0].text.semantic, "x");
    }

    #[test]
    fn unmatched_delimiters_stay_text() {
        assert_eq!(shape(&parse("**open")), r#"text("**open")"#);
        assert_eq!(shape(&parse("a * b")), r#"text("a * b")"#);
        assert_eq!(shape(&parse("snake_case_name")), r#"text("snake_case_name")"#);
    }

    #[test]
    fn escapes_change_semantic_only() {
        let nodes = parse(r"\*not em\*");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text.symbolic, r"\*not em\*");
        assert_eq!(nodes[0].text.semantic, "*not em*");
    }

    #[test]
    fn code_span_suppresses_other_syntax() {
        let nodes = parse("x `*a* [b](c)` y");
        assert_eq!(shape(&nodes), r#"text("x ") codeSpan("`*a* [b](c)`") text(" y")"#);
        assert_eq!(nodes[1].text.semantic, "*a* [b](c)");
    }

    #[test]
    fn lone_backtick_is_text() {
        assert_eq!(shape(&parse("a ` b")), r#"text("a ` b")"#);
    }

    #[test]
    fn links_and_images() {
        let nodes = parse("see [the *docs*](/d \"D\") and ![alt](i.png)");
        assert_eq!(
            shape(&nodes),
            r#"text("see ") link[text("the ") emphasis[text("docs")]] text(" and ") image("![alt](i.png)")"#
        );
        match &nodes[1].kind {
            InlineKind::Link { url, title } => {
                assert_eq!(url, "/d");
                assert_eq!(title.as_deref(), Some("D"));
            }
            other => panic!("expected link, got {other:?}"),
        }
        assert_eq!(nodes[1].children[0].span.start, 5);
        assert_eq!(nodes[3].text.semantic, "alt");
    }

    #[test]
    fn reference_link_resolves() {
        let refs = LinkRefs::scan("[r]: /target");
        let nodes = parse_with("[text][R]", &refs);
        assert!(matches!(&nodes[0].kind, InlineKind::Link { url, .. } if url == "/target"));
    }

    #[test]
    fn malformed_link_is_text() {
        assert_eq!(shape(&parse("[link](")), r#"text("[link](")"#);
        assert_eq!(shape(&parse("[unclosed")), r#"text("[unclosed")"#);
    }

    #[test]
    fn footnotes_strike_emoji_entities() {
        let nodes = parse("a[^1] ~~gone~~ :tada: &amp;");
        assert_eq!(
            shape(&nodes),
            r#"text("a") footnoteRef("[^1]") text(" ") strikethrough[text("gone")] text(" ") emoji(":tada:") text(" ") entity("&amp;")"#
        );
        assert_eq!(nodes[5].text.semantic, "🎉");
        assert_eq!(nodes[7].text.semantic, "&");
    }

    #[test]
    fn autolinks_and_html() {
        let nodes = parse("<https://x.io> <b>hi</b> www.rust-lang.org");
        assert_eq!(
            shape(&nodes),
            r#"autolink("<https://x.io>") text(" ") rawHTML("<b>") text("hi") rawHTML("</b>") text(" ") autolink("www.rust-lang.org")"#
        );
    }

    #[test]
    fn line_breaks() {
        let nodes = parse("a  \nb\nc\\\nd");
        assert_eq!(
            shape(&nodes),
            r#"text("a") hardBreak("  \n") text("b") softBreak("\n") text("c") hardBreak("\\\n") text("d")"#
        );
    }

    #[test]
    fn disabled_extensions_leave_text() {
        let mut ids = SequentialIds::default();
        let ext = Extensions {
            strikethrough: false,
            emoji: false,
            ..Extensions::default()
        };
        let refs = LinkRefs::default();
        let nodes = InlineParser::new(&refs, ext, NodeId(0), &mut ids).parse("~~a~~ :tada:", 0);
        assert_eq!(shape(&nodes), r#"text("~~a~~ :tada:")"#);
    }

    #[test]
    fn base_offsets_spans() {
        let mut ids = SequentialIds::default();
        let refs = LinkRefs::default();
        let nodes = InlineParser::new(&refs, Extensions::default(), NodeId(0), &mut ids).parse("*a*", 10);
        assert_eq!(nodes[0].span, Span::new(10, 13));
        assert_eq!(nodes[0].children[0].span, Span::new(11, 12));
    }

    #[test]
    fn never_panics_on_malformed_input() {
        for s in ["**", "[", "](", "`", "<", "&", "\\", "~~", "![", "[^", ":", "_*_*", "é*é", "*\u{200B}*"] {
            let nodes = parse(s);
            let symbolic: String = nodes.iter().map(|n| n.text.symbolic.as_str()).collect();
            assert_eq!(symbolic, s);
        }
    }
}
