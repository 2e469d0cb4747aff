use std::sync::OnceLock;

use regex::Regex;

use crate::ast::node::Alignment;
use crate::parsing::rope::Span;

/// Pipe tables: header row, divider row, body rows.
pub struct Table;

/// One cell of a row: its trimmed text and where that text sits in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSlice {
    pub text: String,
    pub span: Span,
}

impl Table {
    pub const PIPE: u8 = b'|';
    /// In-cell line separator.
    pub const BR: &'static str = "<br>";

    fn divider_re() -> &'static Regex {
        static DIVIDER_RE: OnceLock<Regex> = OnceLock::new();
        DIVIDER_RE.get_or_init(|| {
            Regex::new(r"^ {0,3}\|?\s*:?-+:?\s*(?:\|\s*:?-+:?\s*)*\|?\s*$").expect("Invalid table divider regex")
        })
    }

    pub fn is_divider(line: &str) -> bool {
        Self::divider_re().is_match(line)
    }

    /// True if `line` contains a pipe outside escapes and code spans.
    pub fn has_pipe(line: &str) -> bool {
        Self::pipe_positions(line).next().is_some()
    }

    /// A line that could start a table: has a pipe and is not a divider.
    pub fn looks_like_row(line: &str) -> bool {
        !line.trim().is_empty() && Self::has_pipe(line) && !Self::is_divider(line)
    }

    /// Offsets of structural pipes.
    fn pipe_positions(line: &str) -> impl Iterator<Item = usize> + '_ {
        let b = line.as_bytes();
        let mut i = 0;
        std::iter::from_fn(move || {
            while i < b.len() {
                match b[i] {
                    b'\\' => i += 2,
                    b'`' => {
                        let run = b[i..].iter().take_while(|c| **c == b'`').count();
                        let fence = &line[i..i + run];
                        match line[i + run..].find(fence) {
                            Some(close) => i += run + close + run,
                            None => i += run,
                        }
                    }
                    Self::PIPE => {
                        i += 1;
                        return Some(i - 1);
                    }
                    _ => i += 1,
                }
            }
            None
        })
    }

    /// Splits a row into cells. A leading and a trailing pipe do not create
    /// empty edge cells. Cell spans are relative to the line.
    pub fn split_cells(line: &str) -> Vec<CellSlice> {
        let pipes: Vec<usize> = Self::pipe_positions(line).collect();
        let mut bounds = Vec::with_capacity(pipes.len() + 2);
        bounds.push(None);
        bounds.extend(pipes.iter().map(|p| Some(*p)));
        bounds.push(None);

        let mut cells = Vec::new();
        for (i, pair) in bounds.windows(2).enumerate() {
            let start = pair[0].map_or(0, |p| p + 1);
            let end = pair[1].unwrap_or(line.len());
            let raw = &line[start..end];
            let is_edge = i == 0 || i == bounds.len() - 2;
            if is_edge && raw.trim().is_empty() {
                continue;
            }
            let lead = raw.len() - raw.trim_start().len();
            let text = raw.trim();
            cells.push(CellSlice {
                text: text.to_string(),
                span: Span::at(start + lead, text.len()),
            });
        }
        cells
    }

    /// Splits a cell on `<br>` into its internal lines, with spans relative to
    /// the cell text.
    pub fn split_br(cell: &str) -> Vec<(String, Span)> {
        let mut out = Vec::new();
        let mut start = 0;
        for (idx, _) in cell.match_indices(Self::BR) {
            out.push((cell[start..idx].to_string(), Span::new(start, idx)));
            start = idx + Self::BR.len();
        }
        out.push((cell[start..].to_string(), Span::new(start, cell.len())));
        out
    }

    pub fn alignments(divider: &str) -> Vec<Alignment> {
        Self::split_cells(divider)
            .iter()
            .map(|c| {
                let t = c.text.as_str();
                match (t.starts_with(':'), t.ends_with(':') && t.len() > 1) {
                    (true, true) => Alignment::Center,
                    (true, false) => Alignment::Left,
                    (false, true) => Alignment::Right,
                    (false, false) => Alignment::None,
                }
            })
            .collect()
    }

    /// Divider segment for a column of `width` characters.
    pub fn divider_cell(alignment: Alignment, width: usize) -> String {
        let width = width.max(3);
        match alignment {
            Alignment::None => "-".repeat(width),
            Alignment::Left => format!(":{}", "-".repeat(width - 1)),
            Alignment::Right => format!("{}:", "-".repeat(width - 1)),
            Alignment::Center => format!(":{}:", "-".repeat(width - 2)),
        }
    }
}
