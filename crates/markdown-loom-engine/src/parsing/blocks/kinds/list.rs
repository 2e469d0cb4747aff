use std::sync::OnceLock;

use regex::Regex;

/// The bullet or ordinal that opens a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Unordered(char),
    Ordered { number: u32, delimiter: char },
}

/// A parsed list item marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker {
    /// Leading spaces before the bullet.
    pub indent: usize,
    pub bullet: Bullet,
    /// `Some(checked)` for task items.
    pub task: Option<bool>,
    /// Spaces between the marker and the content.
    pub spacing: usize,
    /// Byte length of indentation plus marker plus spacing.
    pub len: usize,
}

fn marker_re() -> &'static Regex {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    MARKER_RE.get_or_init(|| {
        Regex::new(r"^( *)(?:([-*+])|([0-9]{1,9})([.)]))(?:( +)|$)").expect("Invalid list marker regex")
    })
}

fn task_re() -> &'static Regex {
    static TASK_RE: OnceLock<Regex> = OnceLock::new();
    TASK_RE.get_or_init(|| Regex::new(r"^\[([ xX])\](?:( +)|$)").expect("Invalid task marker regex"))
}

impl ListMarker {
    pub const DEFAULT_BULLET: char = '-';
    pub const UNCHECKED: &'static str = "[ ]";
    pub const CHECKED: &'static str = "[x]";

    /// Parses the marker at the start of `line`. Task boxes are only
    /// recognised after unordered bullets and only when `task_lists` is on.
    pub fn parse(line: &str, task_lists: bool) -> Option<Self> {
        let caps = marker_re().captures(line)?;
        let indent = caps.get(1)?.as_str().len();
        let bullet = if let Some(b) = caps.get(2) {
            Bullet::Unordered(b.as_str().chars().next()?)
        } else {
            Bullet::Ordered {
                number: caps.get(3)?.as_str().parse().ok()?,
                delimiter: caps.get(4)?.as_str().chars().next()?,
            }
        };
        let spacing = caps.get(5).map_or(0, |m| m.as_str().len());
        let mut marker = Self {
            indent,
            bullet,
            task: None,
            spacing,
            len: caps.get(0)?.end(),
        };

        if task_lists
            && spacing > 0
            && matches!(bullet, Bullet::Unordered(_))
            && let Some(task) = task_re().captures(&line[marker.len..])
        {
            let checked = task.get(1)?.as_str() != " ";
            let task_spacing = task.get(2).map_or(0, |m| m.as_str().len());
            marker.task = Some(checked);
            marker.len += task.get(0)?.end();
            marker.spacing = task_spacing;
        }
        Some(marker)
    }

    pub fn ordered(&self) -> bool {
        matches!(self.bullet, Bullet::Ordered { .. })
    }

    pub fn delimiter(&self) -> char {
        match self.bullet {
            Bullet::Unordered(c) => c,
            Bullet::Ordered { delimiter, .. } => delimiter,
        }
    }

    /// The marker text without indentation, e.g. `- `, `3) ` or `- [x] `.
    pub fn render(&self) -> String {
        let mut out = match self.bullet {
            Bullet::Unordered(c) => c.to_string(),
            Bullet::Ordered { number, delimiter } => format!("{number}{delimiter}"),
        };
        if let Some(checked) = self.task {
            out.push(' ');
            out.push_str(if checked { Self::CHECKED } else { Self::UNCHECKED });
        }
        out.push_str(&" ".repeat(self.spacing));
        out
    }

    /// Default marker for a fresh item.
    pub fn fresh(ordered: Option<(u32, char)>, task: Option<bool>) -> Self {
        let bullet = match ordered {
            Some((number, delimiter)) => Bullet::Ordered { number, delimiter },
            None => Bullet::Unordered(Self::DEFAULT_BULLET),
        };
        let mut marker = Self {
            indent: 0,
            bullet,
            task,
            spacing: 1,
            len: 0,
        };
        marker.len = marker.render().len();
        marker
    }

    /// Rewrites an existing marker's ordinal and checkbox, keeping its bullet
    /// character and spacing. Falls back to a fresh marker if `existing` does
    /// not parse.
    pub fn rewrite(existing: Option<&str>, ordinal: Option<(u32, char)>, task: Option<bool>) -> String {
        let parsed = existing.and_then(|m| Self::parse(m, true));
        let mut marker = match parsed {
            Some(m) if m.ordered() == ordinal.is_some() => m,
            _ => Self::fresh(ordinal, task),
        };
        marker.indent = 0;
        if let (Bullet::Ordered { number, .. }, Some((n, _))) = (&mut marker.bullet, ordinal) {
            *number = n;
        }
        if task.is_some() && marker.task.is_none() && marker.spacing == 0 {
            marker.spacing = 1;
        }
        marker.task = task;
        if marker.spacing == 0 {
            marker.spacing = 1;
        }
        marker.render()
    }
}
