use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Target of a link reference definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDef {
    pub url: String,
    pub title: Option<String>,
}

/// Link reference definitions keyed by normalized label.
///
/// Collected from the whole document before block parsing and handed to every
/// fragment re-parse, so reference links keep resolving after local edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRefs {
    defs: HashMap<String, LinkDef>,
}

fn definition_re() -> &'static Regex {
    static DEF_RE: OnceLock<Regex> = OnceLock::new();
    DEF_RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^ {0,3}\[([^\]\^][^\]]*)\]:[ \t]*(<[^>\n]*>|\S+)(?:[ \t]+("[^"\n]*"|'[^'\n]*'|\([^)\n]*\)))?[ \t]*$"#,
        )
        .expect("Invalid link reference regex")
    })
}

/// Case-folded label with whitespace runs collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl LinkRefs {
    /// Scans `source` for `[label]: url "title"` lines. The first definition
    /// of a label wins.
    pub fn scan(source: &str) -> Self {
        let mut refs = Self::default();
        for caps in definition_re().captures_iter(source) {
            let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let url = url.as_str().trim_start_matches('<').trim_end_matches('>');
            let title = caps.get(3).map(|t| {
                let t = t.as_str();
                t[1..t.len() - 1].to_string()
            });
            refs.insert(label.as_str(), url, title);
        }
        refs
    }

    /// True if `line` is a complete link reference definition.
    pub fn is_definition(line: &str) -> bool {
        definition_re()
            .find(line)
            .is_some_and(|m| m.start() == 0 && m.end() == line.len())
    }

    pub fn insert(&mut self, label: &str, url: &str, title: Option<String>) {
        let key = normalize_label(label);
        if key.is_empty() {
            return;
        }
        self.defs.entry(key).or_insert_with(|| LinkDef {
            url: url.to_string(),
            title,
        });
    }

    pub fn get(&self, label: &str) -> Option<&LinkDef> {
        self.defs.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
