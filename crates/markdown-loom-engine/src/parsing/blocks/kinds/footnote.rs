use std::sync::OnceLock;

use regex::Regex;

/// Footnote definitions `[^label]: text`.
pub struct FootnoteDefinition;

impl FootnoteDefinition {
    /// Returns `(label, marker_len)` where the marker runs through the colon
    /// and any following spaces.
    pub fn parse(line: &str) -> Option<(String, usize)> {
        static DEF_RE: OnceLock<Regex> = OnceLock::new();
        let re = DEF_RE.get_or_init(|| {
            Regex::new(r"^ {0,3}\[\^([^\]\s]+)\]: *").expect("Invalid footnote definition regex")
        });
        let caps = re.captures(line)?;
        Some((caps.get(1)?.as_str().to_string(), caps.get(0)?.end()))
    }

    pub fn marker(label: &str) -> String {
        format!("[^{label}]: ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_and_marker() {
        assert_eq!(FootnoteDefinition::parse("[^1]: The note"), Some(("1".to_string(), 6)));
        assert_eq!(FootnoteDefinition::parse("[^x]:"), Some(("x".to_string(), 5)));
        assert_eq!(FootnoteDefinition::parse("[^x] no colon"), None);
        assert_eq!(FootnoteDefinition::marker("n"), "[^n]: ");
    }
}
