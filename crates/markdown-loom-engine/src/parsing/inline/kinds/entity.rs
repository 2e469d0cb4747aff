use std::sync::OnceLock;

use regex::Regex;

/// HTML entity references: `&amp;`, `&#35;`, `&#x22;`.
pub struct Entity;

impl Entity {
    pub const AMP: u8 = b'&';

    /// Matches an entity at the start of `rest`, returning its source length
    /// and decoded value. Unknown named entities do not match.
    pub fn scan(rest: &str) -> Option<(usize, String)> {
        static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
        let re = ENTITY_RE.get_or_init(|| {
            Regex::new(r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});")
                .expect("Invalid entity regex")
        });
        let m = re.find(rest)?;
        let decoded = html_escape::decode_html_entities(m.as_str());
        if decoded == m.as_str() {
            return None;
        }
        Some((m.end(), decoded.into_owned()))
    }
}
