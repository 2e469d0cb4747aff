use std::sync::OnceLock;

use regex::Regex;

/// `<scheme:...>` and `<user@host>` autolinks, plus bare `http(s)://` and
/// `www.` links when the extension is on.
pub struct Autolink;

#[derive(Debug, PartialEq, Eq)]
pub struct AutolinkMatch {
    pub len: usize,
    /// Display text.
    pub text: String,
    pub url: String,
}

impl Autolink {
    pub const OPEN: u8 = b'<';
    pub const CLOSE: u8 = b'>';

    pub fn scan(rest: &str) -> Option<AutolinkMatch> {
        static URI_RE: OnceLock<Regex> = OnceLock::new();
        static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
        let uri = URI_RE.get_or_init(|| {
            Regex::new(r"^<([A-Za-z][A-Za-z0-9+.\-]{1,31}:[^\s<>]*)>").expect("Invalid autolink regex")
        });
        let email = EMAIL_RE.get_or_init(|| {
            Regex::new(
                r"^<([A-Za-z0-9.!#$%&'*+/=?^_`{|}~\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)*)>",
            )
            .expect("Invalid email autolink regex")
        });
        if let Some(c) = uri.captures(rest) {
            let inner = c.get(1)?.as_str();
            return Some(AutolinkMatch {
                len: c.get(0)?.end(),
                text: inner.to_string(),
                url: inner.to_string(),
            });
        }
        let c = email.captures(rest)?;
        let inner = c.get(1)?.as_str();
        Some(AutolinkMatch {
            len: c.get(0)?.end(),
            text: inner.to_string(),
            url: format!("mailto:{inner}"),
        })
    }

    /// Bare URL at the start of `rest`. The caller checks the preceding
    /// character is a boundary.
    pub fn scan_bare(rest: &str) -> Option<AutolinkMatch> {
        static BARE_RE: OnceLock<Regex> = OnceLock::new();
        let re = BARE_RE.get_or_init(|| {
            Regex::new(r"^(?:https?://|www\.)[^\s<>]+").expect("Invalid bare URL regex")
        });
        let m = re.find(rest)?;
        let text = m
            .as_str()
            .trim_end_matches(['.', ',', ':', ';', '!', '?', '"', '\'', ')', '*', '_', '~']);
        if text.ends_with("://") || text == "www." {
            return None;
        }
        let url = if text.starts_with("www.") {
            format!("http://{text}")
        } else {
            text.to_string()
        };
        Some(AutolinkMatch {
            len: text.len(),
            text: text.to_string(),
            url,
        })
    }
}
