use std::sync::OnceLock;

use regex::Regex;

/// Inline HTML: open and close tags, comments, processing instructions,
/// declarations and CDATA sections.
pub struct RawHtml;

impl RawHtml {
    pub const OPEN: u8 = b'<';

    /// Source length of the HTML construct at the start of `rest`.
    pub fn scan(rest: &str) -> Option<usize> {
        static HTML_RE: OnceLock<Regex> = OnceLock::new();
        let re = HTML_RE.get_or_init(|| {
            let attr = r#"(?:\s+[A-Za-z_:][A-Za-z0-9_.:\-]*(?:\s*=\s*(?:[^\s"'=<>`]+|'[^']*'|"[^"]*"))?)"#;
            let open = format!(r"<[A-Za-z][A-Za-z0-9\-]*{attr}*\s*/?>");
            let close = r"</[A-Za-z][A-Za-z0-9\-]*\s*>";
            let comment = r"<!--(?s:.*?)-->";
            let pi = r"<\?(?s:.*?)\?>";
            let decl = r"<![A-Za-z]+[^>]*>";
            let cdata = r"<!\[CDATA\[(?s:.*?)\]\]>";
            Regex::new(&format!("^(?:{open}|{close}|{comment}|{pi}|{cdata}|{decl})"))
                .expect("Invalid raw HTML regex")
        });
        re.find(rest).map(|m| m.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<span>x", Some(6))]
    #[case("<a href=\"x\" title='y'>", Some(22))]
    #[case("</div >", Some(7))]
    #[case("<br/>", Some(5))]
    #[case("<!-- note -->", Some(13))]
    #[case("<?php x ?>", Some(10))]
    #[case("<![CDATA[ a ]]>", Some(15))]
    #[case("<!DOCTYPE html>", Some(15))]
    #[case("< span>", None)]
    #[case("<3", None)]
    fn scans(#[case] input: &str, #[case] expected: Option<usize>) {
        assert_eq!(RawHtml::scan(input), expected);
    }
}
