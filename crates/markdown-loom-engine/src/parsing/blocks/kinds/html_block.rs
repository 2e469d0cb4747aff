/// Block-level HTML, recognised by a tag allow-list or a comment opener.
pub struct HtmlBlock;

const TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "center", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html",
    "iframe", "legend", "li", "main", "nav", "ol", "p", "pre", "script", "section", "style", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

impl HtmlBlock {
    pub const COMMENT: &'static str = "<!--";

    pub fn matches(line: &str) -> bool {
        let indent = line.bytes().take_while(|b| *b == b' ').count();
        if indent > 3 {
            return false;
        }
        let rest = &line[indent..];
        if rest.starts_with(Self::COMMENT) {
            return true;
        }
        let Some(tag) = rest.strip_prefix("</").or_else(|| rest.strip_prefix('<')) else {
            return false;
        };
        let name_len = tag.bytes().take_while(|b| b.is_ascii_alphanumeric()).count();
        let name = tag[..name_len].to_ascii_lowercase();
        if !TAGS.contains(&name.as_str()) {
            return false;
        }
        let after = &tag[name_len..];
        after.is_empty() || after.starts_with([' ', '>', '\t']) || after.starts_with("/>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<div>", true)]
    #[case("<DIV class=\"x\">", true)]
    #[case("</table>", true)]
    #[case("<!-- note -->", true)]
    #[case("<hr/>", true)]
    #[case("<span>inline</span>", false)]
    #[case("<divx>", false)]
    #[case("text <div>", false)]
    fn detection(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(HtmlBlock::matches(line), expected);
    }
}
