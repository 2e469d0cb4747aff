/// ATX headings: one to six `#` followed by a space.
pub struct Heading;

impl Heading {
    pub const HASH: u8 = b'#';
    pub const MAX_LEVEL: usize = 6;

    /// Returns `(level, marker_len)`, where the marker covers indentation,
    /// hashes and the following spaces.
    pub fn parse(line: &str) -> Option<(u8, usize)> {
        let b = line.as_bytes();
        let indent = b.iter().take_while(|c| **c == b' ').count();
        if indent > 3 {
            return None;
        }
        let hashes = b[indent..].iter().take_while(|c| **c == Self::HASH).count();
        if hashes == 0 || hashes > Self::MAX_LEVEL || b.get(indent + hashes) != Some(&b' ') {
            return None;
        }
        let spaces = b[indent + hashes..].iter().take_while(|c| **c == b' ').count();
        Some((hashes as u8, indent + hashes + spaces))
    }

    pub fn marker(level: u8) -> String {
        format!("{} ", "#".repeat(usize::from(level.clamp(1, 6))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(Heading::parse("# Title"), Some((1, 2)));
        assert_eq!(Heading::parse("###   Spaced"), Some((3, 6)));
        assert_eq!(Heading::parse("## "), Some((2, 3)));
    }

    #[test]
    fn rejects_non_headings() {
        assert_eq!(Heading::parse("#nospace"), None);
        assert_eq!(Heading::parse("####### seven"), None);
        assert_eq!(Heading::parse("#"), None);
        assert_eq!(Heading::parse("    # code"), None);
    }

    #[test]
    fn marker_text() {
        assert_eq!(Heading::marker(3), "### ");
    }
}
