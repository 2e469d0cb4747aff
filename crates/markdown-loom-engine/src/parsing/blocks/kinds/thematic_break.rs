/// Thematic breaks: three or more `-`, `*` or `_`, optionally space-separated.
pub struct ThematicBreak;

impl ThematicBreak {
    pub const CHARS: [char; 3] = ['-', '*', '_'];
    pub const DEFAULT: &'static str = "---";

    pub fn matches(line: &str) -> bool {
        let indent = line.bytes().take_while(|b| *b == b' ').count();
        if indent > 3 {
            return false;
        }
        let mut chars = line[indent..].chars().filter(|c| *c != ' ' && *c != '\t');
        let Some(first) = chars.next() else {
            return false;
        };
        if !Self::CHARS.contains(&first) {
            return false;
        }
        let mut count = 1;
        for c in chars {
            if c != first {
                return false;
            }
            count += 1;
        }
        count >= 3
    }
}
