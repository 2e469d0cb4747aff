/// A byte cursor over an inline run.
///
/// `base` is added to every reported position so a run can be parsed in
/// isolation and still report offsets local to its owning block.
#[derive(Clone)]
pub struct Cursor<'a> {
    pub s: &'a str,
    pub base: usize,
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str, base: usize) -> Self {
        Self { s, base, i: 0 }
    }

    /// Position relative to `base`.
    pub fn pos(&self) -> usize {
        self.base + self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Byte `n` positions ahead of the cursor.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + n).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes().get(self.i..).is_some_and(|r| r.starts_with(pat))
    }

    /// Unparsed remainder of the input.
    pub fn rest(&self) -> &'a str {
        self.s.get(self.i..).unwrap_or("")
    }

    /// The character just before the cursor, if any.
    pub fn prev_char(&self) -> Option<char> {
        self.s.get(..self.i)?.chars().next_back()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    /// Advances past one whole character.
    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.i += c.len_utf8();
        Some(c)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Counts and consumes a run of `b`.
    pub fn eat_run(&mut self, b: u8) -> usize {
        let start = self.i;
        while self.peek() == Some(b) {
            self.i += 1;
        }
        self.i - start
    }
}
