//! Scrolling log buffer
//!
//! Fixed-capacity circular byte store behind the log view. Bytes are
//! evicted oldest-first when the store fills; the starts of the most
//! recent `L` lines are remembered so the renderer can find the oldest
//! line it should show without scanning backwards.
//!
//! Line accounting: the buffer keeps an exact count of newline bytes
//! resident in storage. [`LogBuffer::line_count`] reports that count
//! capped at `L`, so it never undercounts, never exceeds `L`, and is
//! zero only when no newline is resident.

/// Default byte capacity
pub const DEFAULT_CAPACITY: usize = 200;

/// Default number of tracked line starts
pub const DEFAULT_LINES: usize = 4;

/// Circular log store with line-boundary tracking
#[derive(Clone)]
pub struct LogBuffer<const C: usize = DEFAULT_CAPACITY, const L: usize = DEFAULT_LINES> {
    storage: [u8; C],
    /// Next write position
    head: usize,
    /// Oldest resident byte
    tail: usize,
    /// Start offsets of the lines following the last `L` newlines
    line_starts: [usize; L],
    /// Next slot in `line_starts`
    line_cursor: usize,
    /// Newline bytes currently resident in `storage`
    newlines: usize,
}

impl<const C: usize, const L: usize> Default for LogBuffer<C, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize, const L: usize> LogBuffer<C, L> {
    const VALID: () = assert!(C >= 2 && L >= 1, "log buffer needs C >= 2 and L >= 1");

    /// Create an empty buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            storage: [0; C],
            head: 0,
            tail: 0,
            line_starts: [0; L],
            line_cursor: 0,
            newlines: 0,
        }
    }

    /// Append one byte
    ///
    /// Control bytes other than `\n` are dropped without touching the
    /// buffer. When the write fills the store the oldest byte is evicted.
    pub fn push(&mut self, byte: u8) {
        if is_discarded(byte) {
            return;
        }

        self.storage[self.head] = byte;
        self.head = (self.head + 1) % C;

        if self.head == self.tail {
            if self.storage[self.tail] == b'\n' {
                self.newlines = self.newlines.saturating_sub(1);
            }
            self.tail = (self.tail + 1) % C;
        }

        if byte == b'\n' {
            self.line_starts[self.line_cursor] = self.head;
            self.line_cursor = (self.line_cursor + 1) % L;
            self.newlines += 1;
        }
    }

    /// Append every byte of `text` in order
    pub fn push_str(&mut self, text: &str) {
        for &byte in text.as_bytes() {
            self.push(byte);
        }
    }

    /// Drop all content
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Byte capacity
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Number of tracked line starts
    pub const fn max_lines(&self) -> usize {
        L
    }

    /// Resident bytes
    pub fn len(&self) -> usize {
        (self.head + C - self.tail) % C
    }

    /// Whether nothing is resident
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Completed lines resident, capped at `L`
    pub fn line_count(&self) -> usize {
        self.newlines.min(L)
    }

    /// Whether the line index is saturated
    pub fn is_line_index_full(&self) -> bool {
        self.line_count() == L
    }

    /// Resident bytes in order, as two slices (the second non-empty when
    /// the occupied range wraps)
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        self.range(self.tail, self.head)
    }

    /// Offset where the oldest line the index can reach begins
    ///
    /// With the index saturated this is the start recorded `L` newlines
    /// ago; otherwise it is the oldest resident byte.
    pub fn oldest_line_start(&self) -> usize {
        let count = self.line_count();
        if count == L {
            self.line_starts[(self.line_cursor + L - count) % L]
        } else {
            self.tail
        }
    }

    /// Lines from the oldest reachable one up to `head`
    ///
    /// Yields each complete line without its newline, then the trailing
    /// partial line (empty when the last byte written was a newline).
    pub fn lines(&self) -> Lines<'_, C, L> {
        Lines {
            buffer: self,
            pos: self.oldest_line_start(),
            done: false,
        }
    }

    fn range(&self, from: usize, to: usize) -> (&[u8], &[u8]) {
        if from <= to {
            (&self.storage[from..to], &[])
        } else {
            (&self.storage[from..], &self.storage[..to])
        }
    }
}

/// Bytes that never reach the log
fn is_discarded(byte: u8) -> bool {
    (byte < 0x20 && byte != b'\n') || byte == 0x7F
}

/// One log line, split where it wraps around the end of storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub first: &'a [u8],
    pub second: &'a [u8],
}

impl<'a> LogLine<'a> {
    /// Length in bytes
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes in order
    pub fn bytes(&self) -> impl Iterator<Item = u8> + 'a {
        self.first.iter().chain(self.second.iter()).copied()
    }

    /// Compare against a byte string
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.bytes().eq(other.iter().copied())
    }
}

/// Iterator over the lines of a [`LogBuffer`]
pub struct Lines<'a, const C: usize, const L: usize> {
    buffer: &'a LogBuffer<C, L>,
    pos: usize,
    done: bool,
}

impl<'a, const C: usize, const L: usize> Iterator for Lines<'a, C, L> {
    type Item = LogLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let buffer = self.buffer;
        let start = self.pos;
        let mut pos = start;
        while pos != buffer.head {
            if buffer.storage[pos] == b'\n' {
                let (first, second) = buffer.range(start, pos);
                self.pos = (pos + 1) % C;
                return Some(LogLine { first, second });
            }
            pos = (pos + 1) % C;
        }

        self.done = true;
        let (first, second) = buffer.range(start, buffer.head);
        Some(LogLine { first, second })
    }
}
