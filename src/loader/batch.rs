use crate::database::range::Span;

/// Contiguous, non-overlapping row windows covering `[first, last]`.
#[derive(Clone, Debug)]
pub struct BatchWindows {
    cursor: usize,
    last: usize,
    size: usize,
    done: bool,
}

impl BatchWindows {
    /// Windows of at most `size` rows; yields nothing when `first > last`.
    pub fn new(first: usize, last: usize, size: usize) -> Self {
        BatchWindows {
            cursor: first,
            last,
            size: size.max(1),
            done: first > last,
        }
    }
}

impl Iterator for BatchWindows {
    type Item = Span;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let to = self.cursor.saturating_add(self.size - 1).min(self.last);
        let window = Span::new(self.cursor, to);
        match to.checked_add(1) {
            Some(next) if next <= self.last => self.cursor = next,
            _ => self.done = true,
        }
        window
    }
}
