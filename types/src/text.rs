//! Text selection shared by the text bridge and consumer events.

/// A selection measured in characters (Unicode scalar values).
///
/// `start == end` is a caret. `start > end` is allowed: input methods report
/// backwards selections and the consumer receives them unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[must_use]
    pub const fn is_caret(self) -> bool {
        self.start == self.end
    }

    /// `(low, high)` regardless of direction.
    #[must_use]
    pub fn ordered(self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }

    /// Clamp both ends to `len`.
    #[must_use]
    pub fn clamp(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_handles_backwards_selection() {
        assert_eq!(Selection::new(5, 2).ordered(), (2, 5));
        assert_eq!(Selection::new(2, 5).ordered(), (2, 5));
    }

    #[test]
    fn test_clamp_to_buffer_length() {
        assert_eq!(Selection::new(3, 10).clamp(4), Selection::new(3, 4));
        assert!(Selection::caret(7).clamp(2).is_caret());
    }
}
