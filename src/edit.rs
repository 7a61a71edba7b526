use std::ops::Range;

/// The fundamental edit primitive: replace one byte span of a document.
///
/// Both patch operations compile down to this. A replace splices over the
/// needle's span; an insertion splices into the empty span at the anchor's
/// start. Intelligence lives in locating the span, not in applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Splice does nothing until apply() is called"]
pub struct Splice {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to place at [byte_start, byte_end)
    pub new_text: String,
}

impl Splice {
    /// Replace the text at `span` with `new_text`.
    pub fn replace(span: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            byte_start: span.start,
            byte_end: span.end,
            new_text: new_text.into(),
        }
    }

    /// Insert `new_text` at `offset`, keeping everything around it.
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self::replace(offset..offset, new_text)
    }

    /// Whether `content` can take this splice: the span is ordered, in range,
    /// and both ends fall on UTF-8 character boundaries.
    pub fn fits(&self, content: &str) -> bool {
        self.byte_start <= self.byte_end
            && self.byte_end <= content.len()
            && content.is_char_boundary(self.byte_start)
            && content.is_char_boundary(self.byte_end)
    }

    /// Produce a new document with the span replaced.
    ///
    /// Returns `None` if the splice does not [fit](Self::fits) `content`.
    pub fn apply(&self, content: &str) -> Option<String> {
        if !self.fits(content) {
            return None;
        }

        let mut out = String::with_capacity(
            content.len() - (self.byte_end - self.byte_start) + self.new_text.len(),
        );
        out.push_str(&content[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&content[self.byte_end..]);
        Some(out)
    }

    /// Net change in document length, in bytes.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - (self.byte_end - self.byte_start) as isize
    }
}
