//! Source location tracking for graph elements.

use smol_str::SmolStr;

/// A span represents a byte range in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    pub fn empty(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Create a span covering two spans.
    pub fn merge(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where an element was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceInformation {
    /// Id of the source the element came from.
    pub source_id: SmolStr,
    pub span: Span,
    /// 1-based line of `span.start`.
    pub line: u32,
    /// 1-based column of `span.start`.
    pub column: u32,
}

impl SourceInformation {
    /// Build source information for a span of `text`, computing line and column.
    pub fn locate(source_id: impl Into<SmolStr>, text: &str, span: Span) -> Self {
        let offset = (span.start as usize).min(text.len());
        let before = text.get(..offset).unwrap_or_default();
        let line = before.matches('\n').count() as u32 + 1;
        let column = match before.rfind('\n') {
            Some(newline) => (offset - newline) as u32,
            None => offset as u32 + 1,
        };
        Self {
            source_id: source_id.into(),
            span,
            line,
            column,
        }
    }
}

impl std::fmt::Display for SourceInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.source_id, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_first_line() {
        let info = SourceInformation::locate("a.json", "abc def", Span::new(4, 7));
        assert_eq!(info.line, 1);
        assert_eq!(info.column, 5);
        assert_eq!(info.to_string(), "a.json:1:5");
    }

    #[test]
    fn test_locate_later_line() {
        let text = "{\n  \"x\": 1,\n  \"y\": 2\n}";
        let start = text.find("\"y\"").unwrap() as u32;
        let info = SourceInformation::locate("b.json", text, Span::new(start, start + 3));
        assert_eq!(info.line, 3);
        assert_eq!(info.column, 3);
    }

    #[test]
    fn test_span_merge() {
        let span = Span::new(4, 6).merge(Span::new(1, 5));
        assert_eq!(span, Span::new(1, 6));
        assert_eq!(span.len(), 5);
        assert!(span.contains(5));
        assert!(!span.contains(6));
        assert!(Span::empty(3).is_empty());
    }
}
