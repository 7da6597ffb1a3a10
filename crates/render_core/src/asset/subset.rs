//! Drawable portions of an asset's geometry

use std::fmt;
use std::ops::Range;

/// Contiguous range of indices `[first, first + count)` in a geometry's index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexRange {
    /// First index
    pub first: u32,
    /// Number of indices
    pub count: u32,
}

impl IndexRange {
    /// Create a new index range
    pub const fn new(first: u32, count: u32) -> Self {
        Self { first, count }
    }

    /// One past the last index, widened so it cannot overflow
    pub fn end(&self) -> u64 {
        u64::from(self.first) + u64::from(self.count)
    }

    /// True when the range selects no indices
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl From<Range<u32>> for IndexRange {
    fn from(range: Range<u32>) -> Self {
        Self::new(range.start, range.end.saturating_sub(range.start))
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.first, self.end())
    }
}

/// How a subset names the surface model it is drawn with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceModelRef {
    /// Position in the asset's surface model list
    Index(usize),
    /// Surface model name; must match exactly one of the asset's models
    Named(String),
}

impl From<usize> for SurfaceModelRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for SurfaceModelRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for SurfaceModelRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for SurfaceModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Named(name) => write!(f, "'{name}'"),
        }
    }
}

/// A range of the asset's geometry drawn with one surface model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subset {
    /// Subset name, used in diagnostics
    pub name: String,
    /// Indices this subset draws
    pub range: IndexRange,
    /// Surface model to draw with
    pub surface_model: SurfaceModelRef,
}

impl Subset {
    /// Create a new subset
    pub fn new(
        name: impl Into<String>,
        range: impl Into<IndexRange>,
        surface_model: impl Into<SurfaceModelRef>,
    ) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            surface_model: surface_model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_conversion() {
        assert_eq!(IndexRange::from(10..25), IndexRange::new(10, 15));
        assert!(IndexRange::from(5..5).is_empty());
        // Reversed ranges collapse to empty instead of wrapping
        assert!(IndexRange::from(9..3).is_empty());
    }

    #[test]
    fn test_range_end_does_not_overflow() {
        let range = IndexRange::new(u32::MAX, u32::MAX);
        assert_eq!(range.end(), 2 * u64::from(u32::MAX));
        assert_eq!(IndexRange::new(0, 50).to_string(), "[0, 50)");
    }

    #[test]
    fn test_subset_builder() {
        let by_index = Subset::new("body", 0..36, 1);
        assert_eq!(by_index.surface_model, SurfaceModelRef::Index(1));

        let by_name = Subset::new("trim", 36..48, "chrome");
        assert_eq!(by_name.surface_model, SurfaceModelRef::Named("chrome".to_string()));
        assert_eq!(by_name.range.count, 12);
    }
}
