//! Comparison results and the paths that locate a difference.

use std::fmt;

/// One step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Runtime type name of the root value.
    Type(String),
    /// Struct or variant member label.
    Member(String),
    /// Sequence index.
    Index(usize),
    /// Map key.
    Key(String),
    /// Active enum case.
    Case(&'static str),
    /// Collection length.
    Count,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) | Self::Member(name) | Self::Key(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
            Self::Case(case) => f.write_str(case),
            Self::Count => f.write_str("count"),
        }
    }
}

/// Location of a difference inside a value graph, e.g. `Order.items.3.name`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// An empty path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `true` for the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The deepest segment.
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    pub(crate) fn with<R>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push(segment);
        let out = f(self);
        self.pop();
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// The first point where two values diverge.
///
/// `lhs` and `rhs` are rendered values; `None` means the value is absent
/// on that side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Difference {
    /// Where the values diverge.
    pub path: Path,
    /// Rendered left value, if present.
    pub lhs: Option<String>,
    /// Rendered right value, if present.
    pub rhs: Option<String>,
}

impl Difference {
    pub(crate) fn new(path: Path, lhs: Option<String>, rhs: Option<String>) -> Self {
        Self { path, lhs, rhs }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |value: &Option<String>| value.clone().unwrap_or_else(|| "nothing".into());
        write!(
            f,
            "{}: {} is not equal to {}",
            self.path,
            side(&self.lhs),
            side(&self.rhs)
        )
    }
}

/// Outcome of a structural comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// No difference found.
    Equal,
    /// The first difference found.
    Unequal(Difference),
}

impl Comparison {
    /// `true` for [`Comparison::Equal`].
    #[must_use]
    pub fn is_equal(&self) -> bool {
        matches!(self, Self::Equal)
    }

    /// The difference, if any.
    #[must_use]
    pub fn difference(&self) -> Option<&Difference> {
        match self {
            Self::Equal => None,
            Self::Unequal(difference) => Some(difference),
        }
    }
}

impl From<Option<Difference>> for Comparison {
    fn from(difference: Option<Difference>) -> Self {
        difference.map_or(Self::Equal, Self::Unequal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let mut path = Path::root();
        assert_eq!(path.to_string(), "<root>");

        path.push(Segment::Type("Order".into()));
        path.push(Segment::Member("items".into()));
        path.push(Segment::Index(3));
        path.push(Segment::Count);
        assert_eq!(path.to_string(), "Order.items.3.count");
    }

    #[test]
    fn test_path_with_restores() {
        let mut path = Path::root();
        path.push(Segment::Type("Status".into()));
        let inner = path.with(Segment::Case("active"), |path| path.to_string());
        assert_eq!(inner, "Status.active");
        assert_eq!(path.segments().len(), 1);
    }

    #[test]
    fn test_difference_display_absent_side() {
        let mut path = Path::root();
        path.push(Segment::Type("Vec<i32>".into()));
        path.push(Segment::Index(2));
        let difference = Difference::new(path, Some("3".into()), None);
        assert_eq!(difference.to_string(), "Vec<i32>.2: 3 is not equal to nothing");
    }
}
