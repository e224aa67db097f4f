use std::fmt;

/// A segment in a path through the aggregation tree.
///
/// Paths name every node of the tree (its qualified name) and are used to
/// look nodes up after records have been evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Child of a namespace by name, or a flow bin of a binning
    ///
    /// # Examples
    /// - `count 'events'` → `Field("events")`
    /// - the underflow bin of any binning → `Field("underflow")`
    Field(String),

    /// Bin of a binning by index
    ///
    /// # Examples
    /// - `[Field("pt"), Index(0)]` is the first bin of the `pt` histogram
    /// - `Index(-1)` selects the underflow bin and `Index(numbins)` the overflow
    Index(i64),
}

/// A sequence of path segments leading from the root namespace to a node.
///
/// For `region 'central' by regular(10, 0, 100) <- pt { count 'events' }`,
/// the counter of the third bin has the path
/// - `PathSegment::Field("central")`
/// - `PathSegment::Index(2)`
/// - `PathSegment::Field("events")`
pub type Path = Vec<PathSegment>;

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<i64> for PathSegment {
    fn from(index: i64) -> Self {
        PathSegment::Index(index)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index as i64)
    }
}

/// Build a path from anything convertible into segments.
///
/// ```
/// use adl_lang::path::{path, PathSegment};
///
/// assert_eq!(
///     path(["central"]).into_iter().chain(path([3i64])).collect::<Vec<_>>(),
///     vec![PathSegment::Field("central".into()), PathSegment::Index(3)]
/// );
/// ```
pub fn path<S: Into<PathSegment>>(segments: impl IntoIterator<Item = S>) -> Path {
    segments.into_iter().map(Into::into).collect()
}

/// Parse a `/`-separated path as written on the command line.
///
/// Segments that parse as integers select bins; everything else is a name.
///
/// # Examples
/// - `central/2/events` → `[Field("central"), Index(2), Field("events")]`
/// - `pt/overflow` → `[Field("pt"), Field("overflow")]`
/// - the empty string is the root
pub fn parse_path(text: &str) -> Path {
    text.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.parse::<i64>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Field(segment.to_string()),
        })
        .collect()
}

/// Render a path the way [`parse_path`] reads it.
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("central/2/events"),
            vec![
                PathSegment::Field("central".into()),
                PathSegment::Index(2),
                PathSegment::Field("events".into()),
            ]
        );
        assert_eq!(parse_path("pt/-1"), vec!["pt".into(), PathSegment::Index(-1)]);
        assert!(parse_path("").is_empty());
        assert!(parse_path("/").is_empty());
    }

    #[test]
    fn test_format_round_trips() {
        let text = "a/0/underflow";
        assert_eq!(format_path(&parse_path(text)), text);
    }
}
