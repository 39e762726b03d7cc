mod error;
mod grammar;
mod parser;

pub use error::SyntaxError;
pub use parser::ParsedTree;

#[cfg(feature = "binary-cache")]
pub(crate) use parser::content_hash;

/// Parse decision-tree source text into a [`ParsedTree`].
///
/// Never fails: the first syntax error is recorded in
/// [`ParsedTree::error()`] and as the last fragment.
#[must_use]
pub fn parse(source: &str) -> ParsedTree {
    parser::parse_code(source)
}

/// Parse a tree assembled from several source pieces, joined by newlines.
#[must_use]
pub fn parse_sources(sources: &[&str]) -> ParsedTree {
    parser::parse_code(&sources.join("\n"))
}
