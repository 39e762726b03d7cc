use serde::{Deserialize, Serialize};
use winnow::error::{ContextError, ParseError};
use winnow::stream::Offset;
use winnow::Parser;

use crate::types::{CondData, Fragment, Instr, LineSpan, Marker, MarkerLoc};

use super::error::SyntaxError;
use super::grammar::{self, Expr, Stmt};

/// The result of parsing decision-tree source text.
///
/// Parsing never fails outright: the first syntax error is recorded and
/// becomes the last fragment, so a broken tree can still be inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTree {
    pub(crate) code: String,
    pub(crate) hash: String,
    pub(crate) error: Option<SyntaxError>,
    pub(crate) fragments: Vec<Fragment>,
}

impl ParsedTree {
    /// Normalized source text.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// BLAKE3 hex digest of [`code()`](Self::code).
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn error(&self) -> Option<&SyntaxError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Lines of the normalized code, for slicing fragment text.
    #[must_use]
    pub fn code_lines(&self) -> Vec<&str> {
        self.code.lines().collect()
    }
}

#[cfg(feature = "binary-cache")]
impl ParsedTree {
    /// Serialize this parsed tree to a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self)
    }

    /// Deserialize a parsed tree previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this parsed tree and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), crate::serial::SerializeError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a file and deserialize the parsed tree it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Line endings unified, trailing whitespace and trailing blank lines dropped.
pub(crate) fn normalize(source: &str) -> String {
    let mut lines: Vec<&str> = source.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

pub(crate) fn content_hash(code: &str) -> String {
    blake3::hash(code.as_bytes()).to_hex().to_string()
}

pub(crate) fn parse_code(source: &str) -> ParsedTree {
    let code = normalize(source);
    let hash = content_hash(&code);
    let (fragments, error) = TreeParser::new(&code).run();
    ParsedTree {
        code,
        hash,
        error,
        fragments,
    }
}

/// Byte offsets of line starts, for mapping offsets to 1-based positions.
struct LineIndex<'c> {
    code: &'c str,
    starts: Vec<usize>,
}

impl<'c> LineIndex<'c> {
    fn new(code: &'c str) -> Self {
        let starts = std::iter::once(0)
            .chain(code.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { code, starts }
    }

    fn line_count(&self) -> usize {
        self.starts.len()
    }

    fn line(&self, no: usize) -> &'c str {
        let start = self.starts[no - 1];
        let end = self
            .starts
            .get(no)
            .map_or(self.code.len(), |&next| next - 1);
        &self.code[start..end]
    }

    /// 1-based (line, column) of a byte offset. Columns count characters.
    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let col = self.code[self.starts[line - 1]..offset].chars().count() + 1;
        (line, col)
    }
}

/// Source lines forming one statement, with its indentation.
struct Statement<'c> {
    start_line: usize,
    end_line: usize,
    indent: &'c str,
    text: &'c str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Top level: any instruction.
    Any,
    /// Right after an `if`: its indented `return`.
    Body,
    /// After a top-level `return`: nothing.
    Nothing,
}

struct TreeParser<'c> {
    code: &'c str,
    index: LineIndex<'c>,
}

impl<'c> TreeParser<'c> {
    fn new(code: &'c str) -> Self {
        Self {
            code,
            index: LineIndex::new(code),
        }
    }

    fn run(&self) -> (Vec<Fragment>, Option<SyntaxError>) {
        let mut fragments = Vec::new();
        let mut expect = Expect::Any;
        let end_of_code = self.index.line_count() + 1;

        for stmt in self.statements() {
            match self.fragment(&stmt, expect) {
                Ok((fragment, next)) => {
                    fragments.push(fragment);
                    expect = next;
                }
                Err(err) => {
                    let span = LineSpan {
                        start: stmt.start_line,
                        end: end_of_code,
                    };
                    fragments.push(Fragment::new(Instr::Error(err.clone()), 0, span));
                    return (fragments, Some(err));
                }
            }
        }

        if expect == Expect::Body {
            let last = self.index.line_count();
            let err = SyntaxError::new(
                "unexpected end of code: if requires an indented return",
                last,
                self.index.line(last).chars().count() + 1,
            );
            let span = LineSpan {
                start: end_of_code,
                end: end_of_code,
            };
            fragments.push(Fragment::new(Instr::Error(err.clone()), 0, span));
            return (fragments, Some(err));
        }
        (fragments, None)
    }

    /// Split the code into statements. Blank and comment-only lines between
    /// statements are skipped; a statement continues while brackets are open.
    fn statements(&self) -> Vec<Statement<'c>> {
        let total = self.index.line_count();
        let mut out = Vec::new();
        let mut no = 1;
        while no <= total {
            let line = self.index.line(no);
            let content = line.trim_start();
            if content.is_empty() || content.starts_with('#') {
                no += 1;
                continue;
            }
            let start_line = no;
            let mut depth = 0_i64;
            loop {
                depth += bracket_delta(self.index.line(no));
                no += 1;
                if depth <= 0 || no > total {
                    break;
                }
            }
            let start = self.index.starts[start_line - 1];
            let end = self.index.starts[no - 2] + self.index.line(no - 1).len();
            out.push(Statement {
                start_line,
                end_line: no,
                indent: &line[..line.len() - content.len()],
                text: &self.code[start..end],
            });
        }
        out
    }

    fn fragment(
        &self,
        stmt: &Statement<'c>,
        expect: Expect,
    ) -> Result<(Fragment, Expect), SyntaxError> {
        let line = stmt.start_line;
        let col = stmt.indent.chars().count() + 1;
        if let Some(pos) = stmt.indent.find('\t') {
            return Err(SyntaxError::new("tab in indentation", line, pos + 1));
        }
        let indented = !stmt.indent.is_empty();
        match expect {
            Expect::Nothing => {
                return Err(SyntaxError::new("instructions after final return", line, col));
            }
            Expect::Any if indented => {
                return Err(SyntaxError::new("unexpected indent", line, 1));
            }
            Expect::Body if !indented => {
                return Err(SyntaxError::new(
                    "expected an indented return after if",
                    line,
                    1,
                ));
            }
            _ => {}
        }

        let parsed = grammar::statement
            .parse(stmt.text)
            .map_err(|err| self.syntax_error(stmt, &err))?;
        let lines = LineSpan {
            start: stmt.start_line,
            end: stmt.end_line,
        };

        Ok(match (expect, parsed) {
            (Expect::Body, Stmt::Return(decision)) => (
                Fragment::new(Instr::Return { decision }, 1, lines),
                Expect::Any,
            ),
            (Expect::Body, _) => {
                return Err(SyntaxError::new(
                    "only a return instruction may form an if body",
                    line,
                    col,
                ));
            }
            (_, Stmt::Return(decision)) => (
                Fragment::new(Instr::Return { decision }, 0, lines),
                Expect::Nothing,
            ),
            (_, Stmt::Import(entries)) => (
                Fragment::new(Instr::Import { entries }, 0, lines),
                Expect::Any,
            ),
            (_, Stmt::If { body: Some(body), .. }) => {
                let (line, col) = self.index.position(body.offset_from(&self.code));
                return Err(SyntaxError::new(
                    "if body must be on its own indented line",
                    line,
                    col,
                ));
            }
            (_, Stmt::If { cond, text, .. }) => {
                let mut markers = Vec::new();
                let cond_data = self.lower(cond, &mut markers);
                let instr = Instr::If {
                    cond_text: text.to_owned(),
                    cond_data,
                    markers,
                };
                (Fragment::new(instr, 0, lines), Expect::Body)
            }
        })
    }

    fn syntax_error(
        &self,
        stmt: &Statement<'c>,
        err: &ParseError<&'c str, ContextError>,
    ) -> SyntaxError {
        let offset = stmt.text.offset_from(&self.code) + err.offset();
        let (line, col) = self.index.position(offset);
        let message = err.inner().to_string().replace('\n', "; ");
        let message = if message.is_empty() {
            "invalid syntax".to_owned()
        } else {
            message
        };
        SyntaxError::new(message, line, col)
    }

    fn lower(&self, expr: Expr<'c>, markers: &mut Vec<Marker>) -> CondData {
        match expr {
            Expr::Leaf(cond, text) => {
                let start = text.offset_from(&self.code);
                let (line, start_col) = self.index.position(start);
                let (end_line, end_col) = self.index.position(start + text.len());
                markers.push(Marker {
                    cond: cond.clone(),
                    loc: MarkerLoc {
                        line,
                        start_col,
                        end_line,
                        end_col,
                    },
                });
                CondData::Leaf(cond)
            }
            Expr::And(items) => {
                CondData::And(items.into_iter().map(|e| self.lower(e, markers)).collect())
            }
            Expr::Or(items) => {
                CondData::Or(items.into_iter().map(|e| self.lower(e, markers)).collect())
            }
            Expr::Not(inner) => CondData::Not(Box::new(self.lower(*inner, markers))),
        }
    }
}

/// Net count of opening brackets on a line, ignoring strings and comments.
fn bracket_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in line.chars() {
        if let Some(open) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == open => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => break,
            '(' | '{' | '[' => delta += 1,
            ')' | '}' | ']' => delta -= 1,
            _ => {}
        }
    }
    delta
}
