use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, rest, take_while};

use crate::types::{CompareOp, JoinMode, LeafCond, NumBounds, Value};

/// Condition expression as written, with the source slice of every leaf.
#[derive(Debug)]
pub(crate) enum Expr<'i> {
    Leaf(LeafCond, &'i str),
    And(Vec<Expr<'i>>),
    Or(Vec<Expr<'i>>),
    Not(Box<Expr<'i>>),
}

/// One statement of a decision tree.
#[derive(Debug)]
pub(crate) enum Stmt<'i> {
    Import(Vec<String>),
    If {
        cond: Expr<'i>,
        text: &'i str,
        /// Text written after the colon on the `if` line.
        body: Option<&'i str>,
    },
    Return(bool),
}

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "all", "if", "import", "return", "True", "False",
];

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & keywords -------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .verify(|name: &str| !KEYWORDS.contains(&name))
        .parse_next(input)
}

fn keyword<'i>(kw: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    terminated(kw, not(one_of(is_ident_char)))
}

// -- Literals ---------------------------------------------------------------

/// Double- or single-quoted string. The closing quote must match the opening one.
fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            _ if ch == quote => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' | '\'' | '\\' => s.push(esc),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

/// Decimal number with optional sign, fraction and exponent. Returns the
/// value and its text.
fn number<'i>(input: &mut &'i str) -> ModalResult<(f64, &'i str)> {
    (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>().map(|v| (v, s)))
        .parse_next(input)
}

fn numeric_value(value: f64, raw: &str) -> Value {
    if raw.contains(['.', 'e', 'E']) {
        return Value::Float(value);
    }
    raw.parse::<i64>().map_or(Value::Float(value), Value::Int)
}

fn set_item(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    alt((
        string_literal,
        ident.map(str::to_owned),
        number.map(|(_, raw)| raw.to_owned()),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "set item",
    )))
    .parse_next(input)
}

fn variant_set(input: &mut &str) -> ModalResult<Vec<String>> {
    ws.parse_next(input)?;
    '{'.parse_next(input)?;
    cut_err(terminated(
        separated(1.., set_item, (ws, ',')),
        (opt((ws, ',')), ws, '}'),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "variant set",
    )))
    .parse_next(input)
}

fn arg_value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        keyword("True").value(Value::Bool(true)),
        keyword("False").value(Value::Bool(false)),
        variant_set.map(Value::List),
        number.map(|(v, raw)| numeric_value(v, raw)),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "argument",
    )))
    .parse_next(input)
}

// -- Operators --------------------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    alt((
        ">=".value(CompareOp::Gte),
        ">".value(CompareOp::Gt),
        "<=".value(CompareOp::Lte),
        "<".value(CompareOp::Lt),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
    ))
    .parse_next(input)
}

/// `<` or `<=`; the flag tells whether the bound is inclusive.
fn lower_op(input: &mut &str) -> ModalResult<bool> {
    alt(("<=".value(true), "<".value(false))).parse_next(input)
}

/// `in {..}`, `in all {..}` or `not in {..}`.
fn membership(input: &mut &str) -> ModalResult<(JoinMode, Vec<String>)> {
    let negated = opt(terminated(keyword("not"), ws))
        .parse_next(input)?
        .is_some();
    keyword("in").parse_next(input)?;
    ws.parse_next(input)?;
    let all = !negated && opt(keyword("all")).parse_next(input)?.is_some();
    let variants = cut_err(variant_set).parse_next(input)?;
    let mode = if negated {
        JoinMode::Not
    } else if all {
        JoinMode::And
    } else {
        JoinMode::Or
    };
    Ok((mode, variants))
}

// -- Leaf conditions --------------------------------------------------------

/// Leaf starting with a unit name: enum, function or numeric comparison.
/// The flag is set for `!=`, which is the negation of `==`.
fn unit_leaf(input: &mut &str) -> ModalResult<(LeafCond, bool)> {
    let unit = ident.parse_next(input)?.to_owned();
    let params: Option<Vec<Value>> = opt(preceded(
        (ws, '('),
        cut_err(terminated(separated(0.., arg_value, (ws, ',')), (ws, ')'))),
    ))
    .parse_next(input)?;
    ws.parse_next(input)?;

    if let Some(params) = params {
        let (mode, variants) = cut_err(membership)
            .context(StrContext::Expected(StrContextValue::StringLiteral("in")))
            .parse_next(input)?;
        let leaf = LeafCond::Func {
            unit,
            params,
            mode,
            variants,
        };
        return Ok((leaf, false));
    }

    if let Some((mode, variants)) = opt(membership).parse_next(input)? {
        return Ok((
            LeafCond::Enum {
                unit,
                mode,
                variants,
            },
            false,
        ));
    }

    let op = cut_err(compare_op)
        .context(StrContext::Expected(StrContextValue::Description(
            "`in` or a comparison",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let (value, _) = cut_err(number)
        .context(StrContext::Expected(StrContextValue::Description("number")))
        .parse_next(input)?;
    let (op, negated) = match op {
        CompareOp::Neq => (CompareOp::Eq, true),
        other => (other, false),
    };
    let bounds = NumBounds::from_compare(op, value)
        .ok_or_else(|| ErrMode::from_input(input).cut())?;
    Ok((LeafCond::Numeric { unit, bounds }, negated))
}

/// `min < Unit` or `min <= Unit < max` style range.
fn range_leaf(input: &mut &str) -> ModalResult<(LeafCond, bool)> {
    let (min, _) = number.parse_next(input)?;
    ws.parse_next(input)?;
    let min_eq = cut_err(lower_op)
        .context(StrContext::Expected(StrContextValue::Description("`<` or `<=`")))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let unit = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description("unit name")))
        .parse_next(input)?
        .to_owned();
    let upper = opt(preceded(
        ws,
        (lower_op, preceded(ws, cut_err(number))),
    ))
    .parse_next(input)?;
    let (max, max_eq) = match upper {
        Some((max_eq, (max, _))) => (Some(max), max_eq),
        None => (None, false),
    };
    let bounds = NumBounds {
        min: Some(min),
        min_eq,
        max,
        max_eq,
    };
    Ok((LeafCond::Numeric { unit, bounds }, false))
}

fn leaf<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    let ((cond, negated), text) = alt((unit_leaf, range_leaf)).with_taken().parse_next(input)?;
    let leaf = Expr::Leaf(cond, text);
    Ok(if negated {
        Expr::Not(Box::new(leaf))
    } else {
        leaf
    })
}

// -- Expressions (precedence: or < and < not < primary) ---------------------

fn primary<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    alt((
        preceded('(', cut_err(terminated(expr, (ws, ')')))),
        leaf,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "condition",
    )))
    .parse_next(input)
}

fn unary<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    ws.parse_next(input)?;
    if opt(keyword("not")).parse_next(input)?.is_some() {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        primary(input)
    }
}

fn and_expr<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    let first = unary(input)?;
    let mut rest: Vec<Expr<'i>> =
        repeat(0.., preceded((ws, keyword("and")), cut_err(unary))).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    rest.insert(0, first);
    Ok(Expr::And(rest))
}

fn or_expr<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    let first = and_expr(input)?;
    let mut rest: Vec<Expr<'i>> =
        repeat(0.., preceded((ws, keyword("or")), cut_err(and_expr))).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    rest.insert(0, first);
    Ok(Expr::Or(rest))
}

fn expr<'i>(input: &mut &'i str) -> ModalResult<Expr<'i>> {
    ws.parse_next(input)?;
    or_expr(input)
}

// -- Statements -------------------------------------------------------------

fn import_stmt<'i>(input: &mut &'i str) -> ModalResult<Stmt<'i>> {
    keyword("import").parse_next(input)?;
    let names: Vec<&str> = cut_err(separated(1.., preceded(ws, ident), (ws, ',')))
        .context(StrContext::Expected(StrContextValue::Description(
            "unit name",
        )))
        .parse_next(input)?;
    Ok(Stmt::Import(names.into_iter().map(str::to_owned).collect()))
}

fn if_stmt<'i>(input: &mut &'i str) -> ModalResult<Stmt<'i>> {
    keyword("if").parse_next(input)?;
    ws.parse_next(input)?;
    let (cond, text) = cut_err(expr.with_taken()).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(':')
        .context(StrContext::Expected(StrContextValue::CharLiteral(':')))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let body: &str = rest.parse_next(input)?;
    Ok(Stmt::If {
        cond,
        text: text.trim_end(),
        body: (!body.is_empty()).then_some(body),
    })
}

fn return_stmt<'i>(input: &mut &'i str) -> ModalResult<Stmt<'i>> {
    keyword("return").parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(alt((
        keyword("True").value(true),
        keyword("False").value(false),
    )))
    .context(StrContext::Expected(StrContextValue::Description(
        "True or False",
    )))
    .map(Stmt::Return)
    .parse_next(input)
}

/// A single complete statement, surrounding whitespace and comments included.
pub(crate) fn statement<'i>(input: &mut &'i str) -> ModalResult<Stmt<'i>> {
    ws.parse_next(input)?;
    let stmt = alt((import_stmt, if_stmt, return_stmt))
        .context(StrContext::Label("statement"))
        .context(StrContext::Expected(StrContextValue::Description(
            "import, if or return",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    Ok(stmt)
}
