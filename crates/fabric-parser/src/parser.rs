//! Parser for Fabric source units.
//!
//! This module turns source text directly into the raw syntax tree defined in
//! [`parser_types`](super::parser_types). The public entry point is
//! [`parse_unit`]; errors are converted into a single [`Diagnostic`] pointing
//! at the position where parsing stopped.

use std::sync::Arc;

use winnow::{
    Parser as _,
    ascii::{digit1, line_ending, multispace1, till_line_ending},
    combinator::{alt, cut_err, eof, not, opt, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of},
};

use fabric_core::{
    block::{AttributeValue, Attributes, BlockKey, BlockKind},
    error::{Diagnostic, ErrorCode},
    span::{SourceLocation, Span},
};

use crate::parser_types::{RawAttribute, RawBlock, RawItem, Spanned};

/// Rich diagnostic information attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected at the error position
    Expected(&'static str),
    /// A committed construct that failed, with its own message
    Diagnostic(SyntaxDiagnostic),
}

type Input<'src> = LocatingSlice<&'src str>;
type IResult<O> = ModalResult<O, ContextError<Context>>;

fn syntax(
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
) -> Context {
    Context::Diagnostic(SyntaxDiagnostic {
        code: ErrorCode::E100,
        message,
        help,
        start,
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a line comment starting with `#` or `//`
fn comment(input: &mut Input<'_>) -> IResult<()> {
    preceded(alt(("#", "//")), till_line_ending)
        .void()
        .parse_next(input)
}

/// Skip whitespace and comments
fn ws(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., alt((multispace1.void(), comment))).parse_next(input)
}

/// Succeeds when the next character cannot continue an identifier
fn word_boundary(input: &mut Input<'_>) -> IResult<()> {
    not(one_of(is_ident_char)).parse_next(input)
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        winnow::token::take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

fn block_kind(input: &mut Input<'_>) -> IResult<BlockKind> {
    terminated(
        alt(("document", "section", "content", "data")),
        word_boundary,
    )
    .try_map(str::parse::<BlockKind>)
    .parse_next(input)
}

/// Parse an escape sequence after the backslash.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let start = input.current_token_start();
    preceded(
        '\\',
        cut_err(
            one_of(['n', 'r', 't', '\\', '"', '0'])
                .map(|c| match c {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '0' => '\0',
                    other => other,
                })
                .context(syntax(
                    "invalid escape sequence",
                    Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`, `\\0`"),
                    start,
                )),
        ),
    )
    .parse_next(input)
}

/// Parse a double-quoted string literal. Strings may span lines.
fn string_literal(input: &mut Input<'_>) -> IResult<String> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    let content = repeat(0.., alt((string_escape, none_of(['"', '\\'])))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    cut_err(terminated(content, '"'))
        .context(syntax(
            "unterminated string literal",
            Some("add closing `\"`"),
            start,
        ))
        .parse_next(input)
}

/// Parse a heredoc: `<<TAG` or `<<-TAG` (indentation stripped), body lines,
/// then a line holding only `TAG`.
fn heredoc(input: &mut Input<'_>) -> IResult<String> {
    let start = input.current_token_start();
    "<<".parse_next(input)?;
    let strip_indent = opt('-').parse_next(input)?.is_some();

    let tag = cut_err(terminated(identifier, (till_line_ending, line_ending)))
        .context(syntax(
            "invalid heredoc header",
            Some("write `<<TAG` followed by a line break"),
            start,
        ))
        .parse_next(input)?;

    let rest: &str = input.peek_finish();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if content.trim() == tag {
            let body = &rest[..offset];
            let _ = input.next_slice(offset + content.len());
            return Ok(heredoc_body(body, strip_indent));
        }
        offset += line.len();
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        syntax(
            "unterminated heredoc",
            Some("close the heredoc with a line containing only its tag"),
            start,
        ),
    )))
}

fn heredoc_body(body: &str, strip_indent: bool) -> String {
    let body = body.strip_suffix('\n').unwrap_or(body);
    let body = body.strip_suffix('\r').unwrap_or(body);
    if !strip_indent {
        return body.to_string();
    }

    let indent = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    body.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn number(input: &mut Input<'_>) -> IResult<f64> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn boolean(input: &mut Input<'_>) -> IResult<bool> {
    terminated(alt(("true", "false")), word_boundary)
        .map(|word: &str| word == "true")
        .parse_next(input)
}

/// Parse a bare block reference such as `content.text.intro`.
fn reference(input: &mut Input<'_>) -> IResult<BlockKey> {
    let start = input.current_token_start();
    let path = (identifier, repeat::<_, _, (), _, _>(1.., ('.', identifier)))
        .take()
        .parse_next(input)?;

    path.parse::<BlockKey>().map_err(|_| {
        ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            Context::Diagnostic(SyntaxDiagnostic {
                code: ErrorCode::E101,
                message: "invalid reference path",
                help: Some(
                    "references look like `content.<type>.<name>`, `data.<type>.<name>` or `section.<name>`",
                ),
                start,
            }),
        ))
    })
}

fn separator(input: &mut Input<'_>) -> IResult<()> {
    (ws, opt(','), ws).void().parse_next(input)
}

fn list(input: &mut Input<'_>) -> IResult<Vec<AttributeValue>> {
    let start = input.current_token_start();
    '['.parse_next(input)?;
    cut_err(preceded(
        ws,
        terminated(repeat(0.., terminated(value, separator)), ']'),
    ))
    .context(syntax(
        "unterminated list",
        Some("separate items with `,` and close the list with `]`"),
        start,
    ))
    .parse_next(input)
}

fn map_entry(input: &mut Input<'_>) -> IResult<(String, AttributeValue)> {
    let key = alt((identifier.map(str::to_string), string_literal)).parse_next(input)?;
    (ws, '=', ws).parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    Ok((key, value))
}

fn map_value(input: &mut Input<'_>) -> IResult<Attributes> {
    let start = input.current_token_start();
    '{'.parse_next(input)?;
    let entries = repeat(0.., terminated(map_entry, separator)).fold(
        Attributes::new,
        |mut acc, (key, value)| {
            acc.insert(key, value);
            acc
        },
    );
    cut_err(preceded(ws, terminated(entries, '}')))
        .context(syntax(
            "unterminated map",
            Some("write entries as `key = value` and close the map with `}`"),
            start,
        ))
        .parse_next(input)
}

fn value(input: &mut Input<'_>) -> IResult<AttributeValue> {
    alt((
        string_literal.map(AttributeValue::String),
        heredoc.map(AttributeValue::String),
        list.map(AttributeValue::List),
        map_value.map(AttributeValue::Map),
        number.map(AttributeValue::Number),
        boolean.map(AttributeValue::Bool),
        reference.map(AttributeValue::Reference),
    ))
    .context(Context::Expected("value"))
    .parse_next(input)
}

/// Parse `name = value`
fn attribute<'src>(input: &mut Input<'src>) -> IResult<RawAttribute<'src>> {
    let start = input.current_token_start();
    let (name, name_span) = identifier.with_span().parse_next(input)?;
    (ws, '=', ws).parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    let end = input.current_token_start();

    Ok(RawAttribute {
        name: Spanned::new(name, Span::new(name_span)),
        value,
        span: Span::new(start..end),
    })
}

/// Parse `config { ... }` or `meta { ... }`
fn attribute_group<'src>(input: &mut Input<'src>) -> IResult<RawItem<'src>> {
    let start = input.current_token_start();
    let group = terminated(alt(("config", "meta")), (word_boundary, ws, '{')).parse_next(input)?;

    let attributes = cut_err(preceded(
        ws,
        terminated(repeat(0.., terminated(attribute, ws)), '}'),
    ))
    .context(syntax(
        "unterminated attribute block",
        Some("only `name = value` attributes are allowed here; close the block with `}`"),
        start,
    ))
    .parse_next(input)?;

    Ok(if group == "config" {
        RawItem::Config(attributes)
    } else {
        RawItem::Meta(attributes)
    })
}

fn item<'src>(input: &mut Input<'src>) -> IResult<RawItem<'src>> {
    alt((
        attribute.map(RawItem::Attribute),
        attribute_group,
        block.map(RawItem::Block),
    ))
    .parse_next(input)
}

fn body<'src>(input: &mut Input<'src>) -> IResult<Vec<RawItem<'src>>> {
    '{'.context(Context::Expected("`{`")).parse_next(input)?;
    ws.parse_next(input)?;
    let items = repeat(0.., terminated(item, ws)).parse_next(input)?;
    '}'.context(Context::Expected("attribute, nested block or `}`"))
        .parse_next(input)?;
    Ok(items)
}

/// Parse a block: `<kind> [type] ["name"] { ... }`
fn block<'src>(input: &mut Input<'src>) -> IResult<RawBlock<'src>> {
    let start = input.current_token_start();
    let (kind, kind_span) = block_kind.with_span().parse_next(input)?;

    // The kind keyword commits to a block.
    cut_err(|input: &mut Input<'src>| -> IResult<RawBlock<'src>> {
        ws.parse_next(input)?;
        let block_type = opt(terminated(identifier.with_span(), ws)).parse_next(input)?;
        let name = opt(terminated(string_literal.with_span(), ws)).parse_next(input)?;
        let items = body.parse_next(input)?;
        let end = input.current_token_start();

        Ok(RawBlock {
            kind: Spanned::new(kind, Span::new(kind_span.clone())),
            block_type: block_type.map(|(value, span)| Spanned::new(value, Span::new(span))),
            name: name.map(|(value, span)| Spanned::new(value, Span::new(span))),
            items,
            span: Span::new(start..end),
        })
    })
    .parse_next(input)
}

/// Convert a winnow error into a diagnostic located in `unit`.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    position: usize,
    source: &str,
    unit: &Arc<str>,
) -> Diagnostic {
    let char_len = source
        .get(position..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8);
    let location = |start: usize, end: usize| {
        SourceLocation::new(unit.clone(), Span::new(start.min(end)..end))
    };

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let committed = e.context().find_map(|ctx| match ctx {
                Context::Diagnostic(diag) => Some(diag.clone()),
                Context::Expected(_) => None,
            });

            if let Some(diag) = committed {
                let mut diagnostic = Diagnostic::error(diag.message)
                    .with_code(diag.code)
                    .with_label(location(diag.start, position + char_len), diag.message);
                if let Some(help) = diag.help {
                    diagnostic = diagnostic.with_help(help);
                }
                return diagnostic;
            }

            let expected: Vec<&str> = e
                .context()
                .filter_map(|ctx| match ctx {
                    Context::Expected(label) => Some(*label),
                    Context::Diagnostic(_) => None,
                })
                .collect();

            let message = if expected.is_empty() {
                "unexpected input".to_string()
            } else {
                format!("unexpected input: expected {}", expected.join(" or "))
            };

            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(location(position, position + char_len), "unexpected input")
                .with_help("check the block syntax near this position")
        }
        ErrMode::Incomplete(_) => Diagnostic::error("incomplete input")
            .with_code(ErrorCode::E100)
            .with_label(location(position, position), "input ends here"),
    }
}

/// Parse all top-level blocks of one source unit.
pub(crate) fn parse_unit<'src>(
    unit: &Arc<str>,
    source: &'src str,
) -> Result<Vec<RawBlock<'src>>, Diagnostic> {
    let mut input = LocatingSlice::new(source);

    let result: IResult<Vec<RawBlock<'src>>> = preceded(
        ws,
        terminated(
            repeat(0.., terminated(block, ws)),
            eof.context(Context::Expected("block definition")),
        ),
    )
    .parse_next(&mut input);

    result.map_err(|err| convert_error(err, input.current_token_start(), source, unit))
}
