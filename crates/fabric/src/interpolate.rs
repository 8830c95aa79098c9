//! `${...}` interpolation in text content.
//!
//! The expression between `${` and `}` is handed to an [`Evaluator`]. The
//! default [`PathEvaluator`] understands dotted paths into the data context,
//! with `[n]` indexing into lists: `${people[0].name}`.

use serde_json::Value;
use winnow::{
    Parser as _,
    ascii::dec_uint,
    combinator::{alt, cut_err, preceded, repeat, separated, terminated},
    error::{ContextError, ModalResult, StrContext},
    token::{rest, take_until, take_while},
};

use crate::{data::DataContext, plugin::value_to_text};

type PResult<O> = ModalResult<O, ContextError<StrContext>>;

/// Evaluates one interpolation expression against the data context.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, data: &DataContext) -> Result<String, String>;
}

/// Resolves `name.field[0].field` paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

#[derive(Debug, PartialEq)]
enum Segment<'e> {
    Field(&'e str),
    Index(usize),
}

fn is_field_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// `[n]`; once the bracket is open, anything but a closed index is an error.
fn index(input: &mut &str) -> PResult<usize> {
    preceded(
        '[',
        cut_err(terminated(dec_uint::<_, usize, _>, ']')).context(StrContext::Label("index")),
    )
    .parse_next(input)
}

/// A field followed by any number of indexes: `langs[0][1]`.
fn step<'e>(input: &mut &'e str) -> PResult<(&'e str, Vec<usize>)> {
    (take_while(1.., is_field_char), repeat(0.., index)).parse_next(input)
}

fn parse_path(expression: &str) -> Result<Vec<Segment<'_>>, String> {
    let steps: Vec<(&str, Vec<usize>)> = separated(1.., step, '.')
        .parse(expression)
        .map_err(|err| match err.inner().context().next() {
            Some(StrContext::Label(label)) => format!("invalid {label} in `{expression}`"),
            _ => format!("invalid path `{expression}`"),
        })?;

    Ok(steps
        .into_iter()
        .flat_map(|(field, indexes)| {
            std::iter::once(Segment::Field(field)).chain(indexes.into_iter().map(Segment::Index))
        })
        .collect())
}

impl Evaluator for PathEvaluator {
    fn evaluate(&self, expression: &str, data: &DataContext) -> Result<String, String> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err("empty expression".to_string());
        }

        let segments = parse_path(expression)?;
        let mut segments = segments.iter();
        let Some(Segment::Field(name)) = segments.next() else {
            return Err(format!("invalid path `{expression}`"));
        };
        let mut value: &Value = data
            .get(name)
            .ok_or_else(|| format!("no data named `{name}`"))?;

        for segment in segments {
            value = match segment {
                Segment::Field(field) => value
                    .get(*field)
                    .ok_or_else(|| format!("`{expression}`: no field `{field}`"))?,
                Segment::Index(index) => value
                    .get(*index)
                    .ok_or_else(|| format!("`{expression}`: index {index} out of range"))?,
            };
        }

        Ok(value_to_text(value))
    }
}

#[derive(Debug, PartialEq)]
enum Piece<'t> {
    Literal(&'t str),
    Expression(&'t str),
}

fn piece<'t>(input: &mut &'t str) -> PResult<Piece<'t>> {
    alt((
        preceded("${", cut_err(terminated(take_until(0.., "}"), '}')))
            .map(Piece::Expression),
        alt((take_until(1.., "${"), rest.verify(|text: &str| !text.is_empty())))
            .map(Piece::Literal),
    ))
    .parse_next(input)
}

/// Replace every `${expr}` in `text` with its evaluated value.
///
/// # Errors
///
/// Returns a message for an unterminated `${` or a failed evaluation.
pub fn interpolate(
    text: &str,
    evaluator: &dyn Evaluator,
    data: &DataContext,
) -> Result<String, String> {
    let pieces: Vec<Piece<'_>> = repeat(0.., piece)
        .parse(text)
        .map_err(|_| "unterminated `${` in text".to_string())?;

    let mut output = String::with_capacity(text.len());
    for piece in pieces {
        match piece {
            Piece::Literal(literal) => output.push_str(literal),
            Piece::Expression(expression) => {
                output.push_str(&evaluator.evaluate(expression, data)?)
            }
        }
    }

    Ok(output)
}
