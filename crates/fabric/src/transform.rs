//! Output transformations selected with `format_as`.

use std::{fmt, str::FromStr};

use fabric_core::{
    block::{AttributeValue, BlockDefinition, attr},
    error::{Diagnostic, DiagnosticSink, ErrorCode},
};

/// A transformation applied to the rendered lines of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// Prefix every line with `> `.
    Blockquote,
    /// Wrap the lines in a fenced code block.
    Code,
}

impl Transformation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::Blockquote => "blockquote",
            Transformation::Code => "code",
        }
    }

    pub fn apply(self, lines: Vec<String>) -> Vec<String> {
        match self {
            Transformation::Blockquote => lines
                .into_iter()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect(),
            Transformation::Code => {
                let mut fenced = Vec::with_capacity(lines.len() + 2);
                fenced.push("```".to_string());
                fenced.extend(lines);
                fenced.push("```".to_string());
                fenced
            }
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transformation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blockquote" => Ok(Transformation::Blockquote),
            "code" => Ok(Transformation::Code),
            other => Err(other.to_string()),
        }
    }
}

/// Apply the `format_as` transformation of `block`, if it has one.
///
/// An unknown transformation is reported as a warning and the lines are
/// returned unchanged.
pub(crate) fn apply_format(
    block: &BlockDefinition,
    lines: Vec<String>,
    sink: &mut DiagnosticSink,
) -> Vec<String> {
    let Some(format) = block.attribute(attr::FORMAT_AS) else {
        return lines;
    };

    match format.as_str().map(str::parse::<Transformation>) {
        Some(Ok(transformation)) => transformation.apply(lines),
        Some(Err(name)) => {
            sink.emit(unknown_transformation(block, &format!("`{name}`")));
            lines
        }
        None => {
            sink.emit(unknown_transformation(block, &describe(format)));
            lines
        }
    }
}

fn describe(value: &AttributeValue) -> String {
    format!("a {} value", value.type_name())
}

fn unknown_transformation(block: &BlockDefinition, found: &str) -> Diagnostic {
    Diagnostic::warning("Unknown transformation")
        .with_code(ErrorCode::E601)
        .with_detail(format!("`format_as` is {found}; the block is rendered unchanged"))
        .with_optional_label(block.location(), "in this block")
        .with_help("use `blockquote` or `code`")
}
