//! Syntax tree produced by the [`parser`](super::parser) before it is turned
//! into immutable block definitions by [`build`](super::build).

use fabric_core::{
    block::{AttributeValue, BlockKind},
    span::Span,
};

/// A value paired with the span it was parsed from.
#[derive(Debug, Clone)]
pub(crate) struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawAttribute<'src> {
    pub name: Spanned<&'src str>,
    pub value: AttributeValue,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub(crate) enum RawItem<'src> {
    Attribute(RawAttribute<'src>),
    Config(Vec<RawAttribute<'src>>),
    Meta(Vec<RawAttribute<'src>>),
    Block(RawBlock<'src>),
}

#[derive(Debug, Clone)]
pub(crate) struct RawBlock<'src> {
    pub kind: Spanned<BlockKind>,
    pub block_type: Option<Spanned<&'src str>>,
    pub name: Option<Spanned<String>>,
    pub items: Vec<RawItem<'src>>,
    pub span: Span,
}
