//! Syntax model for the expressions the Firestore rules inspect.
//!
//! The host parser lowers its concrete tree into these closed variants so the
//! analyzers can match on node shape exhaustively instead of probing optional
//! fields. Every node keeps the byte [`Span`] it was lowered from; fixes are
//! expressed against [`Token`]s fetched through [`SourceContext`].

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Call(CallExpr),
    Ident(Ident),
    Member(MemberExpr),
    Object(ObjectExpr),
    Array(ArrayExpr),
    Spread(SpreadElement),
    Literal(Literal),
    /// Any shape the rules never look inside (functions, ternaries, ...).
    Other(Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Call(call) => call.span,
            Expr::Ident(ident) => ident.span,
            Expr::Member(member) => member.span,
            Expr::Object(object) => object.span,
            Expr::Array(array) => array.span,
            Expr::Spread(spread) => spread.span,
            Expr::Literal(literal) => literal.span,
            Expr::Other(span) => *span,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectExpr> {
        match self {
            Expr::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The text value of a string literal, or of a template literal without
    /// substitutions.
    pub fn static_string(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal {
                value: LiteralValue::String(value),
                ..
            }) => Some(value),
            Expr::Literal(Literal {
                value: LiteralValue::Template(Some(value)),
                ..
            }) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl CallExpr {
    pub fn argument(&self, index: usize) -> Option<&Expr> {
        self.arguments.get(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: MemberProperty,
    pub span: Span,
}

impl MemberExpr {
    /// The logical property name: `x.set` and `x['set']` both give `set`.
    /// Private names and dynamic keys have none.
    pub fn property_name(&self) -> Option<&str> {
        match &self.property {
            MemberProperty::Named(ident) => Some(&ident.name),
            MemberProperty::Computed(key) => key.static_string(),
            MemberProperty::Private(_) => None,
        }
    }

    pub fn property_span(&self) -> Span {
        match &self.property {
            MemberProperty::Named(ident) | MemberProperty::Private(ident) => ident.span,
            MemberProperty::Computed(key) => key.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// Dot access: `object.name`.
    Named(Ident),
    /// Bracket access: `object[expr]`.
    Computed(Box<Expr>),
    /// `object.#name`.
    Private(Ident),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub members: Vec<ObjectMember>,
    pub span: Span,
}

impl ObjectExpr {
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.members.iter().filter_map(|member| match member {
            ObjectMember::Property(property) => Some(property),
            ObjectMember::Spread(_) | ObjectMember::Other(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property(Property),
    Spread(SpreadElement),
    /// Methods, accessors and anything else that is not `key: value`.
    Other(Span),
}

/// A `key: value` member. Shorthand `{ v }` has `value` = identifier `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub shorthand: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(Ident),
    Literal(Literal),
    Computed(Box<Expr>),
}

impl PropertyKey {
    /// The key name when it is known without evaluation.
    pub fn static_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Ident(ident) => Some(&ident.name),
            PropertyKey::Literal(Literal {
                value: LiteralValue::String(value),
                ..
            }) => Some(value),
            PropertyKey::Literal(_) => None,
            PropertyKey::Computed(expr) => expr.static_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadElement {
    pub argument: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    /// Raw source text of the number.
    Number(String),
    Boolean(bool),
    Null,
    /// Template literal; the text is present only without substitutions.
    Template(Option<String>),
    Regex,
}

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuator,
    String,
    Template,
    Numeric,
    RegularExpression,
    Other,
}

/// A lexical token. Comments are never tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_punctuator(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.text == value
    }
}

/// Read-only queries the analyzers may make against the host.
///
/// Implemented by [`crate::source::SourceFile`]; tests substitute fakes.
pub trait SourceContext {
    /// Resolve `name` as referenced at `at` to the initializer of its single
    /// declaring variable in the innermost enclosing scope. `None` when the
    /// binding is unknown or has no single initializer (parameters, imports,
    /// destructuring, redeclarations).
    fn resolve_binding(&self, name: &str, at: Span) -> Option<Expr>;

    /// The tokens lying entirely within `span`, in source order.
    fn tokens_of(&self, span: Span) -> Vec<Token>;
}
