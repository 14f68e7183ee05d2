//! Tree-sitter backed source files.
//!
//! [`SourceFile`] parses JavaScript / TypeScript, lowers call expressions into
//! the [`crate::syntax`] model and answers the token and binding queries of
//! [`SourceContext`].

use std::path::Path;

use thiserror::Error;
use tracing::trace;
use tree_sitter::{Node, Parser, Tree};

use crate::syntax::{
    ArrayExpr, CallExpr, Expr, Ident, Literal, LiteralValue, MemberExpr, MemberProperty,
    ObjectExpr, ObjectMember, Property, PropertyKey, SourceContext, Span, SpreadElement, Token,
    TokenKind,
};

/// Nodes that open a function scope (parameters, hoisted `var`).
const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Nodes with children that still form a single token.
const ATOMIC_TOKEN_KINDS: &[&str] = &["string", "template_string", "regex", "number", "jsx_text"];

const COMMENT_KINDS: &[&str] = &["comment", "html_comment"];

/// Statements whose bodies can hold a `var` hoisted past them.
const VAR_CONTAINER_KINDS: &[&str] = &[
    "statement_block",
    "if_statement",
    "else_clause",
    "for_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "catch_clause",
    "finally_clause",
    "switch_statement",
    "switch_body",
    "switch_case",
    "switch_default",
    "labeled_statement",
    "with_statement",
    "export_statement",
];

/// Identifier kinds that introduce a binding inside a pattern.
const BINDING_KINDS: &[&str] = &["identifier", "shorthand_property_identifier_pattern"];

const MAX_LOWERING_DEPTH: usize = 256;

/// Errors raised while turning text into a syntax tree.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("failed to load the {dialect:?} grammar: {message}")]
    Language { dialect: Dialect, message: String },

    #[error("the parser produced no syntax tree")]
    NoTree,
}

/// Source language flavour, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        match extension {
            "js" | "jsx" | "mjs" | "cjs" => Some(Dialect::JavaScript),
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::Tsx),
            _ => None,
        }
    }

    fn language(self) -> tree_sitter::Language {
        match self {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { line_starts }
    }

    /// 1-indexed line and 0-indexed byte column of `offset`.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        (line + 1, offset - self.line_starts[line])
    }

    /// Text of a 1-indexed line, without its line terminator.
    pub fn line_text<'a>(&self, content: &'a str, line: usize) -> &'a str {
        let Some(&start) = self.line_starts.get(line.wrapping_sub(1)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .map_or(content.len(), |&next| next - 1);
        content
            .get(start..end.max(start))
            .unwrap_or("")
            .trim_end_matches('\r')
    }

    /// 0-indexed line and UTF-16 column, as the LSP counts them.
    pub fn utf16_position(&self, content: &str, offset: usize) -> (u32, u32) {
        let (line, column) = self.line_col(offset);
        let start = self.line_starts[line - 1];
        let units = content
            .get(start..offset.min(content.len()))
            .map_or(column, |prefix| prefix.encode_utf16().count());
        ((line - 1) as u32, units as u32)
    }
}

/// A parsed JavaScript or TypeScript file.
pub struct SourceFile {
    content: String,
    tree: Tree,
    dialect: Dialect,
    lines: LineIndex,
}

impl SourceFile {
    pub fn parse(content: impl Into<String>, dialect: Dialect) -> Result<Self, SourceError> {
        let content = content.into();
        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|err| SourceError::Language {
                dialect,
                message: format!("{err:?}"),
            })?;
        let tree = parser.parse(&content, None).ok_or(SourceError::NoTree)?;
        let lines = LineIndex::new(&content);

        Ok(Self {
            content,
            tree,
            dialect,
            lines,
        })
    }

    /// Parse `content`, picking the dialect from `path`.
    pub fn parse_path(content: impl Into<String>, path: &Path) -> Result<Self, SourceError> {
        let dialect = Dialect::from_path(path)
            .ok_or_else(|| SourceError::Unsupported(path.display().to_string()))?;
        Self::parse(content, dialect)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Whether the parser had to recover from syntax errors.
    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Every call expression in the file, outermost first, in source order.
    pub fn calls(&self) -> Vec<CallExpr> {
        let mut calls = Vec::new();
        let mut cursor = self.tree.walk();

        loop {
            let node = cursor.node();
            if node.kind() == "call_expression" {
                if let Some(call) = self.lower_call(node, 0) {
                    calls.push(call);
                }
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return calls;
                }
            }
        }
    }

    fn text(&self, node: Node<'_>) -> &str {
        self.content.get(node.byte_range()).unwrap_or("")
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            span: span_of(node),
        }
    }

    // -----------------------------------------------------------------------
    // Lowering
    // -----------------------------------------------------------------------

    fn lower(&self, node: Node<'_>, depth: usize) -> Expr {
        let span = span_of(node);
        if depth > MAX_LOWERING_DEPTH {
            return Expr::Other(span);
        }

        match node.kind() {
            "parenthesized_expression" => match first_named_child(node) {
                Some(inner) => self.lower(inner, depth + 1),
                None => Expr::Other(span),
            },
            "identifier" | "undefined" => Expr::Ident(self.ident(node)),
            "call_expression" => self
                .lower_call(node, depth)
                .map_or(Expr::Other(span), Expr::Call),
            "member_expression" | "subscript_expression" => self
                .lower_member(node, depth)
                .map_or(Expr::Other(span), Expr::Member),
            "object" => Expr::Object(self.lower_object(node, depth)),
            "array" => Expr::Array(ArrayExpr {
                elements: named_children(node)
                    .into_iter()
                    .map(|element| self.lower(element, depth + 1))
                    .collect(),
                span,
            }),
            "spread_element" => Expr::Spread(self.lower_spread(node, depth)),
            "string" => literal(
                LiteralValue::String(strip_delimiters(self.text(node)).to_string()),
                span,
            ),
            "template_string" => {
                let has_substitution = named_children(node)
                    .iter()
                    .any(|child| child.kind() == "template_substitution");
                let cooked =
                    (!has_substitution).then(|| strip_delimiters(self.text(node)).to_string());
                literal(LiteralValue::Template(cooked), span)
            }
            "number" => literal(LiteralValue::Number(self.text(node).to_string()), span),
            "true" => literal(LiteralValue::Boolean(true), span),
            "false" => literal(LiteralValue::Boolean(false), span),
            "null" => literal(LiteralValue::Null, span),
            "regex" => literal(LiteralValue::Regex, span),
            _ => Expr::Other(span),
        }
    }

    fn lower_call(&self, node: Node<'_>, depth: usize) -> Option<CallExpr> {
        let callee = node.child_by_field_name("function")?;
        let arguments = node.child_by_field_name("arguments")?;
        // Tagged templates put a template_string here.
        if arguments.kind() != "arguments" {
            return None;
        }

        Some(CallExpr {
            callee: Box::new(self.lower(callee, depth + 1)),
            arguments: named_children(arguments)
                .into_iter()
                .map(|argument| self.lower(argument, depth + 1))
                .collect(),
            span: span_of(node),
        })
    }

    fn lower_member(&self, node: Node<'_>, depth: usize) -> Option<MemberExpr> {
        let object = node.child_by_field_name("object")?;
        let property = if node.kind() == "subscript_expression" {
            let index = node.child_by_field_name("index")?;
            MemberProperty::Computed(Box::new(self.lower(index, depth + 1)))
        } else {
            let name = node.child_by_field_name("property")?;
            match name.kind() {
                "private_property_identifier" => MemberProperty::Private(self.ident(name)),
                _ => MemberProperty::Named(self.ident(name)),
            }
        };

        Some(MemberExpr {
            object: Box::new(self.lower(object, depth + 1)),
            property,
            span: span_of(node),
        })
    }

    fn lower_object(&self, node: Node<'_>, depth: usize) -> ObjectExpr {
        let members = named_children(node)
            .into_iter()
            .map(|member| {
                let span = span_of(member);
                match member.kind() {
                    "pair" => {
                        let key = member.child_by_field_name("key");
                        let value = member.child_by_field_name("value");
                        match (key, value) {
                            (Some(key), Some(value)) => ObjectMember::Property(Property {
                                key: self.lower_key(key, depth),
                                value: self.lower(value, depth + 1),
                                shorthand: false,
                                span,
                            }),
                            _ => ObjectMember::Other(span),
                        }
                    }
                    "shorthand_property_identifier" => {
                        let ident = self.ident(member);
                        ObjectMember::Property(Property {
                            key: PropertyKey::Ident(ident.clone()),
                            value: Expr::Ident(ident),
                            shorthand: true,
                            span,
                        })
                    }
                    "spread_element" => ObjectMember::Spread(self.lower_spread(member, depth)),
                    _ => ObjectMember::Other(span),
                }
            })
            .collect();

        ObjectExpr {
            members,
            span: span_of(node),
        }
    }

    fn lower_key(&self, key: Node<'_>, depth: usize) -> PropertyKey {
        match key.kind() {
            "property_identifier" | "identifier" => PropertyKey::Ident(self.ident(key)),
            "string" | "number" => match self.lower(key, depth + 1) {
                Expr::Literal(literal) => PropertyKey::Literal(literal),
                other => PropertyKey::Computed(Box::new(other)),
            },
            "computed_property_name" => {
                let inner = first_named_child(key)
                    .map_or(Expr::Other(span_of(key)), |inner| self.lower(inner, depth + 1));
                PropertyKey::Computed(Box::new(inner))
            }
            _ => PropertyKey::Computed(Box::new(Expr::Other(span_of(key)))),
        }
    }

    fn lower_spread(&self, node: Node<'_>, depth: usize) -> SpreadElement {
        let span = span_of(node);
        let argument = first_named_child(node)
            .map_or(Expr::Other(span), |argument| self.lower(argument, depth + 1));
        SpreadElement {
            argument: Box::new(argument),
            span,
        }
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    /// Leaf tokens of `node` that lie inside `span`, in source order.
    fn collect_tokens(&self, node: Node<'_>, span: Span) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cursor = node.walk();

        loop {
            let current = cursor.node();
            let overlaps = current.end_byte() > span.start && current.start_byte() < span.end;
            let mut descend = false;

            if overlaps && !COMMENT_KINDS.contains(&current.kind()) {
                if current.child_count() == 0 || ATOMIC_TOKEN_KINDS.contains(&current.kind()) {
                    let token_span = span_of(current);
                    if !token_span.is_empty() && span.contains(token_span) {
                        tokens.push(Token {
                            kind: token_kind(current),
                            text: self.text(current).to_string(),
                            span: token_span,
                        });
                    }
                } else {
                    descend = true;
                }
            }

            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return tokens;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scope resolution
    // -----------------------------------------------------------------------

    /// Look `name` up among the declarations `scope` introduces itself.
    fn lookup<'tree>(&self, scope: Node<'tree>, name: &str) -> Lookup<'tree> {
        let mut found = Vec::new();

        match scope.kind() {
            "program" => self.collect_block(scope, name, true, &mut found),
            "statement_block" => {
                let hoists = scope.parent().is_some_and(|parent| {
                    FUNCTION_KINDS.contains(&parent.kind()) || parent.kind() == "class_static_block"
                });
                self.collect_block(scope, name, hoists, &mut found);
            }
            kind if FUNCTION_KINDS.contains(&kind) => {
                let parameters = scope
                    .child_by_field_name("parameters")
                    .or_else(|| scope.child_by_field_name("parameter"));
                if parameters.is_some_and(|params| self.pattern_binds(params, name)) {
                    found.push(Declaration::Opaque);
                }
            }
            "for_statement" => {
                if let Some(init) = scope.child_by_field_name("initializer") {
                    if init.kind() == "lexical_declaration" && self.declares(init, name) {
                        found.push(Declaration::Opaque);
                    }
                }
            }
            "for_in_statement" => {
                let declares_left = scope.child_by_field_name("kind").is_some()
                    && scope
                        .child_by_field_name("left")
                        .is_some_and(|left| self.pattern_binds(left, name));
                if declares_left {
                    found.push(Declaration::Opaque);
                }
            }
            "catch_clause" => {
                if scope
                    .child_by_field_name("parameter")
                    .is_some_and(|param| self.pattern_binds(param, name))
                {
                    found.push(Declaration::Opaque);
                }
            }
            _ => {}
        }

        match found.as_slice() {
            [] => Lookup::Undeclared,
            [Declaration::Declarator(Some(value))] => Lookup::Initializer(*value),
            _ => Lookup::Opaque,
        }
    }

    fn collect_block<'tree>(
        &self,
        block: Node<'tree>,
        name: &str,
        hoists: bool,
        found: &mut Vec<Declaration<'tree>>,
    ) {
        for statement in named_children(block) {
            self.collect_statement(statement, name, found);
        }
        if hoists {
            self.collect_hoisted_vars(block, name, found);
        }
    }

    /// Block-scoped declarations made directly by `statement`.
    fn collect_statement<'tree>(
        &self,
        statement: Node<'tree>,
        name: &str,
        found: &mut Vec<Declaration<'tree>>,
    ) {
        match statement.kind() {
            "lexical_declaration" => self.collect_declarators(statement, name, found),
            "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration" => {
                if statement
                    .child_by_field_name("name")
                    .is_some_and(|ident| self.text(ident) == name)
                {
                    found.push(Declaration::Opaque);
                }
            }
            "import_statement" => {
                if self.pattern_binds(statement, name) {
                    found.push(Declaration::Opaque);
                }
            }
            "export_statement" => {
                if let Some(declaration) = statement.child_by_field_name("declaration") {
                    self.collect_statement(declaration, name, found);
                }
            }
            _ => {}
        }
    }

    /// `var` declarations in the statements of `scope` that belong to its
    /// function. Expressions and nested functions are never entered.
    fn collect_hoisted_vars<'tree>(
        &self,
        scope: Node<'tree>,
        name: &str,
        found: &mut Vec<Declaration<'tree>>,
    ) {
        let mut pending = named_children(scope);
        while let Some(node) = pending.pop() {
            match node.kind() {
                "variable_declaration" => self.collect_declarators(node, name, found),
                "for_in_statement" => {
                    let declares_var = node
                        .child_by_field_name("kind")
                        .is_some_and(|kind| self.text(kind) == "var")
                        && node
                            .child_by_field_name("left")
                            .is_some_and(|left| self.pattern_binds(left, name));
                    if declares_var {
                        found.push(Declaration::Opaque);
                    }
                    pending.extend(node.child_by_field_name("body"));
                }
                kind if VAR_CONTAINER_KINDS.contains(&kind) => {
                    pending.extend(named_children(node));
                }
                _ => {}
            }
        }
    }

    fn collect_declarators<'tree>(
        &self,
        declaration: Node<'tree>,
        name: &str,
        found: &mut Vec<Declaration<'tree>>,
    ) {
        for declarator in named_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(target) = declarator.child_by_field_name("name") else {
                continue;
            };
            if target.kind() == "identifier" {
                if self.text(target) == name {
                    found.push(Declaration::Declarator(
                        declarator.child_by_field_name("value"),
                    ));
                }
            } else if self.pattern_binds(target, name) {
                found.push(Declaration::Opaque);
            }
        }
    }

    fn declares(&self, declaration: Node<'_>, name: &str) -> bool {
        named_children(declaration).into_iter().any(|declarator| {
            declarator
                .child_by_field_name("name")
                .is_some_and(|target| self.pattern_binds(target, name))
        })
    }

    /// Whether a binding pattern (or parameter list) introduces `name`.
    ///
    /// Default values, type annotations and property keys bind nothing.
    fn pattern_binds(&self, pattern: Node<'_>, name: &str) -> bool {
        let mut pending = vec![pattern];
        while let Some(node) = pending.pop() {
            match node.kind() {
                kind if BINDING_KINDS.contains(&kind) => {
                    if self.text(node) == name {
                        return true;
                    }
                }
                "assignment_pattern" | "object_assignment_pattern" => {
                    pending.extend(node.child_by_field_name("left"));
                }
                "pair_pattern" => pending.extend(node.child_by_field_name("value")),
                "required_parameter" | "optional_parameter" => {
                    pending.extend(node.child_by_field_name("pattern"));
                }
                "import_specifier" => {
                    let local = node
                        .child_by_field_name("alias")
                        .or_else(|| node.child_by_field_name("name"));
                    pending.extend(local);
                }
                "type_annotation" | "decorator" | "string" => {}
                _ => pending.extend(named_children(node)),
            }
        }
        false
    }
}

impl SourceContext for SourceFile {
    fn resolve_binding(&self, name: &str, at: Span) -> Option<Expr> {
        let root = self.tree.root_node();
        let mut current = root.descendant_for_byte_range(at.start, at.end)?;

        while let Some(scope) = current.parent() {
            match self.lookup(scope, name) {
                Lookup::Undeclared => current = scope,
                Lookup::Initializer(value) => {
                    trace!(name, scope = scope.kind(), "resolved binding");
                    return Some(self.lower(value, 0));
                }
                Lookup::Opaque => {
                    trace!(name, scope = scope.kind(), "binding has no single initializer");
                    return None;
                }
            }
        }

        None
    }

    fn tokens_of(&self, span: Span) -> Vec<Token> {
        let root = self.tree.root_node();
        root.descendant_for_byte_range(span.start, span.end)
            .map(|node| self.collect_tokens(node, span))
            .unwrap_or_default()
    }
}

enum Lookup<'tree> {
    Undeclared,
    Initializer(Node<'tree>),
    Opaque,
}

enum Declaration<'tree> {
    /// `name = value` (or a bare `name`) in a variable declarator.
    Declarator(Option<Node<'tree>>),
    /// Parameters, imports, functions, classes, destructuring, loop heads.
    Opaque,
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn literal(value: LiteralValue, span: Span) -> Expr {
    Expr::Literal(Literal { value, span })
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !COMMENT_KINDS.contains(&child.kind()))
        .collect()
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node).into_iter().next()
}

/// Drop the surrounding quotes or backticks of a string-like token.
fn strip_delimiters(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'' | '`')), Some(close)) if open == close && text.len() >= 2 => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

fn token_kind(node: Node<'_>) -> TokenKind {
    match node.kind() {
        "string" => TokenKind::String,
        "template_string" => TokenKind::Template,
        "number" => TokenKind::Numeric,
        "regex" => TokenKind::RegularExpression,
        "identifier"
        | "undefined"
        | "property_identifier"
        | "shorthand_property_identifier"
        | "shorthand_property_identifier_pattern"
        | "private_property_identifier"
        | "statement_identifier"
        | "type_identifier" => TokenKind::Identifier,
        "true" | "false" | "null" | "this" | "super" => TokenKind::Keyword,
        kind if !node.is_named() => {
            if kind.chars().all(|c| c.is_ascii_alphabetic()) {
                TokenKind::Keyword
            } else {
                TokenKind::Punctuator
            }
        }
        _ => TokenKind::Other,
    }
}
