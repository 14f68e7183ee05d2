//! Structural search for `undefined` inside a write payload.

use tracing::trace;

use crate::syntax::{Expr, SourceContext};

/// The identifier Firestore cannot store.
pub const SENTINEL: &str = "undefined";

/// How many nested objects and variable hops are followed.
pub const MAX_RESOLUTION_DEPTH: usize = 32;

/// Whether `expr` is, or structurally contains, the `undefined` identifier.
///
/// Object literals are searched through their `key: value` and shorthand
/// properties; spreads are skipped. Other identifiers are followed to the
/// initializer of their single declaration when the host can resolve one.
pub fn contains_sentinel(expr: &Expr, source: &dyn SourceContext) -> bool {
    inspect(expr, source, 0)
}

fn inspect(expr: &Expr, source: &dyn SourceContext, depth: usize) -> bool {
    if depth > MAX_RESOLUTION_DEPTH {
        trace!(depth, "payload inspection depth exhausted");
        return false;
    }

    match expr {
        Expr::Ident(ident) if ident.name == SENTINEL => true,
        Expr::Ident(ident) => source
            .resolve_binding(&ident.name, ident.span)
            .is_some_and(|initializer| inspect(&initializer, source, depth + 1)),
        Expr::Object(object) => object
            .properties()
            .any(|property| inspect(&property.value, source, depth + 1)),
        Expr::Call(_)
        | Expr::Member(_)
        | Expr::Array(_)
        | Expr::Spread(_)
        | Expr::Literal(_)
        | Expr::Other(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::syntax::{
        Ident, Literal, LiteralValue, ObjectExpr, ObjectMember, Property, PropertyKey, Span,
        SpreadElement, Token,
    };

    /// Resolves names from a fixed table, regardless of position.
    #[derive(Default)]
    struct FakeScope {
        bindings: HashMap<String, Expr>,
    }

    impl FakeScope {
        fn bind(mut self, name: &str, value: Expr) -> Self {
            self.bindings.insert(name.to_string(), value);
            self
        }
    }

    impl SourceContext for FakeScope {
        fn resolve_binding(&self, name: &str, _at: Span) -> Option<Expr> {
            self.bindings.get(name).cloned()
        }

        fn tokens_of(&self, _span: Span) -> Vec<Token> {
            Vec::new()
        }
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident(Ident {
            name: name.to_string(),
            span: Span::default(),
        })
    }

    fn string(value: &str) -> Expr {
        Expr::Literal(Literal {
            value: LiteralValue::String(value.to_string()),
            span: Span::default(),
        })
    }

    fn property(key: &str, value: Expr) -> ObjectMember {
        ObjectMember::Property(Property {
            key: PropertyKey::Ident(Ident {
                name: key.to_string(),
                span: Span::default(),
            }),
            value,
            shorthand: false,
            span: Span::default(),
        })
    }

    fn object(members: Vec<ObjectMember>) -> Expr {
        Expr::Object(ObjectExpr {
            members,
            span: Span::default(),
        })
    }

    #[test]
    fn test_sentinel_identifier() {
        assert!(contains_sentinel(&ident("undefined"), &FakeScope::default()));
        assert!(!contains_sentinel(&string("undefined"), &FakeScope::default()));
        assert!(!contains_sentinel(
            &Expr::Literal(Literal {
                value: LiteralValue::Null,
                span: Span::default(),
            }),
            &FakeScope::default()
        ));
    }

    #[test]
    fn test_object_properties() {
        let scope = FakeScope::default();
        let clean = object(vec![property("name", string("test"))]);
        assert!(!contains_sentinel(&clean, &scope));

        let dirty = object(vec![
            property("name", string("test")),
            property("age", ident("undefined")),
        ]);
        assert!(contains_sentinel(&dirty, &scope));

        let nested = object(vec![property(
            "user",
            object(vec![property("name", ident("undefined"))]),
        )]);
        assert!(contains_sentinel(&nested, &scope));
    }

    #[test]
    fn test_spread_members_never_contribute() {
        let scope =
            FakeScope::default().bind("rest", object(vec![property("a", ident("undefined"))]));
        let payload = object(vec![ObjectMember::Spread(SpreadElement {
            argument: Box::new(ident("rest")),
            span: Span::default(),
        })]);
        assert!(!contains_sentinel(&payload, &scope));
    }

    #[test]
    fn test_resolves_bindings() {
        let scope = FakeScope::default()
            .bind("value", ident("undefined"))
            .bind("data", object(vec![property("value", ident("value"))]))
            .bind("safe", string("ok"));
        assert!(contains_sentinel(&ident("value"), &scope));
        assert!(contains_sentinel(&ident("data"), &scope));
        assert!(!contains_sentinel(&ident("safe"), &scope));
        assert!(!contains_sentinel(&ident("unknown"), &scope));
    }

    #[test]
    fn test_arrays_are_not_inspected() {
        let payload = Expr::Array(crate::syntax::ArrayExpr {
            elements: vec![ident("undefined")],
            span: Span::default(),
        });
        assert!(!contains_sentinel(&payload, &FakeScope::default()));
    }

    #[test]
    fn test_cyclic_bindings_terminate() {
        let scope = FakeScope::default().bind("a", ident("b")).bind("b", ident("a"));
        assert!(!contains_sentinel(&ident("a"), &scope));
    }

    #[test]
    fn test_depth_cap() {
        let mut scope = FakeScope::default().bind("v0", ident("undefined"));
        for i in 1..=40 {
            scope = scope.bind(&format!("v{i}"), ident(&format!("v{}", i - 1)));
        }
        assert!(contains_sentinel(&ident("v10"), &scope));
        assert!(!contains_sentinel(&ident("v40"), &scope));
    }
}
