//! Schema construction seam.

use std::sync::Arc;

use schema_ast::{
    Annotations, Ast, AstKind, Check, Element, EnumValue, IndexSignature, LiteralValue,
    PropertySignature, SymbolKey, TemplatePart, UnionMode,
};

/// Lazily evaluated schema, shared by every clone of the suspend built from it.
pub type LazySchema<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// Builds live schemas for [`crate::to_schema`].
///
/// One method per construction. Children are built first and handed over
/// by value; checks and annotations are applied last, through
/// [`SchemaFactory::with_checks`] and [`SchemaFactory::with_annotations`].
pub trait SchemaFactory: Send + Sync + 'static {
    /// The schema type produced.
    type Schema: Clone + Send + Sync + 'static;

    fn never(&self) -> Self::Schema;
    /// Accepts anything. Also the fallback for unrepresentable nodes.
    fn any(&self) -> Self::Schema;
    fn unknown(&self) -> Self::Schema;
    fn void(&self) -> Self::Schema;
    fn undefined(&self) -> Self::Schema;
    fn null(&self) -> Self::Schema;
    fn boolean(&self) -> Self::Schema;
    fn string(&self) -> Self::Schema;
    fn number(&self) -> Self::Schema;
    fn big_int(&self) -> Self::Schema;
    fn symbol(&self) -> Self::Schema;
    fn object_keyword(&self) -> Self::Schema;

    fn literal(&self, literal: LiteralValue) -> Self::Schema;
    fn unique_symbol(&self, symbol: SymbolKey) -> Self::Schema;
    fn enums(&self, enums: Vec<(String, EnumValue)>) -> Self::Schema;
    fn template_literal(&self, parts: Vec<TemplatePart<Self::Schema>>) -> Self::Schema;

    fn arrays(&self, elements: Vec<Element<Self::Schema>>, rest: Vec<Self::Schema>) -> Self::Schema;
    fn objects(
        &self,
        property_signatures: Vec<PropertySignature<Self::Schema>>,
        index_signatures: Vec<IndexSignature<Self::Schema>>,
    ) -> Self::Schema;
    fn union(&self, types: Vec<Self::Schema>, mode: UnionMode) -> Self::Schema;

    /// A schema whose target is computed on first use.
    fn suspend(&self, thunk: LazySchema<Self::Schema>) -> Self::Schema;

    fn declaration(&self, type_parameters: Vec<Self::Schema>, encoded: Self::Schema) -> Self::Schema;

    /// Append checks, in order.
    fn with_checks(&self, schema: Self::Schema, checks: Vec<Check>) -> Self::Schema;

    /// Attach annotations.
    fn with_annotations(&self, schema: Self::Schema, annotations: Annotations) -> Self::Schema;
}

/// Factory producing [`schema_ast::Ast`] graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstFactory;

impl SchemaFactory for AstFactory {
    type Schema = Ast;

    fn never(&self) -> Ast {
        Ast::never()
    }

    fn any(&self) -> Ast {
        Ast::any()
    }

    fn unknown(&self) -> Ast {
        Ast::unknown()
    }

    fn void(&self) -> Ast {
        Ast::void()
    }

    fn undefined(&self) -> Ast {
        Ast::undefined()
    }

    fn null(&self) -> Ast {
        Ast::null()
    }

    fn boolean(&self) -> Ast {
        Ast::boolean()
    }

    fn string(&self) -> Ast {
        Ast::string()
    }

    fn number(&self) -> Ast {
        Ast::number()
    }

    fn big_int(&self) -> Ast {
        Ast::big_int()
    }

    fn symbol(&self) -> Ast {
        Ast::symbol()
    }

    fn object_keyword(&self) -> Ast {
        Ast::object_keyword()
    }

    fn literal(&self, literal: LiteralValue) -> Ast {
        Ast::literal(literal)
    }

    fn unique_symbol(&self, symbol: SymbolKey) -> Ast {
        Ast::unique_symbol(symbol)
    }

    fn enums(&self, enums: Vec<(String, EnumValue)>) -> Ast {
        Ast::new(AstKind::Enum(enums))
    }

    fn template_literal(&self, parts: Vec<TemplatePart<Ast>>) -> Ast {
        Ast::template_literal(parts)
    }

    fn arrays(&self, elements: Vec<Element<Ast>>, rest: Vec<Ast>) -> Ast {
        Ast::tuple_with_rest(elements, rest)
    }

    fn objects(
        &self,
        property_signatures: Vec<PropertySignature<Ast>>,
        index_signatures: Vec<IndexSignature<Ast>>,
    ) -> Ast {
        Ast::object_with_index(property_signatures, index_signatures)
    }

    fn union(&self, types: Vec<Ast>, mode: UnionMode) -> Ast {
        Ast::new(AstKind::Union { types, mode })
    }

    fn suspend(&self, thunk: LazySchema<Ast>) -> Ast {
        Ast::suspend(move || thunk())
    }

    fn declaration(&self, type_parameters: Vec<Ast>, encoded: Ast) -> Ast {
        Ast::declaration(type_parameters, Some(encoded))
    }

    fn with_checks(&self, schema: Ast, checks: Vec<Check>) -> Ast {
        schema.checks_all(checks)
    }

    fn with_annotations(&self, schema: Ast, annotations: Annotations) -> Ast {
        schema.annotate(annotations)
    }
}
