//! Per-node override of the built-in rendering.

use schema_ast::{Node, NodeKind};

/// Render override hook.
///
/// There is one method per node variant. Each returns `None` by default,
/// which keeps the built-in rendering. Returning `Some(text)` replaces the
/// whole output for that node, checks and annotations included.
///
/// # Example
///
/// ```rust
/// use schema_ast::Node;
/// use schema_interchange::Reviver;
///
/// struct DateReviver;
///
/// impl Reviver for DateReviver {
///     fn declaration(&self, _node: &Node) -> Option<String> {
///         Some("Schema.Date".to_string())
///     }
/// }
/// ```
pub trait Reviver: Send + Sync {
    fn never(&self, _node: &Node) -> Option<String> {
        None
    }

    fn any(&self, _node: &Node) -> Option<String> {
        None
    }

    fn unknown(&self, _node: &Node) -> Option<String> {
        None
    }

    fn void(&self, _node: &Node) -> Option<String> {
        None
    }

    fn undefined(&self, _node: &Node) -> Option<String> {
        None
    }

    fn null(&self, _node: &Node) -> Option<String> {
        None
    }

    fn boolean(&self, _node: &Node) -> Option<String> {
        None
    }

    fn string(&self, _node: &Node) -> Option<String> {
        None
    }

    fn number(&self, _node: &Node) -> Option<String> {
        None
    }

    fn big_int(&self, _node: &Node) -> Option<String> {
        None
    }

    fn symbol(&self, _node: &Node) -> Option<String> {
        None
    }

    fn object_keyword(&self, _node: &Node) -> Option<String> {
        None
    }

    fn literal(&self, _node: &Node) -> Option<String> {
        None
    }

    fn unique_symbol(&self, _node: &Node) -> Option<String> {
        None
    }

    fn enums(&self, _node: &Node) -> Option<String> {
        None
    }

    fn template_literal(&self, _node: &Node) -> Option<String> {
        None
    }

    fn arrays(&self, _node: &Node) -> Option<String> {
        None
    }

    fn objects(&self, _node: &Node) -> Option<String> {
        None
    }

    fn union(&self, _node: &Node) -> Option<String> {
        None
    }

    fn suspend(&self, _node: &Node) -> Option<String> {
        None
    }

    fn reference(&self, _node: &Node) -> Option<String> {
        None
    }

    fn declaration(&self, _node: &Node) -> Option<String> {
        None
    }

    /// Dispatch to the method matching the node's variant.
    fn revive(&self, node: &Node) -> Option<String> {
        match &node.kind {
            NodeKind::Never => self.never(node),
            NodeKind::Any => self.any(node),
            NodeKind::Unknown => self.unknown(node),
            NodeKind::Void => self.void(node),
            NodeKind::Undefined => self.undefined(node),
            NodeKind::Null => self.null(node),
            NodeKind::Boolean => self.boolean(node),
            NodeKind::String => self.string(node),
            NodeKind::Number => self.number(node),
            NodeKind::BigInt => self.big_int(node),
            NodeKind::Symbol => self.symbol(node),
            NodeKind::ObjectKeyword => self.object_keyword(node),
            NodeKind::Literal { .. } => self.literal(node),
            NodeKind::UniqueSymbol { .. } => self.unique_symbol(node),
            NodeKind::Enum { .. } => self.enums(node),
            NodeKind::TemplateLiteral { .. } => self.template_literal(node),
            NodeKind::Arrays { .. } => self.arrays(node),
            NodeKind::Objects { .. } => self.objects(node),
            NodeKind::Union { .. } => self.union(node),
            NodeKind::Suspend { .. } => self.suspend(node),
            NodeKind::Reference { .. } => self.reference(node),
            NodeKind::Declaration { .. } => self.declaration(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StringOnly;

    impl Reviver for StringOnly {
        fn string(&self, _node: &Node) -> Option<String> {
            Some("S.Text".into())
        }
    }

    #[test]
    fn test_dispatch_by_variant() {
        let reviver = StringOnly;
        assert_eq!(
            reviver.revive(&Node::new(NodeKind::String)).as_deref(),
            Some("S.Text")
        );
        assert_eq!(reviver.revive(&Node::new(NodeKind::Number)), None);
    }
}
