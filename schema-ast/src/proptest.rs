//! Property-based tests for the node model.

#[cfg(test)]
mod tests {
    use crate::{
        Annotations, Check, Element, EnumValue, Filter, FilterGroup, FilterKind, LiteralValue,
        Node, NodeKind, PropertySignature, UnionMode,
    };
    use proptest::prelude::*;
    use proptest::{collection, option};

    // ==========================================================================
    // Strategies
    // ==========================================================================

    /// Numbers stay integral so JSON re-reads them identically.
    fn arb_number() -> impl Strategy<Value = f64> {
        (-1_000_000i64..1_000_000i64).prop_map(|n| n as f64)
    }

    fn arb_filter_kind() -> impl Strategy<Value = FilterKind> {
        prop_oneof![
            (0usize..100).prop_map(FilterKind::MinLength),
            (0usize..100).prop_map(FilterKind::MaxLength),
            "[a-z]{1,8}".prop_map(FilterKind::Pattern),
            arb_number().prop_map(FilterKind::GreaterThan),
            arb_number().prop_map(FilterKind::LessThanOrEqualTo),
            (arb_number(), arb_number())
                .prop_map(|(minimum, maximum)| FilterKind::Between { minimum, maximum }),
            Just(FilterKind::Int),
            Just(FilterKind::UniqueItems),
            "-?[0-9]{1,20}".prop_map(FilterKind::GreaterThanBigInt),
            (0usize..10).prop_map(FilterKind::MinItems),
        ]
    }

    fn arb_annotations() -> impl Strategy<Value = Annotations> {
        (
            option::of("[A-Z][a-zA-Z]{0,10}"),
            option::of("[a-zA-Z ]{0,20}"),
            option::of("[a-zA-Z ]{0,20}"),
        )
            .prop_map(|(identifier, title, description)| Annotations {
                identifier,
                title,
                description,
                ..Annotations::default()
            })
    }

    fn arb_check() -> impl Strategy<Value = Check> {
        let filter = (arb_filter_kind(), arb_annotations())
            .prop_map(|(kind, annotations)| Filter::new(kind).with_annotations(annotations))
            .boxed();
        prop_oneof![
            3 => filter.clone().prop_map(Check::Filter),
            1 => collection::vec(filter.prop_map(Check::Filter), 1..3)
                .prop_map(|checks| Check::FilterGroup(FilterGroup::new(checks))),
        ]
    }

    fn arb_leaf() -> impl Strategy<Value = NodeKind> {
        prop_oneof![
            Just(NodeKind::String),
            Just(NodeKind::Number),
            Just(NodeKind::Boolean),
            Just(NodeKind::Null),
            Just(NodeKind::BigInt),
            "[a-z]{0,8}".prop_map(|s| NodeKind::Literal {
                literal: LiteralValue::String(s)
            }),
            arb_number().prop_map(|n| NodeKind::Literal {
                literal: LiteralValue::Number(n)
            }),
            "[0-9]{1,12}".prop_map(|d| NodeKind::Literal {
                literal: LiteralValue::big_int(d)
            }),
            collection::vec(("[A-Z][a-z]{0,5}", "[a-z]{1,5}"), 1..4).prop_map(|members| {
                NodeKind::Enum {
                    enums: members
                        .into_iter()
                        .map(|(name, value)| (name, EnumValue::String(value)))
                        .collect(),
                }
            }),
            "[A-Z][a-z]{0,5}".prop_map(|target| NodeKind::Reference { target }),
        ]
    }

    fn arb_node() -> impl Strategy<Value = Node> {
        let leaf = (arb_leaf(), collection::vec(arb_check(), 0..2), arb_annotations()).prop_map(
            |(kind, checks, annotations)| Node::new(kind).with_checks(checks).with_annotations(annotations),
        );
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                collection::vec(inner.clone(), 0..3).prop_map(|rest| Node::new(NodeKind::Arrays {
                    elements: Vec::new(),
                    rest
                })),
                collection::vec((inner.clone(), any::<bool>()), 0..3).prop_map(|elements| {
                    Node::new(NodeKind::Arrays {
                        elements: elements
                            .into_iter()
                            .map(|(ty, is_optional)| Element { ty, is_optional })
                            .collect(),
                        rest: Vec::new(),
                    })
                }),
                collection::vec(("[a-z]{1,6}", inner.clone(), any::<bool>()), 0..3).prop_map(
                    |props| {
                        Node::new(NodeKind::Objects {
                            property_signatures: props
                                .into_iter()
                                .map(|(name, ty, optional)| {
                                    let ps = PropertySignature::new(name, ty);
                                    if optional {
                                        ps.optional()
                                    } else {
                                        ps
                                    }
                                })
                                .collect(),
                            index_signatures: Vec::new(),
                        })
                    }
                ),
                collection::vec(inner.clone(), 1..3).prop_map(|types| Node::new(NodeKind::Union {
                    types,
                    mode: UnionMode::AnyOf
                })),
                inner.prop_map(Node::suspend),
            ]
        })
    }

    // ==========================================================================
    // Properties
    // ==========================================================================

    proptest! {
        #[test]
        fn prop_node_serde_is_lossless(node in arb_node()) {
            let value = serde_json::to_value(&node).unwrap();
            let back: Node = serde_json::from_value(value).unwrap();
            prop_assert_eq!(back, node);
        }

        #[test]
        fn prop_default_title_starts_with_name(kind in arb_filter_kind()) {
            let title = kind.default_title();
            prop_assert!(title.starts_with(kind.name()));
        }

        #[test]
        fn prop_group_flattening_counts_leaves(checks in collection::vec(arb_check(), 0..5)) {
            let group = Check::FilterGroup(FilterGroup::new(checks.clone()));
            let expected: usize = checks.iter().map(|c| c.filters().len()).sum();
            prop_assert_eq!(group.filters().len(), expected);
        }
    }
}
