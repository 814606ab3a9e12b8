use grove::binding::BindingTable;
use grove::forest::{plan, resolve};
use grove::store::Snapshot;
use grove::tree::hasher::fingerprint;
use grove::tree::node::{Node, Value};
use grove::types::{ContainerId, Fingerprint, NodeKey};
use grove::NodeKind;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashMap;

/// Node i optionally declares an earlier node as parent; dropped nodes are left out
/// of the snapshot so their children become orphans.
#[derive(Debug, Clone)]
struct Spec {
    parent: Option<Index>,
    dropped: bool,
}

fn spec_strategy() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        (
            prop::option::weighted(0.7, any::<Index>()),
            prop::bool::weighted(0.15),
        )
            .prop_map(|(parent, dropped)| Spec { parent, dropped }),
        1..40,
    )
}

struct Forest {
    snapshot: Snapshot,
    expected_parent: HashMap<String, Option<String>>,
}

fn build(specs: &[Spec]) -> Forest {
    let mut nodes: Vec<Node> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        let parent = match (&spec.parent, i) {
            (Some(index), i) if i > 0 => Some(index.index(i)),
            _ => None,
        };
        let declared = parent
            .map(|p| fingerprint(Some(&nodes[p])))
            .unwrap_or(Fingerprint::SENTINEL);
        let mut node = NodeKind::Basic.create(format!("n{:02}", i), declared);
        node.data_mut().set_attribute("id", Value::Int(i as i64));
        nodes.push(node);
        parents.push(parent);
    }

    let mut raw = Vec::new();
    let mut expected_parent = HashMap::new();
    for (i, node) in nodes.into_iter().enumerate() {
        if specs[i].dropped {
            continue;
        }
        let parent = parents[i]
            .filter(|p| !specs[*p].dropped)
            .map(|p| format!("n{:02}", p));
        expected_parent.insert(node.name.clone(), parent);
        let container = ContainerId((i % 3) as u64);
        raw.push((
            NodeKey::new(container, node.name.clone()),
            format!("c{}.grove", container.0),
            node,
        ));
    }
    Forest {
        snapshot: Snapshot::from_nodes(raw).unwrap(),
        expected_parent,
    }
}

proptest! {
    #[test]
    fn parents_bind_before_children(specs in spec_strategy()) {
        let forest = build(&specs);
        let plan = plan(&forest.snapshot).unwrap();
        prop_assert_eq!(plan.len(), forest.snapshot.len());

        let mut seen = HashMap::new();
        for (position, linkage) in plan.order().iter().enumerate() {
            if let Some(parent) = &linkage.parent {
                let parent_position = seen.get(parent).copied();
                prop_assert!(parent_position.is_some(), "{} bound before its parent", linkage.key);
                let parent_layer = plan.get(parent).unwrap().layer;
                prop_assert_eq!(linkage.layer, parent_layer + 1);
            } else {
                prop_assert_eq!(linkage.layer, 0);
            }
            prop_assert!(seen.insert(linkage.key.clone(), position).is_none());
        }
    }

    #[test]
    fn resolved_parents_match_declared_content(specs in spec_strategy()) {
        let forest = build(&specs);
        let plan = plan(&forest.snapshot).unwrap();
        for linkage in plan.order() {
            let expected = &forest.expected_parent[&linkage.key.name];
            let actual = linkage.parent.as_ref().map(|p| p.name.clone());
            prop_assert_eq!(&actual, expected);
        }
    }

    #[test]
    fn resolution_is_idempotent(specs in spec_strategy()) {
        let forest = build(&specs);
        let mut table = BindingTable::new();
        let first = resolve(&forest.snapshot, &mut table).unwrap();
        let first_rows: Vec<_> = table
            .iter()
            .map(|b| (b.key.clone(), b.parent.map(|h| h.index()), b.layer))
            .collect();

        let second = resolve(&forest.snapshot, &mut table).unwrap();
        let second_rows: Vec<_> = table
            .iter()
            .map(|b| (b.key.clone(), b.parent.map(|h| h.index()), b.layer))
            .collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(first_rows, second_rows);
        prop_assert_eq!(table.len(), forest.snapshot.len());
    }
}
