use deptree::{FeatureMap, FieldIndex, Node, NodeId, ROOT, Tree, TsvReader};
use proptest::prelude::*;
use proptest::sample::Index;

/// Handle `i + 1` gets token id `ids[i]` and head handle `heads[i] <= i`
fn build(heads: &[usize], ids: &[usize]) -> Tree {
    let mut tree = Tree::new();
    for &id in ids {
        tree.add_node(Node::new(id, &format!("w{}", id))).unwrap();
    }
    for (i, &head) in heads.iter().enumerate() {
        tree.add_dependent(head, i + 1, "dep").unwrap();
    }
    tree
}

fn arb_tree() -> impl Strategy<Value = Tree> {
    (1usize..24)
        .prop_flat_map(|n| {
            let heads: Vec<_> = (0..n).map(|i| 0..=i).collect();
            let ids = Just((1..=n).collect::<Vec<usize>>()).prop_shuffle();
            (heads, ids)
        })
        .prop_map(|(heads, ids)| build(&heads, &ids))
}

fn token_ids(tree: &Tree, node: NodeId) -> Vec<usize> {
    tree.dependents(node)
        .iter()
        .map(|(_, dep)| tree.get_node(*dep).unwrap().id())
        .collect()
}

fn pick(tree: &Tree, index: &Index) -> NodeId {
    index.index(tree.len()) + 1
}

proptest! {
    #[test]
    fn dependents_contain_each_node_once(tree in arb_tree()) {
        for (node, _) in tree.iter() {
            let head = tree.head(node).unwrap();
            let count = tree.dependents(head).iter().filter(|(_, d)| *d == node).count();
            prop_assert_eq!(count, 1);
        }
    }

    #[test]
    fn dependents_sorted_by_id(tree in arb_tree()) {
        for node in std::iter::once(ROOT).chain(tree.iter().map(|(n, _)| n)) {
            let ids = token_ids(&tree, node);
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn lca_is_reflexive_and_symmetric(
        tree in arb_tree(),
        i in any::<Index>(),
        j in any::<Index>()
    ) {
        let (a, b) = (pick(&tree, &i), pick(&tree, &j));
        prop_assert_eq!(tree.lowest_common_ancestor(a, a), Some(a));

        let lca = tree.lowest_common_ancestor(a, b);
        prop_assert_eq!(lca, tree.lowest_common_ancestor(b, a));
        let lca = lca.unwrap();
        prop_assert!(tree.is_ancestor_of(lca, a));
        prop_assert!(tree.is_ancestor_of(lca, b));
    }

    #[test]
    fn left_then_right_sibling_is_identity(tree in arb_tree()) {
        for (node, _) in tree.iter() {
            let left = tree.left_nearest_sibling(node);
            if let (Some(left), Some(_)) = (left, tree.right_nearest_sibling(node)) {
                prop_assert_eq!(tree.right_nearest_sibling(left), Some(node));
            }
        }
    }

    #[test]
    fn move_changes_sizes_by_one(mut tree in arb_tree(), i in any::<Index>(), j in any::<Index>()) {
        let node = pick(&tree, &i);
        let target = j.index(tree.len() + 1);
        let old = tree.head(node).unwrap();
        prop_assume!(target != old && !tree.is_ancestor_of(node, target));

        let (old_size, new_size) = (tree.dependent_size(old), tree.dependent_size(target));
        tree.remove_dependent(old, node).unwrap();
        tree.add_dependent(target, node, "moved").unwrap();

        prop_assert_eq!(tree.dependent_size(old), old_size - 1);
        prop_assert_eq!(tree.dependent_size(target), new_size + 1);
        prop_assert!(!tree.dependents(old).iter().any(|(_, d)| *d == node));
        prop_assert_eq!(tree.head(node), Some(target));
    }

    #[test]
    fn attach_to_descendant_is_rejected(
        mut tree in arb_tree(),
        i in any::<Index>(),
        j in any::<Index>()
    ) {
        let (a, b) = (pick(&tree, &i), pick(&tree, &j));
        prop_assume!(tree.is_ancestor_of(a, b));
        let before = tree.to_string();
        prop_assert!(tree.add_dependent(b, a, "dep").is_err());
        prop_assert_eq!(tree.to_string(), before);
    }

    #[test]
    fn display_round_trips_through_reader(tree in arb_tree()) {
        let text = tree.to_string();
        let read = TsvReader::from_string(&text, FieldIndex::compact()).next().unwrap().unwrap();
        prop_assert_eq!(read.to_string(), text);
    }

    #[test]
    fn feature_map_round_trips(
        entries in prop::collection::vec(
            ("[a-zA-Z][a-zA-Z0-9_]{0,7}", "[a-zA-Z0-9_.:-]{0,8}"),
            0..8,
        )
    ) {
        let feats: FeatureMap = entries.into_iter().collect();
        let parsed: FeatureMap = feats.to_string().parse().unwrap();
        prop_assert_eq!(parsed, feats);
    }

    #[test]
    fn removed_feature_is_absent(key in "[a-z]{1,6}", value in "[a-z]{0,6}") {
        let mut feats = FeatureMap::new();
        feats.insert(key.clone(), value);
        feats.remove(&key);
        prop_assert_eq!(feats.get(&key), None);
    }
}
