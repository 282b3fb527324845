use deptree::{FeatureMap, FieldIndex, Node, NodeId, ROOT, Tree, TsvReader};

/// "A record date has n't been set", built node by node
fn build() -> (Tree, Vec<NodeId>) {
    let mut tree = Tree::new();
    let rows = [
        (1, "A", "a", "DT", "current=a|next=record"),
        (2, "record", "record", "NN", ""),
        (3, "date", "date", "NN", ""),
        (4, "has", "have", "VBZ", ""),
        (5, "n't", "not", "RB", ""),
        (6, "been", "be", "VBN", ""),
        (7, "set", "set", "VBN", ""),
    ];
    let mut nodes = vec![ROOT];
    for (id, form, lemma, pos, feats) in rows {
        let feats: FeatureMap = feats.parse().unwrap();
        nodes.push(tree.add_node(Node::with_fields(id, form, lemma, pos, feats)).unwrap());
    }

    // Attach in an order unrelated to the ids
    let edges = [
        (3, 1, "det"),
        (3, 2, "nn"),
        (7, 3, "nsubjpass"),
        (7, 4, "aux"),
        (7, 5, "neg"),
        (7, 6, "auxpass"),
        (0, 7, "root"),
    ];
    for (head, child, label) in edges {
        tree.add_dependent(nodes[head], nodes[child], label).unwrap();
    }
    (tree, nodes)
}

#[test]
fn test_record_date_scenario() {
    let (mut tree, n) = build();
    let (a, date, has, not, been, set) = (n[1], n[3], n[4], n[5], n[6], n[7]);

    assert_eq!(tree.get_node(a).unwrap().id(), 1);
    assert_eq!(tree.get_node(not).unwrap().form(), "n't");
    assert_eq!(tree.get_node(tree.dependent(date, 1).unwrap()).unwrap().pos(), "NN");
    assert_eq!(tree.right_most_dependent(set), None);

    assert_eq!(tree.feat(a, "next"), Some("record"));
    tree.remove_feat(a, "current").unwrap();
    assert_eq!(tree.feat(a, "current"), None);

    assert_eq!(tree.lowest_common_ancestor(a, not), Some(set));
    assert_eq!(tree.grand_head(a), tree.head(been));
    assert_eq!(tree.grand_head(a), Some(set));
    let left = tree.left_nearest_sibling(not).unwrap();
    assert_eq!(tree.right_nearest_sibling(left), Some(not));
    assert_eq!(tree.right_nearest_sibling_at(has, 1), Some(been));
}

#[test]
fn test_reader_builds_same_tree() {
    let (built, _) = build();
    let text = built.to_string();

    let read = TsvReader::from_string(&text, FieldIndex::compact())
        .next()
        .unwrap()
        .unwrap();

    assert_eq!(read.to_string(), text);
    let set = read.find(7).unwrap();
    let (first, fifth) = (read.find(1).unwrap(), read.find(5).unwrap());
    assert_eq!(read.lowest_common_ancestor(first, fifth), Some(set));
}
