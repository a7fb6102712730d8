use cordyceps_rbtree::{RbMap, RbSet, RbTree, SetNode};

fn main() {
    let mut tree: RbTree<SetNode<u32>> = RbTree::new();

    for key in [10, 20, 5, 15, 25, 1, 30] {
        tree.insert(key);
        tree.assert_invariants();
        println!("{:?}", tree.iter().map(SetNode::key).collect::<Vec<_>>());
    }

    assert!(!tree.insert(15));
    assert!(tree.erase(&20));
    tree.assert_invariants();
    println!("{:?}", tree.iter().map(SetNode::key).collect::<Vec<_>>());

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot).expect("writing to a String cannot fail");
    println!("{dot}");

    let set: RbSet<&str> = ["pear", "apple", "fig"].into_iter().collect();
    println!("{set:?}");

    let mut map = RbMap::new();
    map.insert("one", 1);
    map.insert("two", 2);
    map.insert("one", 100);
    println!("{map:?}");

    drop(tree);
}
