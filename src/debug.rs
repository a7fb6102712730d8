use alloc::{collections::VecDeque, string::String};
use core::fmt;

use crate::{child, color, node_ref, Color, Dir, Link, Links, NodeAllocator, RbTree, TreeNode};

impl<T, A> RbTree<T, A>
where
    T: TreeNode<Links<T>>,
    A: NodeAllocator<T>,
{
    /// Writes the shape of the tree to `w` in Graphviz dot format.
    ///
    /// Nodes are drawn in their color, one rank per tree level. Each NIL leaf is drawn as a point.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        if self.root == self.nil {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        }

        enum Item<T> {
            Node(Link<T>),
            Nil(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(self.root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut nils = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let x = match item {
                    Item::Node(x) => x,
                    Item::Nil(id) => {
                        write!(w, "\"graph{name}-nil{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { node_ref(x).key() };
                let fill = match unsafe { color(x) } {
                    Color::Red => "red",
                    Color::Black => "black",
                };
                write!(
                    w,
                    "\"graph{name}-{key}\" [label=\"{key}\" style=filled fillcolor={fill} fontcolor=white]; "
                )?;

                for dir in [Dir::Left, Dir::Right] {
                    let c = unsafe { child(x, dir) };

                    if c == self.nil {
                        queue.push_back(Item::Nil(nils));
                        writeln!(edges, "\"graph{name}-{key}\" -> \"graph{name}-nil{nils}\";")?;
                        nils += 1;
                    } else {
                        let child_key = unsafe { node_ref(c).key() };
                        queue.push_back(Item::Node(c));
                        writeln!(edges, "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";")?;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{prelude::v1::*, string::String};

    use crate::{RbTree, SetNode};

    #[test]
    fn dotgraph_colors_nodes() {
        let mut tree: RbTree<SetNode<i32>> = RbTree::new();
        for key in [2, 1, 3] {
            tree.insert(key);
        }

        let mut out = String::new();
        tree.dotgraph("t", &mut out).unwrap();

        assert!(out.starts_with("digraph \"graph-t\" {"));
        assert!(out.contains("\"grapht-2\" [label=\"2\" style=filled fillcolor=black"));
        assert!(out.contains("\"grapht-1\" [label=\"1\" style=filled fillcolor=red"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-3\";"));
        assert_eq!(out.matches("[shape=point]").count(), 4);
    }

    #[test]
    fn dotgraph_empty() {
        let tree: RbTree<SetNode<u8>> = RbTree::new();

        let mut out = String::new();
        tree.dotgraph("e", &mut out).unwrap();

        assert_eq!(out, "digraph \"graph-e\" {}");
    }
}
