use std::fmt;
use std::ops::Index;

use super::tokens::Direction;

/// Index of a node inside the `Arena` it was allocated from.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Node {
    /// `name` is a `StringLiteral` or an `EnvReference`; every arg is one too.
    Command { name: NodeId, args: Vec<NodeId> },
    StringLiteral(String),
    /// Resolved when the tree is executed, never while parsing.
    EnvReference(String),
    Pipe { left: NodeId, right: NodeId },
    Redirection {
        direction: Direction,
        target: String,
        child: NodeId,
    },
}

/// Owns every node built while parsing one line. Nodes refer to each other
/// by `NodeId`, and all of them are released together when the arena drops.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// A parsed line: the arena holding its nodes plus the root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    arena: Arena,
    root: NodeId,
}

impl Ast {
    pub fn new(arena: Arena, root: NodeId) -> Ast {
        Ast { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    /// Renders the sub-tree rooted at `id`, e.g.
    /// `Pipe(Command(echo, [hello]), Command(wc, []))`.
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { ast: self, id }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(self.root))
    }
}

pub struct NodeDisplay<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> fmt::Display for NodeDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ast = self.ast;
        match ast.node(self.id) {
            Node::Command { name, args } => {
                write!(f, "Command({}, [", ast.display(*name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ast.display(*arg))?;
                }
                write!(f, "])")
            }
            Node::StringLiteral(value) => write!(f, "{}", value),
            Node::EnvReference(name) => write!(f, "${}", name),
            Node::Pipe { left, right } => {
                write!(f, "Pipe({}, {})", ast.display(*left), ast.display(*right))
            }
            Node::Redirection {
                direction,
                target,
                child,
            } => write!(f, "Redirect({}, {}, {})", direction, target, ast.display(*child)),
        }
    }
}
