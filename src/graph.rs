use crate::error::Error;
use crate::parse;

use fxhash::FxHashMap;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Stable handle of a node in the graph's arena.
pub(crate) type NodeId = usize;

/// One node of the syntax graph.
///
/// Edges are arena indices rather than owned children, so a rule may refer to
/// itself or to a rule defined later, including cyclic grammars.
#[derive(Debug)]
pub(crate) enum Node {
    /// End node, representing a syntactic entity. Traversal yields its value.
    Literal(String),
    /// Ordered children, all required.
    And(Vec<NodeId>),
    /// Weighted choice between exactly two branches.
    Or { p: f64, children: [NodeId; 2] },
    /// Include the single child, or contribute nothing.
    Optional { p: f64, child: NodeId },
}

/// A syntax graph that produces random abstract sentences: ordered sequences
/// of terminal symbol names.
///
/// # Implementation
/// ## Construction
/// `Graph` is built from rule lines of the form `SYMBOL = EXPRESSION`, either
/// via [`Graph::build`] on pre-cleaned lines or via `from_str` on full text
/// (which drops `#` comments and blank lines):
/// - rule symbols are checked for duplicates and every rule's node is
///   registered before any expression is parsed, so forward and self
///   references resolve;
/// - each expression is parsed by recursive descent over its whitespace
///   tokens into the node arena;
/// - the start rule (first line) must not reduce to a bare `|`/`[` node.
///
/// ## Sentence generation
/// [`Graph::traverse`] walks the graph from the start rule, drawing one
/// uniform number per `|`/`[` decision and emitting every literal it passes,
/// in order. The graph itself is immutable, so one `Graph` can be shared and
/// traversed from several threads as long as each uses its own RNG.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    /// `(symbol, node)` per rule, in definition order. The first is the root.
    rules: Vec<(String, NodeId)>,
    root: NodeId,
}

impl Graph {
    pub(crate) fn new(nodes: Vec<Node>, rules: Vec<(String, NodeId)>) -> Self {
        let root = rules[0].1;
        Graph { nodes, rules, root }
    }

    /// Builds the graph from rule lines that are already non-empty, free of
    /// comments and trimmed. The first line defines the start symbol.
    pub fn build<S: AsRef<str>>(lines: &[S]) -> Result<Self, Error> {
        parse::build_graph(lines)
    }

    /// One randomized walk, drawing from the process RNG.
    ///
    /// See [`Graph::traverse_with`].
    pub fn traverse(&self) -> Vec<&str> {
        self.traverse_with(&mut rand::rng())
    }

    /// One randomized walk of the graph, producing the terminal symbol names
    /// in generation order.
    ///
    /// Every `|` node draws `u` uniformly from `[0, 1)` and takes its first
    /// branch iff `u <= p^(1/level)`, where `level` is the nesting depth of
    /// the node in this walk; `[` nodes include their child under the same
    /// test. The exponent drifts the decision toward the first branch (or
    /// inclusion) as depth grows, which is what lets recursive rules put the
    /// recursion on the second branch and still terminate.
    ///
    /// A cyclic grammar whose cycles can never reach a terminal does not
    /// terminate; that is a property of the grammar, not checked here.
    pub fn traverse_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&str> {
        let mut sentence = Vec::new();
        let mut to_visit = vec![(self.root, 0)];

        while let Some((id, level)) = to_visit.pop() {
            match &self.nodes[id] {
                Node::Literal(value) => sentence.push(value.as_str()),
                Node::And(children) => {
                    // pushed reversed so the stack pops them in rule order
                    to_visit.extend(children.iter().rev().map(|&c| (c, level + 1)));
                }
                Node::Or { p, children } => {
                    let rc = if rng.random::<f64>() <= damped(*p, level) {
                        0
                    } else {
                        1
                    };
                    to_visit.push((children[rc], level + 1));
                }
                Node::Optional { p, child } => {
                    if rng.random::<f64>() <= damped(*p, level) {
                        to_visit.push((*child, level + 1));
                    }
                }
            }
        }
        sentence
    }
}

/// Depth-dampened probability. `level` is never 0 here: construction rejects
/// grammars whose start rule is a bare branch, and every other node is
/// reached below the root.
fn damped(p: f64, level: usize) -> f64 {
    p.powf(1.0 / level as f64)
}

impl FromStr for Graph {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        Self::build(&lines)
    }
}

/// Pretty prints the wired graph, one line per rule.
///
/// It's helpful to check that the built graph matches what is expected from
/// the un-parsed rules (operator nesting is explicit here). References to
/// named rules are printed by name and not expanded, which keeps the dump
/// finite for cyclic grammars.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let names: FxHashMap<NodeId, &str> = self
            .rules
            .iter()
            .map(|(name, id)| (*id, name.as_str()))
            .collect();
        for (name, id) in &self.rules {
            write!(f, "{}: ", name)?;
            self.fmt_node(f, *id, &names, true)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Graph {
    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        names: &FxHashMap<NodeId, &str>,
        top: bool,
    ) -> Result<(), fmt::Error> {
        if !top {
            if let Some(name) = names.get(&id) {
                return write!(f, "{}", name);
            }
        }
        match &self.nodes[id] {
            Node::Literal(value) => write!(f, "{:?}", value),
            Node::And(children) => {
                write!(f, "and(")?;
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.fmt_node(f, child, names, false)?;
                }
                write!(f, ")")
            }
            Node::Or { p, children } => {
                write!(f, "or({}, ", p)?;
                self.fmt_node(f, children[0], names, false)?;
                write!(f, ", ")?;
                self.fmt_node(f, children[1], names, false)?;
                write!(f, ")")
            }
            Node::Optional { p, child } => {
                write!(f, "opt({}, ", p)?;
                self.fmt_node(f, *child, names, false)?;
                write!(f, ")")
            }
        }
    }
}
