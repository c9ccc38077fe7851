//! Grammar-description parsing: rule lines in, wired node arena out.
//!
//! Expressions are whitespace-tokenized; `(`, `)`, `|` and `[` are the only
//! structural tokens. The operators are prefix form: `| <p> <a> <b>` is a
//! weighted choice, `[ <p> <x>` an optional element. Every other token is a
//! symbol reference, resolved against the rule table or turned into a
//! literal terminal.

use crate::error::{Error, ErrorRepr};
use crate::graph::{Graph, Node, NodeId};

use fxhash::FxHashMap;
use std::collections::HashSet;

/// Cursor over one rule expression's whitespace-split tokens.
struct Tokens<'a> {
    toks: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(expr: &'a str) -> Self {
        Tokens {
            toks: expr.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.toks.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

pub(crate) fn build_graph<S: AsRef<str>>(lines: &[S]) -> Result<Graph, Error> {
    if lines.is_empty() {
        return Err(Error(ErrorRepr::EmptyGrammar));
    }

    let mut rules = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.as_ref();
        let (symbol, expr) = line
            .split_once('=')
            .ok_or_else(|| Error(ErrorRepr::MissingDelimiter(line.to_string())))?;
        rules.push((symbol.trim(), expr));
    }

    let names: Vec<&str> = rules.iter().map(|&(symbol, _)| symbol).collect();
    if let Some(dups) = find_duplicates(&names) {
        return Err(Error(ErrorRepr::DuplicateSymbols(dups)));
    }

    let mut builder = Builder {
        nodes: Vec::new(),
        symbols: FxHashMap::default(),
    };

    // Every rule gets its node before any expression is parsed, so that
    // forward and self references resolve to the rule instead of a literal.
    let rule_ids: Vec<NodeId> = rules
        .iter()
        .map(|&(symbol, _)| {
            let id = builder.alloc();
            builder.symbols.insert(symbol, id);
            id
        })
        .collect();

    for (&(symbol, expr), &id) in rules.iter().zip(&rule_ids) {
        log::debug!("rule `{}` := {}", symbol, expr.trim());
        let mut toks = Tokens::new(expr);
        if builder.parse(&mut toks, true, Some(id))?.is_none() {
            return Err(Error(ErrorRepr::EmptyExpression(symbol.to_string())));
        }
    }

    // The dampening exponent 1/level is undefined at the root (level 0), so
    // the start rule must not itself be a branch node.
    if matches!(
        builder.nodes[rule_ids[0]],
        Node::Or { .. } | Node::Optional { .. }
    ) {
        return Err(Error(ErrorRepr::BranchRoot(names[0].to_string())));
    }

    let rules = names.into_iter().map(str::to_string).zip(rule_ids).collect();
    Ok(Graph::new(builder.nodes, rules))
}

fn find_duplicates(names: &[&str]) -> Option<HashSet<String>> {
    let mut set: HashSet<&str> = names.iter().copied().collect();
    let dups: HashSet<String> = names
        .iter()
        .filter(|n| !set.remove(**n))
        .map(|n| n.to_string())
        .collect();
    (!dups.is_empty()).then_some(dups)
}

struct Builder<'a> {
    nodes: Vec<Node>,
    symbols: FxHashMap<&'a str, NodeId>,
}

impl<'a> Builder<'a> {
    /// Reserves an arena slot; every caller overwrites it once its edges are
    /// known.
    fn alloc(&mut self) -> NodeId {
        self.nodes.push(Node::And(Vec::new()));
        self.nodes.len() - 1
    }

    /// Resolves a symbol token against the rule table, falling back to a new
    /// literal for anything unknown.
    fn resolve(&mut self, token: &str) -> NodeId {
        if let Some(&id) = self.symbols.get(token) {
            return id;
        }
        self.nodes.push(Node::Literal(token.to_string()));
        self.nodes.len() - 1
    }

    fn probability(&mut self, toks: &mut Tokens<'_>, op: &str) -> Result<f64, Error> {
        let tok = toks
            .next()
            .ok_or_else(|| Error(ErrorRepr::MissingOperand(op.to_string())))?;
        let p: f64 = tok
            .parse()
            .map_err(|_| Error(ErrorRepr::BadProbability(tok.to_string())))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(Error(ErrorRepr::BadProbability(tok.to_string())));
        }
        Ok(p)
    }

    /// One branch of a `|`/`[`: a single non-greedy unit, which must exist.
    fn operand(&mut self, toks: &mut Tokens<'_>, op: &str) -> Result<NodeId, Error> {
        self.parse(toks, false, None)?
            .ok_or_else(|| Error(ErrorRepr::MissingOperand(op.to_string())))
    }

    /// One step of the descent. `greedy` decides whether a plain symbol is a
    /// complete result (an operand, a group member) or the first element of
    /// an AND sequence collected from the rest of the stream.
    ///
    /// Returns `None` when the stream is exhausted or a `)` closed the
    /// enclosing group.
    fn parse(
        &mut self,
        toks: &mut Tokens<'_>,
        greedy: bool,
        target: Option<NodeId>,
    ) -> Result<Option<NodeId>, Error> {
        let Some(token) = toks.next() else {
            return Ok(None);
        };
        if token == ")" {
            return Ok(None);
        }

        match token {
            // A group does not nest by itself; it hands the target straight
            // to a greedy parse of the tokens up to the matching `)`.
            "(" => {
                let node = match target {
                    Some(id) => id,
                    None => self.alloc(),
                };
                self.parse(toks, true, Some(node))
            }
            "|" => {
                let node = match target {
                    Some(id) => id,
                    None => self.alloc(),
                };
                let p = self.probability(toks, "|")?;
                let a = self.operand(toks, "|")?;
                let b = self.operand(toks, "|")?;
                self.nodes[node] = Node::Or {
                    p,
                    children: [a, b],
                };
                Ok(Some(node))
            }
            "[" => {
                let node = match target {
                    Some(id) => id,
                    None => self.alloc(),
                };
                let p = self.probability(toks, "[")?;
                let child = self.operand(toks, "[")?;
                self.nodes[node] = Node::Optional { p, child };
                Ok(Some(node))
            }
            symbol => {
                let first = self.resolve(symbol);
                if !greedy {
                    return Ok(Some(first));
                }
                let node = match target {
                    Some(id) => id,
                    None => self.alloc(),
                };
                let mut children = vec![first];
                while let Some(child) = self.parse(toks, false, None)? {
                    children.push(child);
                }
                self.nodes[node] = Node::And(children);
                Ok(Some(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_is_deterministic() {
        let src = "S = NP VP\nNP = det [ 0.4 adj noun\nVP = | 0.7 verb ( verb adverb )";
        let a: Graph = src.parse().unwrap();
        let b: Graph = src.parse().unwrap();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn operators_nest_inside_sequences() {
        let g: Graph = "S = det [ 0.4 adj noun".parse().unwrap();
        assert_eq!(g.to_string(), "S: and(\"det\", opt(0.4, \"adj\"), \"noun\")\n");

        let g: Graph = "S = x | 0.7 verb ( verb adverb )".parse().unwrap();
        assert_eq!(
            g.to_string(),
            "S: and(\"x\", or(0.7, \"verb\", and(\"verb\", \"adverb\")))\n"
        );
    }

    #[test]
    fn rules_shadow_literals() {
        let g: Graph = "S = a end\na = | 1.0 x y".parse().unwrap();
        assert_eq!(g.to_string(), "S: and(a, \"end\")\na: or(1, \"x\", \"y\")\n");
    }

    #[test]
    fn self_reference_resolves_to_the_rule_itself() {
        let g: Graph = "S = stop REST\nREST = [ 0.5 REST".parse().unwrap();
        assert_eq!(g.to_string(), "S: and(\"stop\", REST)\nREST: opt(0.5, REST)\n");
    }

    #[test]
    fn catches_duplicates() {
        for src in ["S = a\nS = b", "S = a\nT = b\nS = c"] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(
                result,
                Error(ErrorRepr::DuplicateSymbols(
                    ["S".into()].into_iter().collect()
                ))
            );
        }

        let result: Error = "S = a\nT = b\nS = c\nT = d".parse::<Graph>().unwrap_err();
        assert_eq!(
            result,
            Error(ErrorRepr::DuplicateSymbols(
                ["S".into(), "T".into()].into_iter().collect()
            ))
        );
    }

    #[test]
    fn rejects_empty_grammar() {
        let result = Graph::build::<&str>(&[]).unwrap_err();
        assert_eq!(result, Error(ErrorRepr::EmptyGrammar));

        let result: Error = "# nothing but a comment\n\n".parse::<Graph>().unwrap_err();
        assert_eq!(result, Error(ErrorRepr::EmptyGrammar));
    }

    #[test]
    fn rejects_rule_without_delimiter() {
        let result: Error = "S a b".parse::<Graph>().unwrap_err();
        assert_eq!(result, Error(ErrorRepr::MissingDelimiter("S a b".into())));
    }

    #[test]
    fn rejects_empty_expressions() {
        for src in ["S =", "S = ( )"] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(result, Error(ErrorRepr::EmptyExpression("S".into())));
        }
    }

    #[test]
    fn rejects_bad_probabilities() {
        for (src, tok) in [
            ("S = a | zero b c", "zero"),
            ("S = a | 1.5 b c", "1.5"),
            ("S = a [ -0.1 b", "-0.1"),
        ] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(result, Error(ErrorRepr::BadProbability(tok.into())));
        }
    }

    #[test]
    fn rejects_missing_operands() {
        for src in ["S = a |", "S = a | 0.5", "S = a | 0.5 b", "S = a | 0.5 b )"] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(result, Error(ErrorRepr::MissingOperand("|".into())));
        }

        for src in ["S = a [", "S = a [ 0.9", "S = a [ 0.9 )"] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(result, Error(ErrorRepr::MissingOperand("[".into())));
        }
    }

    #[test]
    fn rejects_branch_start_rule() {
        for src in ["S = | 0.5 a b", "S = [ 0.5 a", "S = ( | 0.5 a b )"] {
            let result: Error = src.parse::<Graph>().unwrap_err();
            assert_eq!(result, Error(ErrorRepr::BranchRoot("S".into())));
        }
    }
}
