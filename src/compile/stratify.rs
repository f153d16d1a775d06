//! Predicate dependency graph, evaluation components and strata.
//!
//! Each clause `P :- ..., Q, ..., not R, ...` contributes a non-strict edge
//! P→Q and a strict edge P→R. Strongly connected components of this graph are
//! the units of evaluation: inside one component predicates are mutually
//! recursive and are computed together. A strict edge inside a component is a
//! negation through recursion and cannot be stratified.
//!
//! Components are produced dependencies-first, so evaluating them in order
//! always sees every relation a component reads already complete.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::core::{Symbol, SymbolTable};
use crate::error::{Error, Result};
use crate::gdl::{Clause, Literal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: Symbol,
    pub to: Symbol,
    /// Strict (negative) dependency.
    pub negative: bool,
}

/// A strongly connected set of predicates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub predicates: Vec<Symbol>,
    /// Stratum shared by every predicate of the component.
    pub level: u32,
    /// Indices of the components this one reads, excluding itself.
    pub deps: Vec<usize>,
    /// Whether some predicate of the component depends on itself.
    pub recursive: bool,
}

#[derive(Clone, Debug)]
pub struct Stratification {
    /// Dependencies-first order.
    pub components: Vec<Component>,
    pub component_of: FxHashMap<Symbol, usize>,
    pub edges: Vec<Edge>,
}

impl Stratification {
    /// Build the graph of `clauses` (already `or`-expanded) and stratify it.
    pub fn compute(clauses: &[Clause], symbols: &SymbolTable) -> Result<Self> {
        let mut graph = Graph::default();
        for clause in clauses {
            let head = clause.predicate();
            graph.node(head);
            for lit in &clause.body {
                let (target, negative) = match lit {
                    Literal::Atom(p) => (p.functor(), false),
                    Literal::Not(p) => (p.functor(), true),
                    Literal::Distinct(..) | Literal::Or(_) => (None, false),
                };
                match target {
                    Some(to) if !to.is_input() => graph.edge(head, to, negative),
                    _ => {}
                }
            }
        }

        let sccs = graph.tarjan();
        let mut component_of = FxHashMap::default();
        for (i, scc) in sccs.iter().enumerate() {
            for &node in scc {
                component_of.insert(graph.nodes[node], i);
            }
        }

        let mut components: Vec<Component> = Vec::with_capacity(sccs.len());
        for (i, scc) in sccs.iter().enumerate() {
            let mut level = 0u32;
            let mut deps = Vec::new();
            let mut recursive = false;
            for &node in scc {
                for &(to, negative) in &graph.adj[node] {
                    let target = component_of[&graph.nodes[to]];
                    if target == i {
                        recursive = true;
                        if negative {
                            return Err(Error::Stratification {
                                predicate: symbols.name(graph.nodes[node]).to_string(),
                                negated: symbols.name(graph.nodes[to]).to_string(),
                            });
                        }
                        continue;
                    }
                    let dep_level = components[target].level;
                    level = level.max(if negative { dep_level + 1 } else { dep_level });
                    deps.push(target);
                }
            }
            deps.sort_unstable();
            deps.dedup();
            components.push(Component {
                predicates: scc.iter().map(|&n| graph.nodes[n]).collect(),
                level,
                deps,
                recursive,
            });
        }

        let edges = graph
            .adj
            .iter()
            .enumerate()
            .flat_map(|(from, out)| {
                let nodes = &graph.nodes;
                out.iter().map(move |&(to, negative)| Edge {
                    from: nodes[from],
                    to: nodes[to],
                    negative,
                })
            })
            .collect();

        debug!(
            "stratified {} predicates into {} components",
            graph.nodes.len(),
            components.len()
        );
        Ok(Self {
            components,
            component_of,
            edges,
        })
    }

    /// Stratum of `predicate`, `None` for inputs and unknown predicates.
    #[must_use]
    pub fn level(&self, predicate: Symbol) -> Option<u32> {
        self.component_of
            .get(&predicate)
            .map(|&c| self.components[c].level)
    }

    /// Check user-supplied `(strat P N)` levels against every edge.
    ///
    /// Returns whether the hint set is consistent. Inconsistent sets are
    /// reported with `warn!` and otherwise ignored.
    pub fn check_hints(&self, hints: &[(Symbol, i64)], symbols: &SymbolTable) -> bool {
        if hints.is_empty() {
            return true;
        }
        let mut given: FxHashMap<Symbol, i64> = FxHashMap::default();
        for &(predicate, level) in hints {
            if !self.component_of.contains_key(&predicate) {
                warn!(
                    "ignoring stratification hints: `{}` is not a computed predicate",
                    symbols.name(predicate)
                );
                return false;
            }
            if given.insert(predicate, level).is_some_and(|prev| prev != level) {
                warn!(
                    "ignoring stratification hints: conflicting levels for `{}`",
                    symbols.name(predicate)
                );
                return false;
            }
        }
        for edge in &self.edges {
            let (Some(&from), Some(&to)) = (given.get(&edge.from), given.get(&edge.to)) else {
                continue;
            };
            let ok = if edge.negative { to < from } else { to <= from };
            if !ok {
                warn!(
                    "ignoring stratification hints: `{}` at {} cannot {} `{}` at {}",
                    symbols.name(edge.from),
                    from,
                    if edge.negative { "negate" } else { "use" },
                    symbols.name(edge.to),
                    to
                );
                return false;
            }
        }
        debug!("accepted {} stratification hints", given.len());
        true
    }
}

#[derive(Default)]
struct Graph {
    nodes: Vec<Symbol>,
    index: FxHashMap<Symbol, usize>,
    adj: Vec<Vec<(usize, bool)>>,
}

impl Graph {
    fn node(&mut self, symbol: Symbol) -> usize {
        if let Some(&i) = self.index.get(&symbol) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(symbol);
        self.index.insert(symbol, i);
        self.adj.push(Vec::new());
        i
    }

    fn edge(&mut self, from: Symbol, to: Symbol, negative: bool) {
        let (f, t) = (self.node(from), self.node(to));
        if !self.adj[f].contains(&(t, negative)) {
            self.adj[f].push((t, negative));
        }
    }

    /// Tarjan's algorithm; components come out dependencies-first.
    fn tarjan(&self) -> Vec<Vec<usize>> {
        struct Walk<'g> {
            graph: &'g Graph,
            counter: usize,
            index: Vec<Option<usize>>,
            low: Vec<usize>,
            on_stack: Vec<bool>,
            stack: Vec<usize>,
            out: Vec<Vec<usize>>,
        }

        impl Walk<'_> {
            fn visit(&mut self, v: usize) {
                self.index[v] = Some(self.counter);
                self.low[v] = self.counter;
                self.counter += 1;
                self.stack.push(v);
                self.on_stack[v] = true;

                for &(w, _) in &self.graph.adj[v] {
                    match self.index[w] {
                        None => {
                            self.visit(w);
                            self.low[v] = self.low[v].min(self.low[w]);
                        }
                        Some(wi) if self.on_stack[w] => {
                            self.low[v] = self.low[v].min(wi);
                        }
                        Some(_) => {}
                    }
                }

                if Some(self.low[v]) == self.index[v] {
                    let mut scc = Vec::new();
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    scc.sort_unstable();
                    self.out.push(scc);
                }
            }
        }

        let n = self.nodes.len();
        let mut walk = Walk {
            graph: self,
            counter: 0,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            out: Vec::new(),
        };
        for v in 0..n {
            if walk.index[v].is_none() {
                walk.visit(v);
            }
        }
        walk.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::parse;

    fn stratify(src: &str) -> Result<(Stratification, SymbolTable)> {
        let desc = parse(src)?;
        let clauses: Vec<_> = desc.clauses.iter().flat_map(Clause::expand).collect();
        let strat = Stratification::compute(&clauses, &desc.symbols)?;
        Ok((strat, desc.symbols))
    }

    #[test]
    fn test_levels() {
        let (s, symbols) = stratify(
            "(<= p q) (<= q (r ?x)) (<= s (not p)) (<= t s (not q)) (<= t (not s))",
        )
        .unwrap();
        let level = |name: &str| s.level(symbols.lookup(name).unwrap()).unwrap();
        assert_eq!(level("r"), 0);
        assert_eq!(level("p"), 0);
        assert_eq!(level("s"), 1);
        assert_eq!(level("t"), 2);
    }

    #[test]
    fn test_components_are_dependencies_first() {
        let (s, symbols) = stratify("(<= a b) (<= b c) (<= c a) (<= c d) (<= e (not a))").unwrap();
        let comp = |name: &str| s.component_of[&symbols.lookup(name).unwrap()];
        assert_eq!(comp("a"), comp("b"));
        assert_eq!(comp("b"), comp("c"));
        assert!(comp("d") < comp("a"));
        assert!(comp("a") < comp("e"));
        assert!(s.components[comp("a")].recursive);
        assert!(!s.components[comp("e")].recursive);
        assert_eq!(s.components[comp("e")].deps, vec![comp("a")]);
    }

    #[test]
    fn test_inputs_have_no_stratum() {
        let (s, _) = stratify("(<= (next (x ?a)) (true (x ?a)) (does r ?a))").unwrap();
        assert_eq!(s.level(Symbol::TRUE), None);
        assert_eq!(s.level(Symbol::DOES), None);
        assert_eq!(s.level(Symbol::NEXT), Some(0));
    }

    #[test]
    fn test_negation_through_recursion() {
        let err = stratify("(<= p (q ?x) (not r)) (<= r p)").unwrap_err();
        match err {
            Error::Stratification { predicate, negated } => {
                assert_eq!(predicate, "p");
                assert_eq!(negated, "r");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(stratify("(<= p (not p))").is_err());
    }

    #[test]
    fn test_strat_hints() {
        let (s, symbols) = stratify("(<= p q) (<= s (not p))").unwrap();
        let p = symbols.lookup("p").unwrap();
        let q = symbols.lookup("q").unwrap();
        let sym_s = symbols.lookup("s").unwrap();

        assert!(s.check_hints(&[(q, 0), (p, 0), (sym_s, 3)], &symbols));
        assert!(!s.check_hints(&[(p, 1), (sym_s, 1)], &symbols));
        assert!(!s.check_hints(&[(q, 2), (p, 1)], &symbols));
        assert!(!s.check_hints(&[(Symbol::TRUE, 0)], &symbols));
    }
}
