//! Grounding: from clauses with variables to propositional rules.
//!
//! ## Phases
//!
//! 1. **Classification.** A predicate is *dynamic* when it is `legal`,
//!    `next`, `goal` or `terminal`, or reads `true`, `does` or another
//!    dynamic predicate. Everything else is *static*.
//! 2. **Static evaluation.** Static predicates do not depend on the state,
//!    so they are computed exactly, component by component.
//! 3. **Relaxed reachability.** Dynamic rules are run with negation ignored,
//!    feeding `next` back into `true` and `legal` into `does`, until nothing
//!    new appears. The result over-approximates every reachable state.
//! 4. **Instantiation.** Each dynamic rule is joined over the approximations.
//!    Static literals are decided on the spot; what survives becomes a
//!    [`GroundRule`] over interned dynamic atoms.

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::core::{term::unwind, Bindings, Symbol, SymbolTable, Term, VarId};
use crate::engine::{AtomTable, GroundRule};
use crate::error::{Error, Result};
use crate::gdl::{Clause, Hint, Literal};

use super::config::CompileConfig;
use super::stratify::Stratification;

/// Set of ground atoms of one predicate, in derivation order.
#[derive(Clone, Debug, Default)]
pub struct Relation {
    tuples: Vec<Term>,
    set: FxHashSet<Term>,
}

impl Relation {
    pub fn insert(&mut self, term: Term) -> bool {
        if self.set.contains(&term) {
            return false;
        }
        self.set.insert(term.clone());
        self.tuples.push(term);
        true
    }

    #[must_use]
    pub fn contains(&self, term: &Term) -> bool {
        self.set.contains(term)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    #[must_use]
    pub fn tuples(&self) -> &[Term] {
        &self.tuples
    }

    #[must_use]
    pub fn into_tuples(self) -> Vec<Term> {
        self.tuples
    }
}

/// Output of grounding.
#[derive(Debug)]
pub struct Grounding {
    pub atoms: AtomTable,
    pub rules: Vec<GroundRule>,
    /// Exact relations of static predicates.
    pub statics: FxHashMap<Symbol, Relation>,
    /// Over-approximations of dynamic predicates, `true` and `does`.
    pub reachable: FxHashMap<Symbol, Relation>,
    pub dynamic: FxHashSet<Symbol>,
}

/// Ground `clauses` (expanded and safety-checked).
pub fn ground(
    clauses: &[Clause],
    strat: &Stratification,
    hints: &[Hint],
    symbols: &SymbolTable,
    config: &CompileConfig,
) -> Result<Grounding> {
    let dynamic = classify(clauses, strat);
    for reserved in [Symbol::ROLE, Symbol::INIT] {
        if dynamic.contains(&reserved) {
            return Err(Error::InvalidDescription(format!(
                "`{}` must not depend on the game state",
                symbols.name(reserved)
            )));
        }
    }

    let by_component = clauses_by_component(clauses, strat);
    let mut relations: FxHashMap<Symbol, Relation> = FxHashMap::default();
    let mut budget = Budget {
        used: 0,
        limit: config.max_ground_rules,
    };

    // Static predicates, exactly.
    for (c, component) in strat.components.iter().enumerate() {
        if component.predicates.iter().any(|p| dynamic.contains(p)) {
            continue;
        }
        saturate(
            &by_component[c],
            component.recursive,
            &mut relations,
            &dynamic,
            config,
            &mut budget,
        )?;
    }
    let static_count: usize = relations.values().map(Relation::len).sum();
    debug!("static evaluation: {static_count} facts");

    // Dynamic predicates, relaxed.
    seed_inputs(&mut relations);
    loop {
        let before = budget.used;
        for (c, component) in strat.components.iter().enumerate() {
            if component.predicates.iter().any(|p| dynamic.contains(p)) {
                saturate(
                    &by_component[c],
                    component.recursive,
                    &mut relations,
                    &dynamic,
                    config,
                    &mut budget,
                )?;
            }
        }
        budget.used += feed_back(&mut relations, Symbol::NEXT, Symbol::TRUE, |t| {
            t.args().first().map(|f| Term::func(Symbol::TRUE, vec![f.clone()]))
        });
        budget.used += feed_back(&mut relations, Symbol::LEGAL, Symbol::DOES, |t| {
            Some(Term::func(Symbol::DOES, t.args().to_vec()))
        });
        budget.check()?;
        if budget.used == before {
            break;
        }
    }
    debug!(
        "relaxed reachability: {} base facts, {} possible moves",
        relations.get(&Symbol::TRUE).map_or(0, Relation::len),
        relations.get(&Symbol::DOES).map_or(0, Relation::len)
    );

    if config.use_hints {
        check_domain_hints(hints, &relations, symbols);
    }

    // Instantiation.
    let mut atoms = AtomTable::default();
    let mut rules = Vec::new();
    for clause in clauses {
        if !dynamic.contains(&clause.predicate()) {
            continue;
        }
        instantiate(clause, &relations, &dynamic, config, &mut atoms, &mut rules)?;
    }
    rules.sort_unstable();
    rules.dedup();

    // Every reachable base fact and move gets an atom even if no rule reads it.
    for input in [Symbol::TRUE, Symbol::DOES] {
        if let Some(rel) = relations.get(&input) {
            for t in rel.tuples() {
                atoms.intern(t.clone());
            }
        }
    }
    debug!("grounding: {} atoms, {} rules", atoms.len(), rules.len());

    let mut statics = FxHashMap::default();
    let mut reachable = FxHashMap::default();
    for (predicate, relation) in relations {
        if dynamic.contains(&predicate) || predicate.is_input() {
            reachable.insert(predicate, relation);
        } else {
            statics.insert(predicate, relation);
        }
    }
    Ok(Grounding {
        atoms,
        rules,
        statics,
        reachable,
        dynamic,
    })
}

struct Budget {
    used: usize,
    limit: usize,
}

impl Budget {
    fn check(&self) -> Result<()> {
        if self.used > self.limit {
            return Err(Error::GroundingLimit { limit: self.limit });
        }
        Ok(())
    }
}

fn classify(clauses: &[Clause], strat: &Stratification) -> FxHashSet<Symbol> {
    let mut dynamic: FxHashSet<Symbol> = [Symbol::LEGAL, Symbol::NEXT, Symbol::GOAL, Symbol::TERMINAL]
        .into_iter()
        .collect();
    let reads_input: FxHashSet<Symbol> = clauses
        .iter()
        .filter(|c| {
            c.body
                .iter()
                .any(|l| l.predicate().is_some_and(Symbol::is_input))
        })
        .map(Clause::predicate)
        .collect();

    // Components come dependencies-first, and a component is dynamic as a
    // whole because its members reach each other.
    for component in &strat.components {
        let is_dynamic = component
            .predicates
            .iter()
            .any(|p| dynamic.contains(p) || reads_input.contains(p))
            || component.deps.iter().any(|&d| {
                strat.components[d]
                    .predicates
                    .iter()
                    .any(|p| dynamic.contains(p))
            });
        if is_dynamic {
            dynamic.extend(component.predicates.iter().copied());
        }
    }
    dynamic
}

fn clauses_by_component<'c>(clauses: &'c [Clause], strat: &Stratification) -> Vec<Vec<&'c Clause>> {
    let mut out = vec![Vec::new(); strat.components.len()];
    for clause in clauses {
        if let Some(&c) = strat.component_of.get(&clause.predicate()) {
            out[c].push(clause);
        }
    }
    out
}

fn seed_inputs(relations: &mut FxHashMap<Symbol, Relation>) {
    let init: Vec<Term> = relations
        .get(&Symbol::INIT)
        .map(|r| r.tuples().to_vec())
        .unwrap_or_default();
    let truth = relations.entry(Symbol::TRUE).or_default();
    for t in init {
        if let Some(fact) = t.args().first() {
            truth.insert(Term::func(Symbol::TRUE, vec![fact.clone()]));
        }
    }
    relations.entry(Symbol::DOES).or_default();
}

/// Copy `from` atoms into `to`, rewritten by `map`. Returns how many were new.
fn feed_back(
    relations: &mut FxHashMap<Symbol, Relation>,
    from: Symbol,
    to: Symbol,
    map: impl Fn(&Term) -> Option<Term>,
) -> usize {
    let Some(source) = relations.get(&from) else {
        return 0;
    };
    let fresh: Vec<Term> = source.tuples().iter().filter_map(|t| map(t)).collect();
    let target = relations.entry(to).or_default();
    let mut added = 0;
    for t in fresh {
        if target.insert(t) {
            added += 1;
        }
    }
    added
}

/// Run `clauses` until no new head appears (once if not recursive).
fn saturate(
    clauses: &[&Clause],
    recursive: bool,
    relations: &mut FxHashMap<Symbol, Relation>,
    dynamic: &FxHashSet<Symbol>,
    config: &CompileConfig,
    budget: &mut Budget,
) -> Result<()> {
    loop {
        let mut fresh: Vec<(Symbol, Term)> = Vec::new();
        for clause in clauses {
            let join = Join::plan(clause, relations, dynamic, config.order_rules);
            join.run(&mut |bindings| {
                if let Some(head) = clause.head.substitute(bindings) {
                    fresh.push((clause.predicate(), head));
                }
                Ok(())
            })?;
        }
        let mut changed = false;
        for (predicate, head) in fresh {
            if relations.entry(predicate).or_default().insert(head) {
                budget.used += 1;
                changed = true;
            }
        }
        budget.check()?;
        if !changed || !recursive {
            return Ok(());
        }
    }
}

fn instantiate(
    clause: &Clause,
    relations: &FxHashMap<Symbol, Relation>,
    dynamic: &FxHashSet<Symbol>,
    config: &CompileConfig,
    atoms: &mut AtomTable,
    rules: &mut Vec<GroundRule>,
) -> Result<()> {
    let is_dynamic = |p: Option<Symbol>| p.is_some_and(|p| p.is_input() || dynamic.contains(&p));
    let join = Join::plan(clause, relations, dynamic, config.order_rules);
    join.run(&mut |bindings| {
        let Some(head) = clause.head.substitute(bindings) else {
            return Ok(());
        };
        let mut pos: SmallVec<[_; 4]> = SmallVec::new();
        let mut neg: SmallVec<[_; 2]> = SmallVec::new();
        for lit in &clause.body {
            match lit {
                Literal::Atom(p) if is_dynamic(p.functor()) => {
                    if let Some(t) = p.substitute(bindings) {
                        pos.push(atoms.intern(t));
                    }
                }
                Literal::Not(p) if is_dynamic(p.functor()) => {
                    let Some(t) = p.substitute(bindings) else {
                        continue;
                    };
                    // Unreachable atoms are never true, so their negation holds.
                    let reachable = p
                        .functor()
                        .and_then(|f| relations.get(&f))
                        .is_some_and(|r| r.contains(&t));
                    if reachable {
                        neg.push(atoms.intern(t));
                    }
                }
                _ => {}
            }
        }
        pos.sort_unstable();
        pos.dedup();
        neg.sort_unstable();
        neg.dedup();
        if pos.iter().any(|a| neg.binary_search(a).is_ok()) {
            return Ok(());
        }
        rules.push(GroundRule {
            head: atoms.intern(head),
            pos,
            neg,
        });
        if rules.len() > config.max_ground_rules {
            return Err(Error::GroundingLimit {
                limit: config.max_ground_rules,
            });
        }
        Ok(())
    })
}

struct Step {
    literal: usize,
    /// All variables are bound before this step: probe instead of scan.
    probe: bool,
    /// Filter literals whose variables are all bound after this step.
    filters: SmallVec<[usize; 4]>,
}

/// Nested-loop join over the positive literals of one clause.
struct Join<'a> {
    clause: &'a Clause,
    relations: &'a FxHashMap<Symbol, Relation>,
    dynamic: &'a FxHashSet<Symbol>,
    pre: SmallVec<[usize; 4]>,
    steps: SmallVec<[Step; 8]>,
}

impl<'a> Join<'a> {
    fn plan(
        clause: &'a Clause,
        relations: &'a FxHashMap<Symbol, Relation>,
        dynamic: &'a FxHashSet<Symbol>,
        order: bool,
    ) -> Self {
        let body = &clause.body;
        let mut bound = vec![false; clause.var_count()];
        let mut remaining: Vec<usize> = (0..body.len())
            .filter(|&i| matches!(body[i], Literal::Atom(_)))
            .collect();
        let mut filters: Vec<(usize, Vec<VarId>)> = (0..body.len())
            .filter(|&i| !matches!(body[i], Literal::Atom(_)))
            .map(|i| (i, literal_vars(&body[i])))
            .collect();

        let size = |i: usize| {
            body[i]
                .predicate()
                .and_then(|p| relations.get(&p))
                .map_or(0, Relation::len)
        };

        let pre = take_ready(&mut filters, &bound);
        let mut steps = SmallVec::new();
        while !remaining.is_empty() {
            let pick = if order {
                // Fewest unbound variables first, then smallest relation.
                remaining
                    .iter()
                    .enumerate()
                    .min_by_key(|&(_, &i)| {
                        let free = literal_vars(&body[i])
                            .iter()
                            .filter(|v| !bound[v.index()])
                            .count();
                        (free, size(i))
                    })
                    .map_or(0, |(k, _)| k)
            } else {
                0
            };
            let literal = remaining.remove(pick);
            let vars = literal_vars(&body[literal]);
            let probe = vars.iter().all(|v| bound[v.index()]);
            for v in vars {
                bound[v.index()] = true;
            }
            steps.push(Step {
                literal,
                probe,
                filters: take_ready(&mut filters, &bound),
            });
        }
        Self {
            clause,
            relations,
            dynamic,
            pre,
            steps,
        }
    }

    fn run(&self, emit: &mut dyn FnMut(&Bindings) -> Result<()>) -> Result<()> {
        let mut bindings: Bindings = vec![None; self.clause.var_count()];
        let mut trail = Vec::new();
        if !self.filters_hold(&self.pre, &bindings) {
            return Ok(());
        }
        self.step(0, &mut bindings, &mut trail, emit)
    }

    fn step(
        &self,
        depth: usize,
        bindings: &mut Bindings,
        trail: &mut Vec<VarId>,
        emit: &mut dyn FnMut(&Bindings) -> Result<()>,
    ) -> Result<()> {
        let Some(step) = self.steps.get(depth) else {
            return emit(bindings);
        };
        let Literal::Atom(pattern) = &self.clause.body[step.literal] else {
            return Ok(());
        };
        let Some(relation) = pattern.functor().and_then(|p| self.relations.get(&p)) else {
            return Ok(());
        };

        if step.probe {
            let hit = pattern
                .substitute(bindings)
                .is_some_and(|t| relation.contains(&t));
            if hit && self.filters_hold(&step.filters, bindings) {
                self.step(depth + 1, bindings, trail, emit)?;
            }
            return Ok(());
        }

        for tuple in relation.tuples() {
            let mark = trail.len();
            if pattern.unify(tuple, bindings, trail) && self.filters_hold(&step.filters, bindings) {
                self.step(depth + 1, bindings, trail, emit)?;
            }
            unwind(bindings, trail, mark);
        }
        Ok(())
    }

    fn filters_hold(&self, filters: &[usize], bindings: &Bindings) -> bool {
        filters.iter().all(|&i| match &self.clause.body[i] {
            Literal::Distinct(a, b) => a.substitute(bindings) != b.substitute(bindings),
            Literal::Not(p) => match p.functor() {
                // Dynamic negations are decided at evaluation time.
                Some(f) if f.is_input() || self.dynamic.contains(&f) => true,
                Some(f) => !p
                    .substitute(bindings)
                    .is_some_and(|t| self.relations.get(&f).is_some_and(|r| r.contains(&t))),
                None => true,
            },
            _ => true,
        })
    }
}

fn literal_vars(lit: &Literal) -> Vec<VarId> {
    let mut out = Vec::new();
    match lit {
        Literal::Atom(p) | Literal::Not(p) => p.collect_vars(&mut out),
        Literal::Distinct(a, b) => {
            a.collect_vars(&mut out);
            b.collect_vars(&mut out);
        }
        Literal::Or(_) => {}
    }
    out.sort_unstable();
    out.dedup();
    out
}

fn take_ready(filters: &mut Vec<(usize, Vec<VarId>)>, bound: &[bool]) -> SmallVec<[usize; 4]> {
    let mut ready = SmallVec::new();
    filters.retain(|(i, vars)| {
        if vars.iter().all(|v| bound[v.index()]) {
            ready.push(*i);
            false
        } else {
            true
        }
    });
    ready
}

/// Warn about `arg` hints whose domain misses a computed value.
fn check_domain_hints(hints: &[Hint], relations: &FxHashMap<Symbol, Relation>, symbols: &SymbolTable) {
    let mut domains: FxHashMap<Symbol, FxHashSet<&Term>> = FxHashMap::default();
    for hint in hints {
        match hint {
            Hint::DomainS { domain, members } => domains.entry(*domain).or_default().extend(members),
            Hint::DomainP { domain, member } => {
                domains.entry(*domain).or_default().insert(member);
            }
            _ => {}
        }
    }

    let mut accepted = 0;
    for hint in hints {
        let Hint::Arg { predicate, position, domain } = hint else {
            continue;
        };
        let name = symbols.name(*predicate);
        let Some(members) = domains.get(domain) else {
            warn!("ignoring hint (arg {name} {}): undefined domain `{}`", position + 1, symbols.name(*domain));
            continue;
        };
        let missing = relations.get(predicate).and_then(|r| {
            r.tuples()
                .iter()
                .filter_map(|t| t.args().get(*position))
                .find(|v| !members.contains(v))
        });
        match missing {
            Some(value) => warn!(
                "ignoring hint (arg {name} {}): domain `{}` misses {}",
                position + 1,
                symbols.name(*domain),
                value.display(symbols)
            ),
            None => accepted += 1,
        }
    }
    if accepted > 0 {
        debug!("accepted {accepted} domain hints");
    }
}
