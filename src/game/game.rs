//! The compiled, immutable game.
//!
//! A `Game` is built once from description text and then shared behind an
//! `Arc` by every [`State`] of that game. Besides the rule database it holds
//! per-role indexes over the interesting atoms, so that answering
//! "what may white do" is a scan of white's candidate `legal` atoms rather
//! than of the whole interpretation.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use im::OrdSet;
use log::debug;
use rustc_hash::FxHashMap;

use crate::compile::{self, CompileConfig, Program};
use crate::core::{RoleId, RoleMap, Symbol, SymbolTable, Term, TermDisplay};
use crate::engine::{evaluate, AtomId, Interpretation, QueryPlan, RuleDatabase};
use crate::error::{Error, Result};
use crate::gdl;

use super::joint::{JointMove, Move};
use super::state::State;

/// Index of a base fact (the `X` of `(true X)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub u32);

impl FactId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every base fact that can ever be true, with its `(true X)` atom.
#[derive(Debug)]
pub(crate) struct FactTable {
    terms: Vec<Term>,
    true_atoms: Vec<AtomId>,
    index: FxHashMap<Term, FactId>,
}

impl FactTable {
    pub(crate) fn term(&self, fact: FactId) -> &Term {
        &self.terms[fact.index()]
    }

    pub(crate) fn get(&self, term: &Term) -> Option<FactId> {
        self.index.get(term).copied()
    }

    fn true_atom(&self, fact: FactId) -> AtomId {
        self.true_atoms[fact.index()]
    }
}

/// A compiled game description.
#[derive(Debug)]
pub struct Game {
    // === Description ===
    symbols: SymbolTable,
    roles: RoleMap<Term>,
    statics: FxHashMap<Symbol, Vec<Term>>,

    // === Inference ===
    db: RuleDatabase,
    query_plan: QueryPlan,
    next_plan: QueryPlan,

    // === Indexes ===
    pub(crate) facts: FactTable,
    initial: OrdSet<FactId>,
    legal: RoleMap<Vec<(AtomId, Move)>>,
    does: RoleMap<FxHashMap<Move, AtomId>>,
    goals: RoleMap<Vec<(AtomId, i64)>>,
    terminal: Option<AtomId>,
    next: Vec<(AtomId, FactId)>,
}

impl Game {
    /// Compile description text with the default configuration.
    pub fn from_description(text: &str) -> Result<Arc<Game>> {
        Self::compile(text, &CompileConfig::default())
    }

    pub fn compile(text: &str, config: &CompileConfig) -> Result<Arc<Game>> {
        let description = gdl::parse(text)?;
        let program = compile::compile(description, config)?;
        Ok(Arc::new(Self::build(program)?))
    }

    /// Read and compile a description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Arc<Game>> {
        let text = std::fs::read_to_string(path)?;
        Self::from_description(&text)
    }

    fn build(program: Program) -> Result<Game> {
        let Program {
            symbols,
            db,
            statics,
            ..
        } = program;
        let statics: FxHashMap<Symbol, Vec<Term>> = statics
            .into_iter()
            .map(|(p, r)| (p, r.into_tuples()))
            .collect();

        let role_terms: Vec<Term> = statics
            .get(&Symbol::ROLE)
            .map(|facts| facts.iter().filter_map(|t| t.args().first().cloned()).collect())
            .unwrap_or_default();
        if role_terms.is_empty() {
            return Err(Error::InvalidDescription("no roles declared".into()));
        }
        if role_terms.len() > 255 {
            return Err(Error::InvalidDescription(format!(
                "{} roles declared, at most 255 supported",
                role_terms.len()
            )));
        }
        let roles = RoleMap::from_vec(role_terms);
        let role_of: FxHashMap<&Term, RoleId> = roles.iter().map(|(r, t)| (t, r)).collect();

        // Base facts
        let mut facts = FactTable {
            terms: Vec::new(),
            true_atoms: Vec::new(),
            index: FxHashMap::default(),
        };
        for &atom in db.atoms_of(Symbol::TRUE) {
            if let [fact] = db.atoms().term(atom).args() {
                facts.index.insert(fact.clone(), FactId(facts.terms.len() as u32));
                facts.terms.push(fact.clone());
                facts.true_atoms.push(atom);
            }
        }
        let initial: OrdSet<FactId> = statics
            .get(&Symbol::INIT)
            .into_iter()
            .flatten()
            .filter_map(|t| t.args().first())
            .filter_map(|f| facts.get(f))
            .collect();

        // Per-role indexes
        let mut legal: RoleMap<Vec<(AtomId, Move)>> = RoleMap::with_default(roles.len());
        for &atom in db.atoms_of(Symbol::LEGAL) {
            if let [role, mv] = db.atoms().term(atom).args() {
                if let Some(&r) = role_of.get(role) {
                    legal[r].push((atom, mv.clone()));
                }
            }
        }
        let mut does: RoleMap<FxHashMap<Move, AtomId>> = RoleMap::with_default(roles.len());
        for &atom in db.atoms_of(Symbol::DOES) {
            if let [role, mv] = db.atoms().term(atom).args() {
                if let Some(&r) = role_of.get(role) {
                    does[r].insert(mv.clone(), atom);
                }
            }
        }
        let mut goals: RoleMap<Vec<(AtomId, i64)>> = RoleMap::with_default(roles.len());
        for &atom in db.atoms_of(Symbol::GOAL) {
            if let [role, value] = db.atoms().term(atom).args() {
                let score = match value {
                    Term::Const(s) => symbols.number(*s),
                    Term::Func(..) => None,
                }
                .ok_or_else(|| {
                    Error::InvalidDescription(format!(
                        "goal value {} is not a number",
                        value.display(&symbols)
                    ))
                })?;
                if let Some(&r) = role_of.get(role) {
                    goals[r].push((atom, score));
                }
            }
        }
        let terminal = db.atoms().get(&Term::Const(Symbol::TERMINAL));
        let next: Vec<(AtomId, FactId)> = db
            .atoms_of(Symbol::NEXT)
            .iter()
            .filter_map(|&atom| {
                let [fact] = db.atoms().term(atom).args() else {
                    return None;
                };
                facts.get(fact).map(|f| (atom, f))
            })
            .collect();

        let query_plan = db.plan_for(&[Symbol::LEGAL, Symbol::GOAL, Symbol::TERMINAL]);
        let next_plan = db.plan_for(&[Symbol::NEXT]);

        debug!(
            "game ready: {} roles, {} base facts ({} initial), {} components ({} query, {} next)",
            roles.len(),
            facts.terms.len(),
            initial.len(),
            db.component_count(),
            query_plan.components.len(),
            next_plan.components.len()
        );

        Ok(Game {
            symbols,
            roles,
            statics,
            db,
            query_plan,
            next_plan,
            facts,
            initial,
            legal,
            does,
            goals,
            terminal,
            next,
        })
    }

    // === Roles ===

    /// Role names in declaration order.
    #[must_use]
    pub fn roles(&self) -> &RoleMap<Term> {
        &self.roles
    }

    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn role_name(&self, role: RoleId) -> &Term {
        &self.roles[role]
    }

    /// Find a role by (case-insensitive) name.
    #[must_use]
    pub fn role_by_name(&self, name: &str) -> Option<RoleId> {
        let symbol = self.symbols.lookup(name)?;
        let wanted = Term::Const(symbol);
        self.roles.iter().find(|(_, t)| **t == wanted).map(|(r, _)| r)
    }

    // === Symbols ===

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Render a term with the spellings of this game.
    #[must_use]
    pub fn display<'a>(&'a self, term: &'a Term) -> TermDisplay<'a> {
        term.display(&self.symbols)
    }

    /// Parse move text such as `"(mark 1 1)"` or `"NOOP"`.
    pub fn parse_move(&self, text: &str) -> Result<Move> {
        gdl::parse_ground_term(text, &self.symbols)
    }

    /// Joint move from `(role name, move text)` pairs, each role exactly once.
    pub fn parse_joint<'t>(
        &self,
        pairs: impl IntoIterator<Item = (&'t str, &'t str)>,
    ) -> Result<JointMove> {
        let pairs = pairs
            .into_iter()
            .map(|(role, mv)| {
                let id = self
                    .role_by_name(role)
                    .ok_or_else(|| Error::IllegalMove(format!("no role named {role}")))?;
                Ok((id, self.parse_move(mv)?))
            })
            .collect::<Result<Vec<_>>>()?;
        JointMove::from_pairs(self.role_count(), pairs)
    }

    /// Stratum of a predicate, `None` for inputs and unknown names.
    #[must_use]
    pub fn stratum(&self, predicate: &str) -> Option<u32> {
        self.db.level(self.symbols.lookup(predicate)?)
    }

    #[must_use]
    pub fn database(&self) -> &RuleDatabase {
        &self.db
    }

    // === Queries ===

    /// All instances of `predicate` that hold in `state`, with `joint` as
    /// the `does` input when given.
    ///
    /// `state` may come from another compilation; its facts are then matched
    /// by text and `UnknownFact` is returned for any that can never hold here.
    pub fn evaluate(
        &self,
        predicate: &str,
        state: &State,
        joint: Option<&JointMove>,
    ) -> Result<Vec<Term>> {
        let Some(symbol) = self.symbols.lookup(predicate) else {
            return Ok(Vec::new());
        };
        if let Some(joint) = joint {
            if joint.len() != self.role_count() {
                return Err(Error::IllegalMove(format!(
                    "expected {} moves, got {}",
                    self.role_count(),
                    joint.len()
                )));
            }
        }
        if let Some(facts) = self.statics.get(&symbol) {
            return Ok(facts.clone());
        }
        let plan = self.db.plan_for(&[symbol]);
        let facts = self.facts_of(state)?;
        let interp = self.derive(&facts, joint, &plan);
        Ok(interp
            .filter(self.db.atoms_of(symbol))
            .map(|a| self.db.atoms().term(a).clone())
            .collect())
    }

    /// Base fact named by `text`.
    pub(crate) fn fact_from_text(&self, text: &str) -> Result<FactId> {
        gdl::parse_ground_term(text, &self.symbols)
            .ok()
            .and_then(|term| self.facts.get(&term))
            .ok_or_else(|| Error::UnknownFact(text.to_string()))
    }

    /// Fact ids of `state` in this game.
    fn facts_of<'s>(&self, state: &'s State) -> Result<Cow<'s, OrdSet<FactId>>> {
        let owner = state.game();
        if std::ptr::eq(Arc::as_ptr(owner), self) {
            return Ok(Cow::Borrowed(state.fact_set()));
        }
        state
            .facts()
            .map(|fact| self.fact_from_text(&owner.display(fact).to_string()))
            .collect::<Result<OrdSet<FactId>>>()
            .map(Cow::Owned)
    }

    pub(crate) fn initial_facts(&self) -> &OrdSet<FactId> {
        &self.initial
    }

    /// Evaluate `plan` over the given base facts and optional joint move.
    pub(crate) fn derive(
        &self,
        facts: &OrdSet<FactId>,
        joint: Option<&JointMove>,
        plan: &QueryPlan,
    ) -> Interpretation {
        let mut interp = Interpretation::new(&self.db);
        for &fact in facts {
            interp.assert(self.facts.true_atom(fact));
        }
        if let Some(joint) = joint {
            for (role, mv) in joint.iter() {
                if let Some(&atom) = self.does.get(role).and_then(|m| m.get(mv)) {
                    interp.assert(atom);
                }
            }
        }
        evaluate(&self.db, plan, &mut interp);
        interp
    }

    pub(crate) fn query(&self, facts: &OrdSet<FactId>) -> Interpretation {
        self.derive(facts, None, &self.query_plan)
    }

    /// Base facts of the successor under `joint`.
    pub(crate) fn successor(&self, facts: &OrdSet<FactId>, joint: &JointMove) -> OrdSet<FactId> {
        let interp = self.derive(facts, Some(joint), &self.next_plan);
        self.next
            .iter()
            .filter(|(atom, _)| interp.holds(*atom))
            .map(|&(_, fact)| fact)
            .collect()
    }

    pub(crate) fn legal_candidates(&self, role: RoleId) -> &[(AtomId, Move)] {
        &self.legal[role]
    }

    pub(crate) fn goal_candidates(&self, role: RoleId) -> &[(AtomId, i64)] {
        &self.goals[role]
    }

    pub(crate) fn terminal_atom(&self) -> Option<AtomId> {
        self.terminal
    }

    pub(crate) fn role_label(&self, role: RoleId) -> String {
        self.display(self.role_name(role)).to_string()
    }
}
