//! Indexed ground rule database.
//!
//! ## Layout
//!
//! - Atoms are interned ground terms (`(true (cell 1 1 b))`, `(legal white noop)`).
//! - Rules are sorted by the evaluation component of their head, so each
//!   component owns a contiguous range.
//! - Watch lists (CSR layout) map an atom to the rules of the *same*
//!   component that use it positively. Atoms of lower components are final
//!   before a component starts and are counted once up front.

use std::ops::Range;

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::compile::stratify::{Component, Stratification};
use crate::core::{Symbol, Term};

/// Index of an interned ground atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

impl AtomId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned ground atoms.
#[derive(Clone, Debug, Default)]
pub struct AtomTable {
    terms: Vec<Term>,
    index: FxHashMap<Term, AtomId>,
}

impl AtomTable {
    pub fn intern(&mut self, term: Term) -> AtomId {
        if let Some(&id) = self.index.get(&term) {
            return id;
        }
        let id = AtomId(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.index.insert(term, id);
        id
    }

    #[must_use]
    pub fn get(&self, term: &Term) -> Option<AtomId> {
        self.index.get(term).copied()
    }

    #[must_use]
    pub fn term(&self, id: AtomId) -> &Term {
        &self.terms[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &Term)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, t)| (AtomId(i as u32), t))
    }
}

/// `head :- pos..., not neg...` over interned atoms.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundRule {
    pub head: AtomId,
    pub pos: SmallVec<[AtomId; 4]>,
    pub neg: SmallVec<[AtomId; 2]>,
}

/// Components to evaluate, in dependency order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub components: Vec<usize>,
}

#[derive(Debug)]
pub struct RuleDatabase {
    atoms: AtomTable,
    rules: Vec<GroundRule>,
    ranges: Vec<Range<usize>>,
    watch_offsets: Vec<u32>,
    watch_rules: Vec<u32>,
    components: Vec<Component>,
    component_of: FxHashMap<Symbol, usize>,
    by_predicate: FxHashMap<Symbol, Vec<AtomId>>,
}

impl RuleDatabase {
    pub fn build(atoms: AtomTable, mut rules: Vec<GroundRule>, strat: Stratification) -> Self {
        let Stratification {
            components,
            component_of,
            ..
        } = strat;

        let atom_component: Vec<Option<usize>> = atoms
            .iter()
            .map(|(_, t)| component_of.get(&t.functor()).copied())
            .collect();
        let head_component = |r: &GroundRule| atom_component[r.head.index()].unwrap_or(usize::MAX);
        rules.sort_by_key(head_component);

        let mut ranges = vec![0..0; components.len()];
        let mut start = 0;
        while start < rules.len() {
            let c = head_component(&rules[start]);
            let mut end = start;
            while end < rules.len() && head_component(&rules[end]) == c {
                end += 1;
            }
            if let Some(range) = ranges.get_mut(c) {
                *range = start..end;
            }
            start = end;
        }

        // Count, then fill.
        let mut counts = vec![0u32; atoms.len() + 1];
        for rule in &rules {
            let c = head_component(rule);
            for a in &rule.pos {
                if atom_component[a.index()] == Some(c) {
                    counts[a.index() + 1] += 1;
                }
            }
        }
        for i in 1..counts.len() {
            counts[i] += counts[i - 1];
        }
        let watch_offsets = counts.clone();
        let mut fill = counts;
        let mut watch_rules = vec![0u32; watch_offsets.last().copied().unwrap_or(0) as usize];
        for (r, rule) in rules.iter().enumerate() {
            let c = head_component(rule);
            for a in &rule.pos {
                if atom_component[a.index()] == Some(c) {
                    watch_rules[fill[a.index()] as usize] = r as u32;
                    fill[a.index()] += 1;
                }
            }
        }

        let mut by_predicate: FxHashMap<Symbol, Vec<AtomId>> = FxHashMap::default();
        for (id, term) in atoms.iter() {
            by_predicate.entry(term.functor()).or_default().push(id);
        }

        debug!(
            "rule database: {} atoms, {} rules, {} watch entries",
            atoms.len(),
            rules.len(),
            watch_rules.len()
        );
        Self {
            atoms,
            rules,
            ranges,
            watch_offsets,
            watch_rules,
            components,
            component_of,
            by_predicate,
        }
    }

    #[must_use]
    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    #[must_use]
    pub fn rules(&self) -> &[GroundRule] {
        &self.rules
    }

    #[must_use]
    pub fn rule_range(&self, component: usize) -> Range<usize> {
        self.ranges[component].clone()
    }

    /// Rules of the head's component that use `atom` positively.
    #[must_use]
    pub fn watchers(&self, atom: AtomId) -> &[u32] {
        let i = atom.index();
        let (lo, hi) = (self.watch_offsets[i] as usize, self.watch_offsets[i + 1] as usize);
        &self.watch_rules[lo..hi]
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Atoms whose functor is `predicate`, in interning order.
    #[must_use]
    pub fn atoms_of(&self, predicate: Symbol) -> &[AtomId] {
        self.by_predicate
            .get(&predicate)
            .map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn level(&self, predicate: Symbol) -> Option<u32> {
        self.component_of
            .get(&predicate)
            .map(|&c| self.components[c].level)
    }

    /// Smallest set of components that computes every predicate in `targets`.
    #[must_use]
    pub fn plan_for(&self, targets: &[Symbol]) -> QueryPlan {
        let mut needed = vec![false; self.components.len()];
        let mut stack: Vec<usize> = targets
            .iter()
            .filter_map(|p| self.component_of.get(p).copied())
            .collect();
        while let Some(c) = stack.pop() {
            if std::mem::replace(&mut needed[c], true) {
                continue;
            }
            stack.extend(self.components[c].deps.iter().copied());
        }
        QueryPlan {
            components: (0..self.components.len())
                .filter(|&c| needed[c] && !self.ranges[c].is_empty())
                .collect(),
        }
    }
}
