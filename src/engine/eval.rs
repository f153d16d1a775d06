//! Semi-naive propositional evaluation of a [`QueryPlan`].
//!
//! Components are processed in dependency order. For each one:
//!
//! 1. Every rule with a true negated atom is blocked. Negated atoms always
//!    belong to lower components, so this is final.
//! 2. The remaining rules count their positive atoms that are still false.
//!    Rules at zero put their head on the queue.
//! 3. Popping an atom marks it true (once) and decrements the counters of
//!    the same-component rules watching it.
//!
//! The queue empties exactly at the component's least fixpoint.

use log::trace;

use super::database::{AtomId, QueryPlan, RuleDatabase};

const BLOCKED: u32 = u32::MAX;

/// Truth assignment over the atoms of one database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interpretation {
    truth: Vec<bool>,
}

impl Interpretation {
    /// All atoms false.
    #[must_use]
    pub fn new(db: &RuleDatabase) -> Self {
        Self {
            truth: vec![false; db.atoms().len()],
        }
    }

    /// Set an input atom (`true` or `does`) before evaluation.
    pub fn assert(&mut self, atom: AtomId) {
        self.truth[atom.index()] = true;
    }

    #[must_use]
    pub fn holds(&self, atom: AtomId) -> bool {
        self.truth[atom.index()]
    }

    /// True atoms among `atoms`.
    pub fn filter<'a>(&'a self, atoms: &'a [AtomId]) -> impl Iterator<Item = AtomId> + 'a {
        atoms.iter().copied().filter(|a| self.holds(*a))
    }

    /// Number of true atoms.
    #[must_use]
    pub fn count(&self) -> usize {
        self.truth.iter().filter(|t| **t).count()
    }
}

/// Run every component of `plan` on `interp`.
pub fn evaluate(db: &RuleDatabase, plan: &QueryPlan, interp: &mut Interpretation) {
    let mut missing = Vec::new();
    let mut queue = Vec::new();
    for &component in &plan.components {
        evaluate_component(db, component, interp, &mut missing, &mut queue);
    }
}

fn evaluate_component(
    db: &RuleDatabase,
    component: usize,
    interp: &mut Interpretation,
    missing: &mut Vec<u32>,
    queue: &mut Vec<AtomId>,
) {
    let range = db.rule_range(component);
    let rules = &db.rules()[range.clone()];
    missing.clear();
    missing.reserve(rules.len());
    queue.clear();

    for rule in rules {
        if rule.neg.iter().any(|a| interp.holds(*a)) {
            missing.push(BLOCKED);
            continue;
        }
        let count = rule.pos.iter().filter(|a| !interp.holds(**a)).count() as u32;
        if count == 0 {
            queue.push(rule.head);
        }
        missing.push(count);
    }

    let mut derived = 0usize;
    while let Some(atom) = queue.pop() {
        if interp.holds(atom) {
            continue;
        }
        interp.truth[atom.index()] = true;
        derived += 1;
        for &r in db.watchers(atom) {
            let k = r as usize - range.start;
            let left = &mut missing[k];
            if *left == BLOCKED {
                continue;
            }
            *left -= 1;
            if *left == 0 {
                queue.push(db.rules()[r as usize].head);
            }
        }
    }
    trace!(
        "component {component}: {} rules, {derived} atoms derived",
        rules.len()
    );
}
