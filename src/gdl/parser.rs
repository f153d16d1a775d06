//! Parser from description text to [`Clause`]s.
//!
//! Parsing runs in two passes: the lexemes are first assembled into
//! s-expressions (catching unbalanced parentheses), then each top-level
//! s-expression is turned into a clause. Symbols are resolved through an
//! [`Interner`], so the same code serves both compiling a description and
//! parsing a move against an already compiled game.

use crate::core::{Pattern, Symbol, SymbolTable, Term, VarId};
use crate::error::{Error, Result};

use super::clause::{Clause, Literal};
use super::lexer::{tokenize, Token};
use super::Description;

/// Resolves identifier spellings to symbols.
pub trait Interner {
    /// `None` if the identifier cannot be resolved.
    fn resolve(&mut self, name: &str) -> Option<Symbol>;
}

impl Interner for SymbolTable {
    fn resolve(&mut self, name: &str) -> Option<Symbol> {
        Some(self.intern(name))
    }
}

/// Resolves only identifiers that are already known.
pub struct Lookup<'a>(pub &'a SymbolTable);

impl Interner for Lookup<'_> {
    fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.0.lookup(name)
    }
}

#[derive(Debug)]
enum SExpr<'s> {
    Ident(&'s str, usize),
    Var(&'s str, usize),
    Arrow(usize),
    List(Vec<SExpr<'s>>, usize),
}

impl SExpr<'_> {
    fn offset(&self) -> usize {
        match self {
            SExpr::Ident(_, o) | SExpr::Var(_, o) | SExpr::Arrow(o) | SExpr::List(_, o) => *o,
        }
    }
}

fn read<'s>(source: &'s str) -> Result<Vec<SExpr<'s>>> {
    let mut top = Vec::new();
    let mut stack: Vec<(Vec<SExpr<'s>>, usize)> = Vec::new();

    for lexeme in tokenize(source)? {
        let item = match lexeme.token {
            Token::Open => {
                stack.push((Vec::new(), lexeme.offset));
                continue;
            }
            Token::Close => match stack.pop() {
                Some((items, start)) => SExpr::List(items, start),
                None => return Err(Error::parse("unbalanced `)`", source, lexeme.offset)),
            },
            Token::Arrow => SExpr::Arrow(lexeme.offset),
            Token::Var => SExpr::Var(&lexeme.text[1..], lexeme.offset),
            Token::Ident => SExpr::Ident(lexeme.text, lexeme.offset),
        };
        match stack.last_mut() {
            Some((items, _)) => items.push(item),
            None => top.push(item),
        }
    }

    match stack.first() {
        Some((_, start)) => Err(Error::parse("unclosed `(`", source, *start)),
        None => Ok(top),
    }
}

struct Builder<'a, I> {
    source: &'a str,
    symbols: &'a mut I,
    vars: Vec<Box<str>>,
}

impl<I: Interner> Builder<'_, I> {
    fn err(&self, message: impl Into<String>, offset: usize) -> Error {
        Error::parse(message, self.source, offset)
    }

    fn symbol(&mut self, name: &str, offset: usize) -> Result<Symbol> {
        self.symbols
            .resolve(name)
            .ok_or_else(|| Error::parse(format!("unknown symbol `{name}`"), self.source, offset))
    }

    fn var(&mut self, name: &str, offset: usize) -> Result<VarId> {
        let key = name.to_ascii_lowercase();
        if let Some(i) = self.vars.iter().position(|v| **v == *key) {
            return Ok(VarId(i as u16));
        }
        if self.vars.len() > u16::MAX as usize {
            return Err(self.err("too many variables in one clause", offset));
        }
        self.vars.push(key.into_boxed_str());
        Ok(VarId(self.vars.len() as u16 - 1))
    }

    fn functor(&mut self, items: &[SExpr<'_>], offset: usize) -> Result<Symbol> {
        match items.first() {
            None => Err(self.err("empty list where a term is required", offset)),
            Some(SExpr::Ident(name, o)) => self.symbol(name, *o),
            Some(SExpr::Var(_, o)) => Err(self.err("variable used as a functor", *o)),
            Some(SExpr::List(_, o)) => Err(self.err("compound term used as a functor", *o)),
            Some(SExpr::Arrow(o)) => Err(self.err("unexpected `<=`", *o)),
        }
    }

    fn term(&mut self, expr: &SExpr<'_>) -> Result<Pattern> {
        match expr {
            SExpr::Ident(name, o) => Ok(Pattern::Const(self.symbol(name, *o)?)),
            SExpr::Var(name, o) => Ok(Pattern::Var(self.var(name, *o)?)),
            SExpr::Arrow(o) => Err(self.err("unexpected `<=`", *o)),
            SExpr::List(items, o) => {
                let f = self.functor(items, *o)?;
                if items.len() == 1 {
                    return Ok(Pattern::Const(f));
                }
                let args = items[1..]
                    .iter()
                    .map(|a| self.term(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Pattern::Func(f, args))
            }
        }
    }

    /// A body literal, as a conjunction (negated disjunctions yield several).
    fn literal(&mut self, expr: &SExpr<'_>) -> Result<Vec<Literal>> {
        let (items, offset) = match expr {
            SExpr::List(items, o) => (items, *o),
            SExpr::Ident(..) => return Ok(vec![Literal::Atom(self.term(expr)?)]),
            SExpr::Var(_, o) => return Err(self.err("variable used as a literal", *o)),
            SExpr::Arrow(o) => return Err(self.err("unexpected `<=`", *o)),
        };
        let f = self.functor(items, offset)?;
        let args = &items[1..];
        match f {
            Symbol::NOT => {
                let [inner] = args else {
                    return Err(self.err("`not` takes exactly one literal", offset));
                };
                let inner = self.literal(inner)?;
                self.negate(inner, offset)
            }
            Symbol::DISTINCT => {
                let [a, b] = args else {
                    return Err(self.err("`distinct` takes exactly two terms", offset));
                };
                Ok(vec![Literal::Distinct(self.term(a)?, self.term(b)?)])
            }
            Symbol::OR => {
                if args.is_empty() {
                    return Err(self.err("`or` needs at least one alternative", offset));
                }
                let mut alts = args
                    .iter()
                    .map(|a| self.literal(a))
                    .collect::<Result<Vec<_>>>()?;
                if alts.len() == 1 {
                    return Ok(alts.remove(0));
                }
                Ok(vec![Literal::Or(alts)])
            }
            _ => Ok(vec![Literal::Atom(self.term(expr)?)]),
        }
    }

    fn negate(&self, conj: Vec<Literal>, offset: usize) -> Result<Vec<Literal>> {
        let [lit] = <[Literal; 1]>::try_from(conj)
            .map_err(|_| self.err("cannot negate a conjunction", offset))?;
        match lit {
            Literal::Atom(p) => Ok(vec![Literal::Not(p)]),
            Literal::Not(p) => Ok(vec![Literal::Atom(p)]),
            Literal::Distinct(..) => Err(self.err("cannot negate `distinct`", offset)),
            // not (a or b) == (not a) and (not b)
            Literal::Or(alts) => {
                let mut out = Vec::with_capacity(alts.len());
                for alt in alts {
                    out.extend(self.negate(alt, offset)?);
                }
                Ok(out)
            }
        }
    }

    fn head(&mut self, expr: &SExpr<'_>) -> Result<Pattern> {
        if let SExpr::Var(_, o) = expr {
            return Err(self.err("variable used as a rule head", *o));
        }
        let head = self.term(expr)?;
        if let Some(f) = head.functor() {
            if matches!(
                f,
                Symbol::TRUE | Symbol::DOES | Symbol::NOT | Symbol::DISTINCT | Symbol::OR
            ) {
                return Err(self.err("built-in predicate cannot be defined", expr.offset()));
            }
        }
        Ok(head)
    }

    fn clause(&mut self, expr: &SExpr<'_>) -> Result<Clause> {
        self.vars.clear();
        let offset = expr.offset();
        let (head, body) = match expr {
            SExpr::Var(_, o) => return Err(self.err("variable used as a clause", *o)),
            SExpr::Arrow(o) => return Err(self.err("`<=` outside of a rule", *o)),
            SExpr::List(items, _) if matches!(items.first(), Some(SExpr::Arrow(_))) => {
                let head = match items.get(1) {
                    Some(h) => self.head(h)?,
                    None => return Err(self.err("`<=` without a head", offset)),
                };
                if items.len() < 3 {
                    return Err(self.err("`<=` without a body", offset));
                }
                let mut body = Vec::with_capacity(items.len() - 2);
                for lit in &items[2..] {
                    body.extend(self.literal(lit)?);
                }
                (head, body)
            }
            _ => (self.head(expr)?, Vec::new()),
        };
        Ok(Clause {
            head,
            body,
            var_names: std::mem::take(&mut self.vars),
            offset,
        })
    }
}

/// Parse a complete description.
pub fn parse(source: &str) -> Result<Description> {
    let exprs = read(source)?;
    let mut symbols = SymbolTable::new();
    let mut clauses = Vec::with_capacity(exprs.len());
    {
        let mut builder = Builder {
            source,
            symbols: &mut symbols,
            vars: Vec::new(),
        };
        for expr in &exprs {
            clauses.push(builder.clause(expr)?);
        }
    }
    Ok(Description { symbols, clauses })
}

/// Parse one ground term using only symbols already in `symbols`.
pub fn parse_ground_term(source: &str, symbols: &SymbolTable) -> Result<Term> {
    let exprs = read(source)?;
    let [expr] = exprs.as_slice() else {
        return Err(Error::parse("expected exactly one term", source, 0));
    };
    let mut lookup = Lookup(symbols);
    let mut builder = Builder {
        source,
        symbols: &mut lookup,
        vars: Vec::new(),
    };
    let pattern = builder.term(expr)?;
    pattern
        .to_term()
        .ok_or_else(|| Error::parse("variable in a ground term", source, expr.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(src: &str) -> (String, usize) {
        match parse(src) {
            Err(Error::Parse { message, offset, .. }) => (message, offset),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_facts_and_rules() {
        let desc = parse(
            "(role white) (role black)
             (init (control white))
             terminal
             (<= (legal ?w (mark ?x ?y)) (true (cell ?x ?y b)) (true (control ?w)))",
        )
        .unwrap();
        assert_eq!(desc.clauses.len(), 5);
        assert!(desc.clauses[0].is_fact());
        assert_eq!(desc.clauses[3].head, Pattern::Const(Symbol::TERMINAL));
        let rule = &desc.clauses[4];
        assert_eq!(rule.predicate(), Symbol::LEGAL);
        assert_eq!(rule.body.len(), 2);
        assert_eq!(rule.var_count(), 3);
    }

    #[test]
    fn test_case_insensitive_keywords_and_vars() {
        let desc = parse("(<= (LEGAL ?P NOOP) (ROLE ?p) (NOT (TRUE (CONTROL ?p))))").unwrap();
        let rule = &desc.clauses[0];
        assert_eq!(rule.predicate(), Symbol::LEGAL);
        assert_eq!(rule.var_count(), 1);
        assert!(matches!(rule.body[1], Literal::Not(_)));
    }

    #[test]
    fn test_not_or_is_rewritten() {
        let desc = parse("(<= p (q ?x) (not (or (r ?x) (s ?x))))").unwrap();
        let body = &desc.clauses[0].body;
        assert_eq!(body.len(), 3);
        assert!(matches!(body[1], Literal::Not(_)));
        assert!(matches!(body[2], Literal::Not(_)));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let (msg, offset) = parse_err("(role white))");
        assert!(msg.contains("unbalanced"));
        assert_eq!(offset, 12);

        let (msg, offset) = parse_err("(role white) (init (cell 1 1 b)");
        assert!(msg.contains("unclosed"));
        assert_eq!(offset, 13);
    }

    #[test]
    fn test_malformed_rules() {
        assert!(parse_err("(<= (p ?x))").0.contains("without a body"));
        assert!(parse_err("(<=)").0.contains("without a head"));
        assert!(parse_err("(<= ?x (q ?x))").0.contains("rule head"));
        assert!(parse_err("(<= p ())").0.contains("empty list"));
        assert!(parse_err("(<= p (?f a))").0.contains("functor"));
        assert!(parse_err("(<= p ((f a) b))").0.contains("functor"));
        assert!(parse_err("?x").0.contains("clause"));
        assert!(parse_err("(<= (true p) q)").0.contains("built-in"));
    }

    #[test]
    fn test_parse_ground_term() {
        let desc = parse("(role white) (<= (legal white (mark 1 1)) (role white))").unwrap();
        let term = parse_ground_term("(MARK 1 1)", &desc.symbols).unwrap();
        assert_eq!(term.display(&desc.symbols).to_string(), "(mark 1 1)");

        assert!(parse_ground_term("(mark 9 9)", &desc.symbols).is_err());
        assert!(parse_ground_term("(mark ?x 1)", &desc.symbols).is_err());
        assert!(parse_ground_term("a b", &desc.symbols).is_err());
    }
}
