//! α-renaming of type variables to fresh, globally-unique names, under the
//! asymmetric scoping rule of §4.1: RHS scope is shared across the whole
//! equation list, LHS scope is private to a single equation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::term::{Equation, Name, Shape, Term};

/// The three independent variable namespaces. Two variables with the same
/// textual name but different kinds never denote the same binding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Kind {
    Dim,
    DType,
    Ellipsis,
}

/// Generates fresh, process-unique names by suffixing the original name
/// with a monotonically increasing counter.
struct NameGen {
    next: u64,
}

impl NameGen {
    fn new() -> Self {
        NameGen { next: 0 }
    }

    fn fresh(&mut self, base: &str) -> Name {
        let n = self.next;
        self.next += 1;
        Arc::from(format!("{}#{}", base, n))
    }
}

/// A per-scope renaming table: remembers the fresh name already assigned
/// to a `(kind, original name)` pair so repeated occurrences share it.
#[derive(Default)]
struct Scope {
    names: HashMap<(Kind, Name), Name>,
}

impl Scope {
    fn rename(&mut self, gen: &mut NameGen, kind: Kind, name: &Name) -> Name {
        self.names
            .entry((kind, name.clone()))
            .or_insert_with(|| gen.fresh(name))
            .clone()
    }
}

/// Renames every type variable in `equations`, returning an equivalent
/// list plus the fresh→original name map for every variable relabeled in
/// RHS scope. RHS variable identity (including the identity of a shared
/// ellipsis name across several parameters) is preserved across the whole
/// list; LHS variables are independently renamed per equation and so have
/// no single original name worth recovering (the same source name can
/// denote different LHS variables across equations).
///
/// The returned map is what lets a caller address [`crate::Solution`] by
/// the signature's own variable names (`A`, `dtype`, ...) rather than the
/// fresh names the solver actually binds internally: [`crate::unify`]
/// re-keys its result through it before returning.
pub fn relabel(equations: &[Equation]) -> (Vec<Equation>, HashMap<Name, Name>) {
    let mut gen = NameGen::new();
    let mut rhs_scope = Scope::default();
    let renamed_rhs: Vec<Term> = equations
        .iter()
        .map(|eq| rename_rhs_term(&eq.rhs, &mut gen, &mut rhs_scope))
        .collect();

    let renamed = equations
        .iter()
        .zip(renamed_rhs)
        .map(|(eq, rhs)| {
            let mut lhs_scope = Scope::default();
            let lhs = rename_lhs_term(&eq.lhs, &mut gen, &mut lhs_scope);
            Equation { lhs, rhs }
        })
        .collect();

    let originals = rhs_scope
        .names
        .into_iter()
        .map(|((_, original), fresh)| (fresh, original))
        .collect();

    (renamed, originals)
}

fn rename_lhs_term(term: &Term, gen: &mut NameGen, scope: &mut Scope) -> Term {
    match term {
        Term::DimInt(n) => Term::DimInt(*n),
        Term::DimVar(name) => Term::DimVar(scope.rename(gen, Kind::Dim, name)),
        Term::DType(tag) => Term::DType(tag.clone()),
        Term::DTypeVar(name) => Term::DTypeVar(scope.rename(gen, Kind::DType, name)),
        // An ellipsis never legally occurs on a LHS (enforced at
        // `Equation::new`), but renaming is total over the term shape so
        // that callers relabeling a bare term in isolation don't panic.
        Term::Ellipsis(Some(name)) => Term::Ellipsis(Some(scope.rename(gen, Kind::Ellipsis, name))),
        Term::Ellipsis(None) => Term::Ellipsis(Some(gen.fresh("ellipsis"))),
        Term::Shape(shape) => Term::Shape(rename_shape(shape, gen, scope, rename_lhs_term)),
        Term::Coerce(inner) => Term::Coerce(Box::new(rename_lhs_term(inner, gen, scope))),
    }
}

fn rename_rhs_term(term: &Term, gen: &mut NameGen, scope: &mut Scope) -> Term {
    match term {
        Term::DimInt(n) => Term::DimInt(*n),
        Term::DimVar(name) => Term::DimVar(scope.rename(gen, Kind::Dim, name)),
        Term::DType(tag) => Term::DType(tag.clone()),
        Term::DTypeVar(name) => Term::DTypeVar(scope.rename(gen, Kind::DType, name)),
        Term::Ellipsis(Some(name)) => Term::Ellipsis(Some(scope.rename(gen, Kind::Ellipsis, name))),
        // Anonymous: always fresh, never shared, even within one RHS.
        Term::Ellipsis(None) => Term::Ellipsis(Some(gen.fresh("ellipsis"))),
        Term::Shape(shape) => Term::Shape(rename_shape(shape, gen, scope, rename_rhs_term)),
        Term::Coerce(inner) => Term::Coerce(Box::new(rename_rhs_term(inner, gen, scope))),
    }
}

fn rename_shape(
    shape: &Shape,
    gen: &mut NameGen,
    scope: &mut Scope,
    rename: fn(&Term, &mut NameGen, &mut Scope) -> Term,
) -> Shape {
    Shape {
        dims: shape.dims.iter().map(|d| rename(d, gen, scope)).collect(),
        elt: Box::new(rename(&shape.elt, gen, scope)),
    }
}
