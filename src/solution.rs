//! The solver's working state and the public result type: a mapping from
//! variable name to term, partitioned by variable kind per §3.

use std::collections::HashMap;

use crate::decompose::{Dim, Elt};
use crate::term::{DType, Name};

/// A substitution from type variables to terms, as returned by
/// [`crate::unify`]. Partitioned by variable kind: a dim-var maps to a
/// single dimension, a dtype-var to a single element type, and an
/// ellipsis-var to an ordered (possibly empty) sequence of dimensions.
///
/// Once returned, a `Solution` is read-only: it is fully resolved (no
/// binding's image mentions a variable that is itself bound) and
/// idempotent, per invariants 2–3 of §3.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub(crate) dims: HashMap<Name, Dim>,
    pub(crate) dtypes: HashMap<Name, Elt>,
    pub(crate) ellipses: HashMap<Name, Vec<Dim>>,
}

impl Solution {
    pub(crate) fn new() -> Solution {
        Solution::default()
    }

    /// The dimension bound to a dim-variable, fully resolved, if any.
    pub fn dim(&self, name: &str) -> Option<Dim> {
        match self.dims.get(name) {
            Some(d) => match self.resolve_dim(d) {
                Dim::Var(v) if v.as_ref() == name => None,
                resolved => Some(resolved),
            },
            None => None,
        }
    }

    /// The concrete element type bound to a dtype-variable, fully
    /// resolved, if any. `None` both when the variable was never
    /// constrained and when its binding chain ends at another free
    /// variable rather than a concrete tag.
    pub fn dtype(&self, name: &str) -> Option<DType> {
        match self.dtypes.get(name) {
            Some(e) => match self.resolve_elt(e) {
                Elt::Type(tag) => Some(tag),
                Elt::Var(_) => None,
            },
            None => None,
        }
    }

    /// The dimension sequence bound to an ellipsis-variable, if any.
    pub fn ellipsis(&self, name: &str) -> Option<&[Dim]> {
        self.ellipses.get(name).map(Vec::as_slice)
    }

    /// Resolve a dim-var binding chain to its final value: follows
    /// `Dim::Var` links until reaching a concrete `Dim::Int` or an unbound
    /// variable (returned as `Dim::Var`).
    pub(crate) fn resolve_dim(&self, dim: &Dim) -> Dim {
        let mut current = dim.clone();
        loop {
            match &current {
                Dim::Var(name) => match self.dims.get(name) {
                    Some(next) if next != &current => current = next.clone(),
                    _ => return current,
                },
                Dim::Int(_) => return current,
            }
        }
    }

    /// Resolve a dtype-var binding chain to its final value, analogous to
    /// [`Solution::resolve_dim`].
    pub(crate) fn resolve_elt(&self, elt: &Elt) -> Elt {
        let mut current = elt.clone();
        loop {
            match &current {
                Elt::Var(name) => match self.dtypes.get(name) {
                    Some(next) if next != &current => current = next.clone(),
                    _ => return current,
                },
                Elt::Type(_) => return current,
            }
        }
    }

    /// Re-keys every variable this solution mentions — as a map key and as
    /// any `Dim::Var`/`Elt::Var` value it's bound to — from the relabeler's
    /// fresh name back to the original source name, using the fresh→
    /// original map [`crate::relabel::relabel`] produced for RHS scope.
    /// A fresh name with no entry in `originals` (an LHS-local temporary,
    /// never addressable by a caller) is left as-is.
    ///
    /// [`crate::unify`] calls this once, on the fully solved result, so
    /// that `Solution::dim`/`dtype`/`ellipsis` can be looked up by the
    /// signature's own variable names rather than the solver's internal
    /// ones.
    pub(crate) fn rekey(self, originals: &HashMap<Name, Name>) -> Solution {
        Solution {
            dims: self
                .dims
                .into_iter()
                .map(|(name, dim)| (original_name(originals, &name), rekey_dim(originals, dim)))
                .collect(),
            dtypes: self
                .dtypes
                .into_iter()
                .map(|(name, elt)| (original_name(originals, &name), rekey_elt(originals, elt)))
                .collect(),
            ellipses: self
                .ellipses
                .into_iter()
                .map(|(name, seq)| {
                    let seq = seq.into_iter().map(|d| rekey_dim(originals, d)).collect();
                    (original_name(originals, &name), seq)
                })
                .collect(),
        }
    }
}

/// `name`'s original source name per `originals`, or `name` itself if it
/// has no entry there (an LHS-local temporary never exposed to callers).
fn original_name(originals: &HashMap<Name, Name>, name: &Name) -> Name {
    originals.get(name).cloned().unwrap_or_else(|| name.clone())
}

fn rekey_dim(originals: &HashMap<Name, Name>, dim: Dim) -> Dim {
    match dim {
        Dim::Int(n) => Dim::Int(n),
        Dim::Var(name) => Dim::Var(original_name(originals, &name)),
    }
}

fn rekey_elt(originals: &HashMap<Name, Name>, elt: Elt) -> Elt {
    match elt {
        Elt::Type(tag) => Elt::Type(tag),
        Elt::Var(name) => Elt::Var(original_name(originals, &name)),
    }
}
