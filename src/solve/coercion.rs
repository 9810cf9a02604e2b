//! Phase two of the solver: broadcasting and dtype casting over the
//! sub-equations the decomposer marked coercible, applied after the
//! equality phase has pinned every non-coerced occurrence (§4.4, §9).

use crate::decompose::{Dim, Elt, SubEquation};
use crate::error::{Offending, UnifyError};
use crate::lattice::DTypeLattice;
use crate::solution::Solution;
use crate::solve::equality::{bind_dim, bind_elt, dim_occurs};
use crate::term::Name;

/// Run the coercion solver over every sub-equation marked coercible,
/// extending `solution` in place. Must be called after
/// [`crate::solve::equality::solve_equality`] has populated `solution` from
/// the non-coercible sub-equations.
pub fn solve_coercion(
    solution: &mut Solution,
    subs: &[SubEquation],
    lattice: &DTypeLattice,
) -> Result<(), UnifyError> {
    for sub in subs.iter().filter(|s| s.coercible()) {
        match sub.clone() {
            SubEquation::Dim {
                lhs, rhs, eq_index, ..
            } => coerce_dim(solution, lhs, rhs, eq_index)?,
            SubEquation::DType {
                lhs, rhs, eq_index, ..
            } => coerce_elt(solution, lattice, lhs, rhs, eq_index)?,
            SubEquation::Ellipsis {
                name, seq, eq_index, ..
            } => coerce_ellipsis(solution, name, seq, eq_index)?,
        }
    }
    Ok(())
}

/// One broadcasting step: `lhs` may be coerced (broadcast) to match `rhs`.
fn coerce_dim(solution: &mut Solution, lhs: Dim, rhs: Dim, eq_index: usize) -> Result<(), UnifyError> {
    let l = solution.resolve_dim(&lhs);
    let r = solution.resolve_dim(&rhs);
    match (&l, &r) {
        (Dim::Int(1), _) => Ok(()),
        // `r` is already pinned to the broadcastable `1`: the symmetric
        // view of the rule above, so any `l` is absorbed too.
        (_, Dim::Int(1)) => Ok(()),
        (Dim::Var(x), Dim::Var(y)) if x == y => Ok(()),
        (_, Dim::Var(y)) => bind_dim(solution, y.clone(), l, eq_index),
        (Dim::Int(a), Dim::Int(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(UnifyError::BroadcastIncompatible {
                    left: *a,
                    right: *b,
                    offending: Offending {
                        lhs: l.to_term(),
                        rhs: r.to_term(),
                        equation: eq_index,
                    },
                })
            }
        }
        // `l` is an unbound variable and `r` is already concrete: nothing
        // on the LHS constrains a broadcast, so pin it directly.
        (Dim::Var(x), _) => bind_dim(solution, x.clone(), r, eq_index),
    }
}

/// One casting step: `lhs` may be coerced to `rhs`'s dtype under `lattice`.
fn coerce_elt(
    solution: &mut Solution,
    lattice: &DTypeLattice,
    lhs: Elt,
    rhs: Elt,
    eq_index: usize,
) -> Result<(), UnifyError> {
    let l = solution.resolve_elt(&lhs);
    let r = solution.resolve_elt(&rhs);
    match (&l, &r) {
        (Elt::Var(x), Elt::Var(y)) if x == y => Ok(()),
        (_, Elt::Var(y)) => bind_elt(solution, y.clone(), l, eq_index),
        (Elt::Type(a), Elt::Type(b)) => {
            if a == b {
                Ok(())
            } else if lattice.castable(a, b) {
                Ok(())
            } else {
                Err(UnifyError::CastIncompatible {
                    from: a.clone(),
                    to: b.clone(),
                    offending: Offending {
                        lhs: l.to_term(),
                        rhs: r.to_term(),
                        equation: eq_index,
                    },
                })
            }
        }
        // `l` unbound, `r` already concrete: nothing to cast yet, pin it.
        (Elt::Var(x), _) => bind_elt(solution, x.clone(), r, eq_index),
    }
}

/// Reconciles a coercible occurrence of ellipsis `name` bound to `seq` with
/// whatever that ellipsis is already bound to (from an earlier coercible
/// occurrence, or from the equality phase). Differing lengths are
/// reconciled by left-padding the shorter sequence with `1`s, then
/// broadcasting element-wise; an unbound ellipsis simply takes the first
/// sequence it sees, per the left-pad-only-when-needed policy (§9, the
/// "Coercion as a second pass" Open Question).
fn coerce_ellipsis(
    solution: &mut Solution,
    name: Name,
    seq: Vec<Dim>,
    eq_index: usize,
) -> Result<(), UnifyError> {
    match solution.ellipses.get(&name).cloned() {
        None => {
            solution.ellipses.insert(name, seq);
            Ok(())
        }
        Some(existing) => {
            let merged = broadcast_sequences(solution, existing, seq, eq_index)?;
            solution.ellipses.insert(name, merged);
            Ok(())
        }
    }
}

/// Left-pads the shorter of `a`/`b` with `Dim::Int(1)` up to the longer's
/// length, then broadcasts element-wise per [`broadcast_dim`].
fn broadcast_sequences(
    solution: &mut Solution,
    a: Vec<Dim>,
    b: Vec<Dim>,
    eq_index: usize,
) -> Result<Vec<Dim>, UnifyError> {
    let (a, b) = left_pad_to_equal_length(a, b);
    a.into_iter()
        .zip(b.into_iter())
        .map(|(x, y)| broadcast_dim(solution, x, y, eq_index))
        .collect()
}

fn left_pad_to_equal_length(a: Vec<Dim>, b: Vec<Dim>) -> (Vec<Dim>, Vec<Dim>) {
    let (shorter_len, longer_len) = (a.len().min(b.len()), a.len().max(b.len()));
    let pad = longer_len - shorter_len;
    let mut a = a;
    let mut b = b;
    if a.len() < b.len() {
        a.splice(0..0, std::iter::repeat(Dim::Int(1)).take(pad));
    } else if b.len() < a.len() {
        b.splice(0..0, std::iter::repeat(Dim::Int(1)).take(pad));
    }
    (a, b)
}

/// Symmetric broadcast merge of two dimensions bound to the same ellipsis
/// position across different occurrences: a `1` on either side always
/// yields the other side; two unequal concrete dims that are both `!= 1`
/// fail; an unbound variable on either side binds to the other's value.
fn broadcast_dim(solution: &mut Solution, a: Dim, b: Dim, eq_index: usize) -> Result<Dim, UnifyError> {
    let ra = solution.resolve_dim(&a);
    let rb = solution.resolve_dim(&b);
    match (&ra, &rb) {
        (Dim::Int(1), _) => Ok(rb),
        (_, Dim::Int(1)) => Ok(ra),
        (Dim::Var(x), Dim::Var(y)) if x == y => Ok(ra),
        (Dim::Int(x), Dim::Int(y)) => {
            if x == y {
                Ok(ra)
            } else {
                Err(UnifyError::BroadcastIncompatible {
                    left: *x,
                    right: *y,
                    offending: Offending {
                        lhs: ra.to_term(),
                        rhs: rb.to_term(),
                        equation: eq_index,
                    },
                })
            }
        }
        (Dim::Var(x), _) => {
            if dim_occurs(solution, x, &rb) {
                return Err(UnifyError::OccursCheck {
                    var: x.clone(),
                    offending: Offending {
                        lhs: crate::term::Term::DimVar(x.clone()),
                        rhs: rb.to_term(),
                        equation: eq_index,
                    },
                });
            }
            bind_dim(solution, x.clone(), rb.clone(), eq_index)?;
            Ok(rb)
        }
        (_, Dim::Var(y)) => {
            bind_dim(solution, y.clone(), ra.clone(), eq_index)?;
            Ok(ra)
        }
    }
}
