//! Phase one of the solver: classical Robinson-style unification with an
//! occurs check, over the non-coercible sub-equations produced by the
//! decomposer (§4.3). Must run before the coercion phase so that any
//! non-coerced occurrence of a variable pins it first (§9).

use std::collections::VecDeque;

use crate::decompose::{Dim, Elt, SubEquation};
use crate::error::{Offending, UnifyError};
use crate::solution::Solution;
use crate::term::Name;

/// Run the equality solver over every sub-equation marked non-coercible.
/// Coercible sub-equations are passed through untouched for the coercion
/// phase to consume.
pub fn solve_equality(subs: &[SubEquation]) -> Result<Solution, UnifyError> {
    let mut solution = Solution::new();
    let mut worklist: VecDeque<SubEquation> = subs
        .iter()
        .filter(|s| !s.coercible())
        .cloned()
        .collect();

    while let Some(sub) = worklist.pop_front() {
        match sub {
            SubEquation::Dim {
                lhs,
                rhs,
                eq_index,
                ..
            } => unify_dim(&mut solution, lhs, rhs, eq_index)?,
            SubEquation::DType {
                lhs,
                rhs,
                eq_index,
                ..
            } => unify_elt(&mut solution, lhs, rhs, eq_index)?,
            SubEquation::Ellipsis {
                name,
                seq,
                eq_index,
                ..
            } => unify_ellipsis(&mut solution, name, seq, eq_index)?,
        }
    }
    Ok(solution)
}

fn unify_dim(solution: &mut Solution, lhs: Dim, rhs: Dim, eq_index: usize) -> Result<(), UnifyError> {
    let l = solution.resolve_dim(&lhs);
    let r = solution.resolve_dim(&rhs);
    match (&l, &r) {
        (Dim::Int(a), Dim::Int(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(clash_dim(&l, &r, eq_index))
            }
        }
        (Dim::Var(x), Dim::Var(y)) if x == y => Ok(()),
        (Dim::Var(x), _) => bind_dim(solution, x.clone(), r, eq_index),
        (_, Dim::Var(y)) => bind_dim(solution, y.clone(), l, eq_index),
    }
}

pub(crate) fn bind_dim(solution: &mut Solution, var: Name, value: Dim, eq_index: usize) -> Result<(), UnifyError> {
    if dim_occurs(solution, &var, &value) {
        return Err(UnifyError::OccursCheck {
            var: var.clone(),
            offending: Offending {
                lhs: crate::term::Term::DimVar(var),
                rhs: value.to_term(),
                equation: eq_index,
            },
        });
    }
    solution.dims.insert(var, value);
    Ok(())
}

pub(crate) fn dim_occurs(solution: &Solution, var: &Name, value: &Dim) -> bool {
    match value {
        Dim::Int(_) => false,
        Dim::Var(name) => {
            if name == var {
                return true;
            }
            match solution.dims.get(name) {
                Some(next) => dim_occurs(solution, var, next),
                None => false,
            }
        }
    }
}

fn unify_elt(solution: &mut Solution, lhs: Elt, rhs: Elt, eq_index: usize) -> Result<(), UnifyError> {
    let l = solution.resolve_elt(&lhs);
    let r = solution.resolve_elt(&rhs);
    match (&l, &r) {
        (Elt::Type(a), Elt::Type(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(clash_elt(&l, &r, eq_index))
            }
        }
        (Elt::Var(x), Elt::Var(y)) if x == y => Ok(()),
        (Elt::Var(x), _) => bind_elt(solution, x.clone(), r, eq_index),
        (_, Elt::Var(y)) => bind_elt(solution, y.clone(), l, eq_index),
    }
}

fn bind_elt(solution: &mut Solution, var: Name, value: Elt, eq_index: usize) -> Result<(), UnifyError> {
    if elt_occurs(solution, &var, &value) {
        return Err(UnifyError::OccursCheck {
            var: var.clone(),
            offending: Offending {
                lhs: crate::term::Term::DTypeVar(var),
                rhs: value.to_term(),
                equation: eq_index,
            },
        });
    }
    solution.dtypes.insert(var, value);
    Ok(())
}

fn elt_occurs(solution: &Solution, var: &Name, value: &Elt) -> bool {
    match value {
        Elt::Type(_) => false,
        Elt::Var(name) => {
            if name == var {
                return true;
            }
            match solution.dtypes.get(name) {
                Some(next) => elt_occurs(solution, var, next),
                None => false,
            }
        }
    }
}

fn unify_ellipsis(
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
            if existing.len() != seq.len() {
                return Err(UnifyError::ArityMismatch {
                    expected: existing.len(),
                    found: seq.len(),
                    offending: Offending {
                        lhs: crate::term::Term::Ellipsis(Some(name)),
                        rhs: crate::term::Term::DimInt(seq.len() as u64),
                        equation: eq_index,
                    },
                });
            }
            for (a, b) in existing.into_iter().zip(seq.into_iter()) {
                unify_dim(solution, a, b, eq_index)?;
            }
            Ok(())
        }
    }
}

fn clash_dim(l: &Dim, r: &Dim, eq_index: usize) -> UnifyError {
    UnifyError::Clash {
        offending: Offending {
            lhs: l.to_term(),
            rhs: r.to_term(),
            equation: eq_index,
        },
    }
}

fn clash_elt(l: &Elt, r: &Elt, eq_index: usize) -> UnifyError {
    UnifyError::Clash {
        offending: Offending {
            lhs: l.to_term(),
            rhs: r.to_term(),
            equation: eq_index,
        },
    }
}
