//! Splits relabeled shape equations into the dimension / element-type /
//! ellipsis-binding sub-equations the two solver phases consume, per §4.2.

use itertools::Itertools;

use crate::error::{Offending, UnifyError};
use crate::term::{DType, Equation, Name, Shape, Term};

/// A dimension-kind value: a concrete extent or a dimension variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dim {
    Int(u64),
    Var(Name),
}

impl Dim {
    pub fn from_term(term: &Term) -> Option<Dim> {
        match term.peel_coerce() {
            Term::DimInt(n) => Some(Dim::Int(*n)),
            Term::DimVar(name) => Some(Dim::Var(name.clone())),
            _ => None,
        }
    }

    pub fn to_term(&self) -> Term {
        match self {
            Dim::Int(n) => Term::DimInt(*n),
            Dim::Var(name) => Term::DimVar(name.clone()),
        }
    }
}

/// An element-type-kind value: a concrete dtype or a dtype variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Elt {
    Type(DType),
    Var(Name),
}

impl Elt {
    pub fn from_term(term: &Term) -> Option<Elt> {
        match term.peel_coerce() {
            Term::DType(tag) => Some(Elt::Type(tag.clone())),
            Term::DTypeVar(name) => Some(Elt::Var(name.clone())),
            _ => None,
        }
    }

    pub fn to_term(&self) -> Term {
        match self {
            Elt::Type(tag) => Term::DType(tag.clone()),
            Elt::Var(name) => Term::DTypeVar(name.clone()),
        }
    }
}

/// One simplified sub-equation handed to the equality or coercion solver.
/// Every variant carries `eq_index`, the position of the originating
/// equation in the list passed to [`crate::unify`], for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubEquation {
    /// A dimension-to-dimension equation (one position of two dims lists,
    /// or a bare scalar dim-equation that never went through a `Shape`).
    Dim {
        lhs: Dim,
        rhs: Dim,
        coercible: bool,
        eq_index: usize,
    },
    /// An element-type-to-element-type equation.
    DType {
        lhs: Elt,
        rhs: Elt,
        coercible: bool,
        eq_index: usize,
    },
    /// Binds the RHS ellipsis variable `name` to the dimension sequence
    /// sliced out of the LHS. `name` always comes from the RHS per the
    /// decomposer's contract; ellipses never occur on a LHS.
    Ellipsis {
        name: Name,
        seq: Vec<Dim>,
        coercible: bool,
        eq_index: usize,
    },
}

impl SubEquation {
    pub fn coercible(&self) -> bool {
        match self {
            SubEquation::Dim { coercible, .. }
            | SubEquation::DType { coercible, .. }
            | SubEquation::Ellipsis { coercible, .. } => *coercible,
        }
    }
}

/// Decompose every equation in `equations` (assumed already relabeled)
/// into its sub-equations, in order.
pub fn decompose(equations: &[Equation]) -> Result<Vec<SubEquation>, UnifyError> {
    let mut out = Vec::new();
    for (i, eq) in equations.iter().enumerate() {
        decompose_one(&eq.lhs, &eq.rhs, false, i, &mut out)?;
    }
    Ok(out)
}

/// Decompose a single `(lhs, rhs)` pair, `outer_coercible` being true if an
/// ancestor `Coerce` marker already applies to every sub-position produced
/// here (so a marker at the whole-shape level pushes coercibility onto
/// every dim/elt it contains, per §9 "scope of coercion markers").
fn decompose_one(
    lhs: &Term,
    rhs: &Term,
    outer_coercible: bool,
    eq_index: usize,
    out: &mut Vec<SubEquation>,
) -> Result<(), UnifyError> {
    let coercible = outer_coercible || rhs.is_coerced();
    let rhs_inner = rhs.peel_coerce();

    match (lhs, rhs_inner) {
        (Term::Shape(l), Term::Shape(r)) => decompose_shapes(l, r, coercible, eq_index, out),
        (Term::Shape(_), _) | (_, Term::Shape(_)) => Err(UnifyError::Clash {
            offending: Offending {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
                equation: eq_index,
            },
        }),
        _ => {
            if let (Some(l), Some(r)) = (Dim::from_term(lhs), Dim::from_term(rhs_inner)) {
                out.push(SubEquation::Dim {
                    lhs: l,
                    rhs: r,
                    coercible,
                    eq_index,
                });
                Ok(())
            } else if let (Some(l), Some(r)) = (Elt::from_term(lhs), Elt::from_term(rhs_inner)) {
                out.push(SubEquation::DType {
                    lhs: l,
                    rhs: r,
                    coercible,
                    eq_index,
                });
                Ok(())
            } else {
                Err(UnifyError::Clash {
                    offending: Offending {
                        lhs: lhs.clone(),
                        rhs: rhs.clone(),
                        equation: eq_index,
                    },
                })
            }
        }
    }
}

fn decompose_shapes(
    l: &Shape,
    r: &Shape,
    coercible: bool,
    eq_index: usize,
    out: &mut Vec<SubEquation>,
) -> Result<(), UnifyError> {
    // 1. The element-type equation: exactly one, inheriting the element
    // slot's own coercion marker (or the outer one).
    decompose_one(&l.elt, &r.elt, coercible, eq_index, out)?;

    // 2. Ellipsis + dimension equations.
    match r.ellipsis_position() {
        None => {
            if l.dims.len() != r.dims.len() {
                return Err(UnifyError::ArityMismatch {
                    expected: r.dims.len(),
                    found: l.dims.len(),
                    offending: Offending {
                        lhs: Term::Shape(l.clone()),
                        rhs: Term::Shape(r.clone()),
                        equation: eq_index,
                    },
                });
            }
            for (ld, rd) in l.dims.iter().zip_eq(r.dims.iter()) {
                decompose_one(ld, rd, coercible, eq_index, out)?;
            }
            Ok(())
        }
        Some(k) => {
            let ellipsis_term = &r.dims[k];
            let name = match ellipsis_term.peel_coerce() {
                Term::Ellipsis(Some(name)) => name.clone(),
                Term::Ellipsis(None) => {
                    return Err(UnifyError::MalformedEquation {
                        reason: "anonymous ellipsis reached the decomposer unrelabeled".into(),
                    })
                }
                _ => unreachable!("ellipsis_position only returns ellipsis slots"),
            };
            let prefix = &r.dims[..k];
            let suffix = &r.dims[k + 1..];
            let s = suffix.len();
            if l.dims.len() < k + s {
                return Err(UnifyError::ArityMismatch {
                    expected: k + s,
                    found: l.dims.len(),
                    offending: Offending {
                        lhs: Term::Shape(l.clone()),
                        rhs: Term::Shape(r.clone()),
                        equation: eq_index,
                    },
                });
            }
            let ellipsis_coercible = coercible || ellipsis_term.is_coerced();
            for (ld, rd) in l.dims[..k].iter().zip_eq(prefix.iter()) {
                decompose_one(ld, rd, coercible, eq_index, out)?;
            }
            let mid_start = k;
            let mid_end = l.dims.len() - s;
            for (ld, rd) in l.dims[mid_end..].iter().zip_eq(suffix.iter()) {
                decompose_one(ld, rd, coercible, eq_index, out)?;
            }
            let middle: Result<Vec<Dim>, UnifyError> = l.dims[mid_start..mid_end]
                .iter()
                .map(|d| {
                    Dim::from_term(d).ok_or_else(|| UnifyError::Clash {
                        offending: Offending {
                            lhs: d.clone(),
                            rhs: ellipsis_term.clone(),
                            equation: eq_index,
                        },
                    })
                })
                .collect();
            out.push(SubEquation::Ellipsis {
                name,
                seq: middle?,
                coercible: ellipsis_coercible,
                eq_index,
            });
            Ok(())
        }
    }
}
