//! Substitution (§4.5): applies a solved [`Solution`] to a term, expanding
//! ellipsis bindings in place and stripping every `Coerce` marker.

use crate::error::UnifyError;
use crate::solution::Solution;
use crate::term::{Shape, Term};

/// Apply `solution` to `term`, replacing every variable with its binding,
/// splicing ellipsis bindings into their surrounding dimension list, and
/// removing `Coerce` markers. Fails with [`UnifyError::UnboundVariable`] if
/// `term` mentions a variable `solution` does not bind.
pub fn substitute(solution: &Solution, term: &Term) -> Result<Term, UnifyError> {
    substitute_term(solution, term)
}

fn substitute_term(solution: &Solution, term: &Term) -> Result<Term, UnifyError> {
    match term {
        Term::DimInt(n) => Ok(Term::DimInt(*n)),
        Term::DimVar(name) => solution
            .dim(name.as_ref())
            .map(|d| d.to_term())
            .ok_or_else(|| UnifyError::UnboundVariable { var: name.clone() }),
        Term::DType(tag) => Ok(Term::DType(tag.clone())),
        Term::DTypeVar(name) => solution
            .dtype(name.as_ref())
            .map(Term::DType)
            .ok_or_else(|| UnifyError::UnboundVariable { var: name.clone() }),
        // A bare ellipsis only has meaning inside a shape's dims list,
        // where `substitute_shape` splices its binding in place; reaching
        // here means one escaped that context.
        Term::Ellipsis(Some(name)) => Err(UnifyError::MalformedEquation {
            reason: format!(
                "ellipsis `{}` cannot be substituted outside of a shape's dimension list",
                name
            ),
        }),
        Term::Ellipsis(None) => Err(UnifyError::MalformedEquation {
            reason: "anonymous ellipsis reached substitution unrelabeled".into(),
        }),
        Term::Shape(shape) => Ok(Term::Shape(substitute_shape(solution, shape)?)),
        Term::Coerce(inner) => substitute_term(solution, inner),
    }
}

fn substitute_shape(solution: &Solution, shape: &Shape) -> Result<Shape, UnifyError> {
    let mut dims = Vec::with_capacity(shape.dims.len());
    for d in &shape.dims {
        match d.peel_coerce() {
            Term::Ellipsis(Some(name)) => {
                let seq = solution
                    .ellipsis(name.as_ref())
                    .ok_or_else(|| UnifyError::UnboundVariable { var: name.clone() })?;
                dims.extend(seq.iter().map(|dim| dim.to_term()));
            }
            Term::Ellipsis(None) => {
                return Err(UnifyError::MalformedEquation {
                    reason: "anonymous ellipsis reached substitution unrelabeled".into(),
                })
            }
            _ => dims.push(substitute_term(solution, d)?),
        }
    }
    let elt = substitute_term(solution, &shape.elt)?;
    Shape::new(dims, elt)
}
