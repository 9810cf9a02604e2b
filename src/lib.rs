//! `datashape` unifies the types of array arguments against the parameter
//! types of a typed function signature.
//!
//! Given a list of `(lhs, rhs)` equations — `lhs` the concrete datashape an
//! argument was called with, `rhs` the declared parameter datashape, which
//! may mention dimension/dtype/ellipsis variables and `Coerce` markers —
//! [`unify`] produces a [`Solution`] mapping every variable to a concrete
//! term. [`substitute`] then applies that solution to a function's declared
//! result datashape to obtain the concrete result type.
//!
//! The driver runs four passes in a fixed order that callers cannot
//! reorder: [`relabel`] (fresh-name every variable under the asymmetric
//! LHS/RHS scoping rule), [`decompose::decompose`] (split each equation
//! into dimension / element-type / ellipsis-binding sub-equations),
//! [`solve::solve_equality`] (classical unification with an occurs check
//! over every non-coercible sub-equation), then
//! [`solve::solve_coercion`] (broadcasting and dtype casting over every
//! sub-equation a `Coerce` marker touched). Equality must run first: it is
//! what lets a non-coerced occurrence of a variable pin its value before
//! coercion-driven binding gets a chance to interfere.
//!
//! The crate carries no interior mutability and no process-global state
//! beyond the default dtype lattice ([`lattice::DTypeLattice::default_numeric`]);
//! every public term type is `Send + Sync` by construction, and `unify`
//! never consults the environment, the filesystem, or a clock.

pub mod decompose;
pub mod error;
pub mod lattice;
pub mod relabel;
pub mod solution;
pub mod solve;
pub mod subst;
pub mod term;

pub use error::UnifyError;
pub use lattice::{DTypeLattice, DTypeLatticeBuilder, LatticeError};
pub use relabel::relabel;
pub use solution::Solution;
pub use subst::substitute;
pub use term::{DType, Equation, Name, Shape, Term};

use decompose::decompose;
use solve::{solve_coercion, solve_equality};

/// Solve a list of shape equations, returning the substitution that makes
/// every equation hold (up to the declared broadcasting/casting coercions)
/// or the first failure encountered.
///
/// Runs, in order: relabeling, decomposition, the equality solver, then the
/// coercion solver under `lattice`. Each equation's `lhs` must already
/// satisfy [`Equation::new`]'s construction invariants (no `Coerce`, no
/// `Ellipsis`); `equations` themselves are assumed already validated since
/// they were built through [`Equation::new`].
///
/// The returned [`Solution`] is keyed by the *source* RHS variable names
/// (`A`, `dtype`, ...), not the relabeler's internal fresh names: relabeling
/// is an implementation detail of the solver, invisible to callers.
pub fn unify(equations: &[Equation], lattice: &DTypeLattice) -> Result<Solution, UnifyError> {
    log::trace!("unify: {} equation(s)", equations.len());
    let (relabeled, rhs_names) = relabel(equations);
    let subs = decompose(&relabeled)?;
    let mut solution = solve_equality(&subs)?;
    solve_coercion(&mut solution, &subs, lattice)?;
    let solution = solution.rekey(&rhs_names);
    log::debug!("unify: solved {} equation(s)", equations.len());
    Ok(solution)
}
