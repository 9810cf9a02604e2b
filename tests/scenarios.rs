//! The worked scenario table and the universal solver properties, promoted
//! to integration tests: each solves a small equation list, then checks
//! both the resulting `Solution` and a representative substitution.

use std::sync::Once;

use datashape::decompose::Dim;
use datashape::{DType, DTypeLattice, Equation, Shape, Term, UnifyError};

static LOG_INIT: Once = Once::new();

/// Installs a terminal logger once per test process, so the `log::trace!`/
/// `log::debug!` calls threaded through `unify` are visible with
/// `cargo test -- --nocapture` and `RUST_LOG=trace`. The crate itself never
/// initializes a logger (it's a library, per the driver's own doc comment);
/// this is purely test-harness wiring, mirroring how the teacher's binary
/// wires `simplelog` at its own entry point.
fn init_test_logging() {
    LOG_INIT.call_once(|| {
        let level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(log::LevelFilter::Warn);
        let _ = simplelog::TermLogger::init(
            level,
            simplelog::Config::default(),
            simplelog::TerminalMode::Stderr,
        );
    });
}

fn shape(dims: Vec<Term>, elt: Term) -> Term {
    init_test_logging();
    Term::Shape(Shape::new(dims, elt).unwrap())
}

fn lattice() -> &'static DTypeLattice {
    DTypeLattice::default_numeric()
}

mod scenario_table {
    use super::*;

    /// #1: two equal equality-mode ellipsis occurrences bind `A` to the
    /// shared dimension sequence.
    #[test]
    fn equal_ellipsis_occurrences_bind_the_shared_sequence() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A")], Term::dtype("int32")),
            )
            .unwrap(),
            Equation::new(
                shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A")], Term::dtype("int32")),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.ellipsis("A").unwrap(), &[Dim::Int(10), Dim::Int(10)]);

        let result = datashape::substitute(
            &solution,
            &shape(vec![Term::ellipsis("A")], Term::dtype("int32")),
        )
        .unwrap();
        assert_eq!(
            result,
            shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32"))
        );
    }

    /// #2: a coercible ellipsis reconciles `1*10` against `10*10` by
    /// broadcasting the leading `1`.
    #[test]
    fn coercible_ellipsis_broadcasts_a_leading_one() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_int(1), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
            Equation::new(
                shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.ellipsis("A").unwrap(), &[Dim::Int(10), Dim::Int(10)]);
    }

    /// #3: a rank-1 LHS against a coercible `A...` whose sibling occurrence
    /// is rank-2 left-pads the shorter sequence with a `1`.
    #[test]
    fn shorter_coercible_ellipsis_occurrence_is_left_padded() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
            Equation::new(
                shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.ellipsis("A").unwrap(), &[Dim::Int(10), Dim::Int(10)]);
    }

    /// #4: two coercible ellipsis occurrences whose non-`1`, non-equal
    /// elements can't be reconciled fail with `BroadcastIncompatible`.
    #[test]
    fn conflicting_coercible_ellipsis_occurrences_fail() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_int(1), Term::dim_int(5)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
            Equation::new(
                shape(vec![Term::dim_int(10), Term::dim_int(10)], Term::dtype("int32")),
                shape(vec![Term::ellipsis("A").coerce().unwrap()], Term::dtype("int32")),
            )
            .unwrap(),
        ];
        assert!(matches!(
            datashape::unify(&eqs, lattice()),
            Err(UnifyError::BroadcastIncompatible { left: 5, right: 10, .. })
        ));
    }

    /// #5: a dim signature pinned by one equation and a coercible dtype
    /// pinned by a sibling equation's concrete dtype.
    #[test]
    fn fixed_dims_equality_plus_coerced_dtype() {
        let eqs = [
            Equation::new(
                shape(
                    vec![Term::dim_int(10), Term::dim_int(10)],
                    Term::dtype("float64"),
                ),
                shape(
                    vec![Term::dim_var("a"), Term::dim_var("b")],
                    Term::dtype_var("c").coerce().unwrap(),
                ),
            )
            .unwrap(),
            Equation::new(
                shape(
                    vec![Term::dim_int(10), Term::dim_int(10)],
                    Term::dtype("int32"),
                ),
                shape(
                    vec![Term::dim_var("a"), Term::dim_var("b")],
                    Term::dtype_var("c").coerce().unwrap(),
                ),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.dim("a"), Some(Dim::Int(10)));
        assert_eq!(solution.dim("b"), Some(Dim::Int(10)));
        assert_eq!(solution.dtype("c"), Some(DType::new("float64")));
    }

    /// #6: a scalar dtype variable pinned by the first (non-coerced)
    /// equation, then cast-checked against the second (coerced) equation.
    #[test]
    fn noncoerced_dtype_pins_then_coerced_equation_casts() {
        let eqs = [
            Equation::new(Term::dtype("float32"), Term::dtype_var("dtype")).unwrap(),
            Equation::new(
                Term::dtype("int32"),
                Term::dtype_var("dtype").coerce().unwrap(),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.dtype("dtype"), Some(DType::new("float32")));
    }

    /// #7: a coerced fixed-arity signature (no ellipsis) broadcasts its
    /// leading `1` the same way an ellipsis-bound sequence would.
    #[test]
    fn coerced_fixed_arity_signature_broadcasts_leading_one() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_int(1), Term::dim_int(10)], Term::dtype("int32")),
                shape(
                    vec![
                        Term::dim_var("a").coerce().unwrap(),
                        Term::dim_var("b").coerce().unwrap(),
                    ],
                    Term::dtype("int32"),
                ),
            )
            .unwrap(),
            Equation::new(
                shape(
                    vec![Term::dim_int(10), Term::dim_int(10)],
                    Term::dtype("int32"),
                ),
                shape(
                    vec![
                        Term::dim_var("a").coerce().unwrap(),
                        Term::dim_var("b").coerce().unwrap(),
                    ],
                    Term::dtype("int32"),
                ),
            )
            .unwrap(),
        ];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(solution.dim("a"), Some(Dim::Int(10)));
        assert_eq!(solution.dim("b"), Some(Dim::Int(10)));
    }
}

mod universal_properties {
    use super::*;

    /// Soundness: the solution substituted back into each equation's sides
    /// agrees (equal here, since no coercion is involved).
    #[test]
    fn soundness_on_an_equality_only_signature() {
        let lhs = shape(vec![Term::dim_int(7)], Term::dtype("int32"));
        let rhs = shape(vec![Term::dim_var("n")], Term::dtype_var("t"));
        let eqs = [Equation::new(lhs.clone(), rhs.clone()).unwrap()];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(
            datashape::substitute(&solution, &rhs).unwrap(),
            datashape::substitute(&solution, &lhs).unwrap(),
        );
    }

    /// Idempotence: solving twice in a row from the same input equations
    /// yields the same bindings (a fresh `Solution` each time, not a stale
    /// one re-applied, since `unify` is a pure function of its input).
    #[test]
    fn idempotence_of_repeated_unification() {
        let eqs = [Equation::new(
            shape(vec![Term::dim_int(3)], Term::dtype("int32")),
            shape(vec![Term::dim_var("n")], Term::dtype("int32")),
        )
        .unwrap()];
        let first = datashape::unify(&eqs, lattice()).unwrap();
        let second = datashape::unify(&eqs, lattice()).unwrap();
        assert_eq!(first.dim("n"), second.dim("n"));
    }

    /// Occurs-freedom: chaining a variable through several unresolved
    /// bindings (`x ↦ y ↦ z`, `z` left free) must resolve to the free
    /// variable at the end of the chain rather than tripping the occurs
    /// check on the reflexive `y ↦ y` step that resolution produces.
    #[test]
    fn occurs_check_does_not_spuriously_fire_on_a_variable_chain() {
        use datashape::decompose::{Elt, SubEquation};
        use datashape::solve::solve_equality;
        let subs = vec![
            SubEquation::DType {
                lhs: Elt::Var(std::sync::Arc::from("x")),
                rhs: Elt::Var(std::sync::Arc::from("y")),
                coercible: false,
                eq_index: 0,
            },
            SubEquation::DType {
                lhs: Elt::Var(std::sync::Arc::from("y")),
                rhs: Elt::Var(std::sync::Arc::from("z")),
                coercible: false,
                eq_index: 1,
            },
            // Re-stating `x ↦ y` once `y` is itself bound to `z` must still
            // succeed: both sides resolve to the same representative `z`.
            SubEquation::DType {
                lhs: Elt::Var(std::sync::Arc::from("x")),
                rhs: Elt::Var(std::sync::Arc::from("y")),
                coercible: false,
                eq_index: 2,
            },
        ];
        let solution = solve_equality(&subs).unwrap();
        assert!(solution.dtype("x").is_none());
        assert!(solution.dtype("y").is_none());
        assert!(solution.dtype("z").is_none());
    }

    /// Relabel-neutrality: two equations using the same source-level name
    /// on independent LHS positions do not interfere with one another.
    #[test]
    fn relabel_keeps_independent_lhs_occurrences_from_colliding() {
        let eqs = [
            Equation::new(
                shape(vec![Term::dim_var("a")], Term::dtype("int32")),
                shape(vec![Term::dim_int(1)], Term::dtype("int32")),
            )
            .unwrap(),
            Equation::new(
                shape(vec![Term::dim_var("a")], Term::dtype("int32")),
                shape(vec![Term::dim_int(2)], Term::dtype("int32")),
            )
            .unwrap(),
        ];
        // Both equations' `a` are independent LHS occurrences (one per
        // argument); unifying them together must not force `1 == 2`.
        assert!(datashape::unify(&eqs, lattice()).is_ok());
    }

    /// Coercion monotonicity: adding a `Coerce` marker to an already
    /// succeeding equation must still succeed, with an equal solution on
    /// every variable the unmarked version already bound.
    #[test]
    fn adding_a_coerce_marker_does_not_break_an_already_solved_binding() {
        let without = [Equation::new(
            shape(vec![Term::dim_int(10)], Term::dtype("int32")),
            shape(vec![Term::dim_var("n")], Term::dtype("int32")),
        )
        .unwrap()];
        let with = [Equation::new(
            shape(vec![Term::dim_int(10)], Term::dtype("int32")),
            shape(vec![Term::dim_var("n").coerce().unwrap()], Term::dtype("int32")),
        )
        .unwrap()];
        let a = datashape::unify(&without, lattice()).unwrap();
        let b = datashape::unify(&with, lattice()).unwrap();
        assert_eq!(a.dim("n"), b.dim("n"));
    }

    /// Substitution totality: once every free variable of a result type is
    /// bound, substitution leaves no variables or `Coerce` markers behind.
    #[test]
    fn substitution_totality_over_a_solved_result_type() {
        let eqs = [Equation::new(
            shape(vec![Term::dim_int(4), Term::dim_int(5)], Term::dtype("int32")),
            shape(vec![Term::ellipsis("A")], Term::dtype_var("t")),
        )
        .unwrap()];
        let solution = datashape::unify(&eqs, lattice()).unwrap();
        let result_type = shape(vec![Term::ellipsis("A")], Term::dtype_var("t"));
        let result = datashape::substitute(&solution, &result_type).unwrap();
        assert!(!result.contains_ellipsis());
        assert!(!result.contains_coerce());
    }
}
