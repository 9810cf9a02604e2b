//! The crate's single tagged failure type, and an optional pretty-renderer
//! built on `annotate-snippets`.
//!
//! The teacher crate (`mm0-rs`) threads a boxed elaboration error with
//! positional spans through its `Result`s rather than leaning on a derive
//! macro; this crate follows the same shape, by hand, since there is no
//! source text or span to hand off to `thiserror`'s `#[error(...)]` format
//! strings in the first place — the "position" here is an index into the
//! caller's equation list, not a byte offset.

use std::fmt;

use annotate_snippets::snippet::{Annotation, AnnotationType, Snippet};

use crate::term::{Name, Term};

/// The offending pair of terms a failure is about, together with the
/// index of the equation (in the original, pre-relabel list passed to
/// [`crate::unify`]) that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offending {
    pub lhs: Term,
    pub rhs: Term,
    pub equation: usize,
}

/// Everything that can go wrong while unifying a set of shape equations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyError {
    /// Two fixed-arity dimension sequences (no ellipsis) have different lengths.
    ArityMismatch {
        expected: usize,
        found: usize,
        offending: Offending,
    },
    /// An irreducible structural disagreement, e.g. `DimInt` vs `DType`.
    Clash { offending: Offending },
    /// A variable would be bound to a term that contains it.
    OccursCheck { var: Name, offending: Offending },
    /// Two non-1 unequal dimensions met under a broadcasting coercion.
    BroadcastIncompatible { left: u64, right: u64, offending: Offending },
    /// The LHS dtype cannot cast to the RHS dtype under the active lattice.
    CastIncompatible {
        from: crate::term::DType,
        to: crate::term::DType,
        offending: Offending,
    },
    /// A coercion marker or ellipsis appeared where it is not legal, or a
    /// shape carried more than one ellipsis.
    MalformedEquation { reason: String },
    /// `substitute` was invoked with a solution missing a binding for one
    /// of the term's free variables.
    UnboundVariable { var: Name },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::ArityMismatch {
                expected, found, ..
            } => write!(
                f,
                "arity mismatch: expected {} dimensions, found {}",
                expected, found
            ),
            UnifyError::Clash { offending } => write!(
                f,
                "cannot unify {:?} with {:?}",
                offending.lhs, offending.rhs
            ),
            UnifyError::OccursCheck { var, .. } => {
                write!(f, "occurs check failed: `{}` occurs in its own binding", var)
            }
            UnifyError::BroadcastIncompatible { left, right, .. } => write!(
                f,
                "cannot broadcast incompatible dimensions {} and {}",
                left, right
            ),
            UnifyError::CastIncompatible { from, to, .. } => {
                write!(f, "cannot cast `{}` to `{}`", from, to)
            }
            UnifyError::MalformedEquation { reason } => write!(f, "malformed equation: {}", reason),
            UnifyError::UnboundVariable { var } => {
                write!(f, "unbound variable `{}` in substitution", var)
            }
        }
    }
}

impl std::error::Error for UnifyError {}

impl UnifyError {
    /// The equation index this failure traces back to, if it carries one.
    /// `MalformedEquation` and `UnboundVariable` are raised before or
    /// outside the per-equation pipeline and so have none.
    pub fn equation_index(&self) -> Option<usize> {
        match self {
            UnifyError::ArityMismatch { offending, .. }
            | UnifyError::Clash { offending }
            | UnifyError::OccursCheck { offending, .. }
            | UnifyError::BroadcastIncompatible { offending, .. }
            | UnifyError::CastIncompatible { offending, .. } => Some(offending.equation),
            UnifyError::MalformedEquation { .. } | UnifyError::UnboundVariable { .. } => None,
        }
    }

    /// Render this error as a one-line annotated diagnostic message.
    ///
    /// Unlike the teacher's own use of `annotate-snippets`, this library has
    /// no source file to slice into, so only the title-level `Annotation` is
    /// used; callers embedding this in a source-aware frontend are expected
    /// to build their own `Slice`s around the position information exposed
    /// by [`UnifyError::equation_index`].
    pub fn render(&self) -> String {
        let label = self.to_string();
        let snippet = Snippet {
            title: Some(Annotation {
                id: None,
                label: Some(&label),
                annotation_type: AnnotationType::Error,
            }),
            footer: vec![],
            slices: vec![],
            opt: Default::default(),
        };
        annotate_snippets::display_list::DisplayList::from(snippet).to_string()
    }
}
