//! The datashape term model: the closed set of variants described in the
//! design doc, plus the small amount of construction-time validation that
//! keeps `Coerce` and `Ellipsis` where they are allowed to be.

use std::fmt;
use std::sync::Arc;

use crate::error::UnifyError;

/// A variable name, shared cheaply across terms produced by relabeling.
///
/// Dim-, dtype- and ellipsis-variables all use this representation; which
/// namespace a name belongs to is determined by which [`Term`] variant
/// wraps it, never by the string itself (`a` the dim-var and `a` the
/// dtype-var are unrelated).
pub type Name = Arc<str>;

/// A concrete scalar element type tag, e.g. `int32`, `float64`.
///
/// The crate does not hardcode the set of tags: [`crate::lattice::DTypeLattice`]
/// is the configuration point that decides which tags exist and which are
/// castable to which.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DType(Name);

impl DType {
    /// Build a dtype tag from its textual name (`"int32"`, `"float64"`, ...).
    pub fn new(tag: impl Into<Name>) -> Self {
        DType(tag.into())
    }

    /// The tag's textual name.
    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A datashape term: one of the seven closed variants of the data model.
///
/// `Shape` is the only composite; datashapes are flat, so a `Shape` never
/// appears nested inside another `Shape`'s dims or element slot (this is
/// enforced by [`Shape::new`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    /// A concrete non-negative dimension extent.
    DimInt(u64),
    /// A dimension-valued type variable.
    DimVar(Name),
    /// A concrete scalar element type.
    DType(DType),
    /// An element-type variable.
    DTypeVar(Name),
    /// A variadic placeholder for a (possibly empty) sequence of dimensions.
    /// `None` means anonymous (fresh on use); `Some(name)` binds a
    /// dimension-sequence variable shared across occurrences of `name`.
    Ellipsis(Option<Name>),
    /// An ordered sequence of dimension terms followed by one element-type term.
    Shape(Shape),
    /// Marks that the wrapped term's LHS counterpart may be coerced
    /// (broadcast for dimensions, cast for element types) rather than
    /// required to be strictly equal. Legal only inside the RHS of an
    /// equation; never doubly nested.
    Coerce(Box<Term>),
}

impl Term {
    /// Shorthand for [`Term::DimInt`].
    pub fn dim_int(n: u64) -> Term {
        Term::DimInt(n)
    }

    /// Shorthand for [`Term::DimVar`].
    pub fn dim_var(name: impl Into<Name>) -> Term {
        Term::DimVar(name.into())
    }

    /// Shorthand for [`Term::DType`].
    pub fn dtype(tag: impl Into<Name>) -> Term {
        Term::DType(DType::new(tag))
    }

    /// Shorthand for [`Term::DTypeVar`].
    pub fn dtype_var(name: impl Into<Name>) -> Term {
        Term::DTypeVar(name.into())
    }

    /// A named ellipsis, e.g. the `A...` in `A...*int32`.
    pub fn ellipsis(name: impl Into<Name>) -> Term {
        Term::Ellipsis(Some(name.into()))
    }

    /// An anonymous ellipsis, fresh on every use.
    pub fn anon_ellipsis() -> Term {
        Term::Ellipsis(None)
    }

    /// Wrap `self` in a coercion marker. Fails if `self` is already a
    /// `Coerce` (double-wrapping is not part of the model).
    pub fn coerce(self) -> Result<Term, UnifyError> {
        match self {
            Term::Coerce(_) => Err(UnifyError::MalformedEquation {
                reason: "a term cannot be coerced twice".into(),
            }),
            other => Ok(Term::Coerce(Box::new(other))),
        }
    }

    /// True if this term (at its outermost layer) is a `Coerce` marker.
    pub fn is_coerced(&self) -> bool {
        matches!(self, Term::Coerce(_))
    }

    /// True if this term, stripped of at most one `Coerce` layer, is an ellipsis.
    pub fn is_ellipsis(&self) -> bool {
        matches!(self.peel_coerce(), Term::Ellipsis(_))
    }

    /// The term with its outermost `Coerce` marker (if any) removed.
    pub fn peel_coerce(&self) -> &Term {
        match self {
            Term::Coerce(inner) => inner,
            other => other,
        }
    }

    /// Recursively checks that no `Coerce` marker occurs anywhere in this
    /// term. Used to enforce that a LHS never contains one.
    pub fn contains_coerce(&self) -> bool {
        match self {
            Term::Coerce(_) => true,
            Term::Shape(shape) => {
                shape.dims.iter().any(Term::contains_coerce) || shape.elt.contains_coerce()
            }
            _ => false,
        }
    }

    /// Recursively checks that no `Ellipsis` occurs anywhere in this term.
    /// Used to enforce that a LHS never contains one.
    pub fn contains_ellipsis(&self) -> bool {
        match self {
            Term::Ellipsis(_) => true,
            Term::Coerce(inner) => inner.contains_ellipsis(),
            Term::Shape(shape) => shape.dims.iter().any(Term::contains_ellipsis),
            _ => false,
        }
    }
}

/// The sequence-of-dims-followed-by-one-elt composite. `dims` may contain
/// concrete/variable dimensions, each optionally `Coerce`-marked, and at
/// most one of them may be (or wrap) an `Ellipsis`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    pub dims: Vec<Term>,
    pub elt: Box<Term>,
}

impl Shape {
    /// Build a `Shape`, validating that `dims` contains at most one
    /// ellipsis and that every dim/elt term is a legal kind for its slot.
    pub fn new(dims: Vec<Term>, elt: Term) -> Result<Shape, UnifyError> {
        let ellipsis_count = dims.iter().filter(|d| d.is_ellipsis()).count();
        if ellipsis_count > 1 {
            return Err(UnifyError::MalformedEquation {
                reason: "a shape may contain at most one ellipsis".into(),
            });
        }
        for d in &dims {
            match d.peel_coerce() {
                Term::DimInt(_) | Term::DimVar(_) | Term::Ellipsis(_) => {}
                _ => {
                    return Err(UnifyError::MalformedEquation {
                        reason: "a shape's dims slot must be a dimension or an ellipsis".into(),
                    })
                }
            }
        }
        match elt.peel_coerce() {
            Term::DType(_) | Term::DTypeVar(_) => {}
            _ => {
                return Err(UnifyError::MalformedEquation {
                    reason: "a shape's element slot must be a dtype or a dtype variable".into(),
                })
            }
        }
        Ok(Shape {
            dims,
            elt: Box::new(elt),
        })
    }

    /// The position of the (at most one) ellipsis in `dims`, if any.
    pub fn ellipsis_position(&self) -> Option<usize> {
        self.dims.iter().position(|d| d.is_ellipsis())
    }
}

/// An ordered pair `(lhs, rhs)` naming a unification goal. Constructed only
/// through [`Equation::new`], which enforces that `lhs` never contains a
/// `Coerce` marker or an `Ellipsis`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equation {
    pub lhs: Term,
    pub rhs: Term,
}

impl Equation {
    /// Build an equation, rejecting a malformed LHS (coercion marker or
    /// ellipsis anywhere in it — both are RHS-only constructs).
    pub fn new(lhs: Term, rhs: Term) -> Result<Equation, UnifyError> {
        if lhs.contains_coerce() {
            return Err(UnifyError::MalformedEquation {
                reason: "a coercion marker may only appear on the RHS of an equation".into(),
            });
        }
        if lhs.contains_ellipsis() {
            return Err(UnifyError::MalformedEquation {
                reason: "an ellipsis may only appear on the RHS of an equation".into(),
            });
        }
        Ok(Equation { lhs, rhs })
    }
}
