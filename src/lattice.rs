//! The element-type lattice: the one configuration point the engine
//! accepts, per §6 — a fixed enumeration of dtype tags plus a directed
//! acyclic "castable-to" relation over them.
//!
//! Mirrors the teacher's use of `lazy_static` for a shared, process-wide
//! default table (`mm0-rs` does the same for its builtin atom names).

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

use crate::term::DType;

/// An error building a [`DTypeLattice`]: currently only a cyclic
/// castable-to relation, which would make casting non-terminating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatticeError {
    pub cycle: Vec<String>,
}

impl std::fmt::Display for LatticeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dtype lattice contains a cast cycle: {}",
            self.cycle.join(" -> ")
        )
    }
}

impl std::error::Error for LatticeError {}

/// A directed acyclic "castable-to" relation over a fixed set of dtype tags.
///
/// `castable(from, to)` answers whether a value of dtype `from` may be
/// implicitly cast to `to` under a `Coerce`-marked element-type equation.
/// Equality is always castable (every tag casts to itself).
#[derive(Clone, Debug)]
pub struct DTypeLattice {
    /// Direct (non-transitive) edges, keyed by tag name.
    edges: HashMap<String, Vec<String>>,
}

impl DTypeLattice {
    /// Start building a lattice from a list of direct `from -> to` casts.
    /// The relation is closed transitively by [`DTypeLattice::build`];
    /// callers only need to supply the immediate promotions.
    pub fn builder() -> DTypeLatticeBuilder {
        DTypeLatticeBuilder { edges: HashMap::new() }
    }

    /// The engine's built-in numeric promotion lattice: integer widths
    /// promote to wider integers and to floats of sufficient precision;
    /// float widths promote to wider floats.
    pub fn default_numeric() -> &'static DTypeLattice {
        &DEFAULT_LATTICE
    }

    /// Whether `from` can be implicitly cast to `to`. Always true when the
    /// two tags are equal.
    pub fn castable(&self, from: &DType, to: &DType) -> bool {
        if from.tag() == to.tag() {
            return true;
        }
        self.reachable(from.tag(), to.tag(), &mut HashSet::new())
    }

    fn reachable(&self, from: &str, to: &str, seen: &mut HashSet<String>) -> bool {
        if !seen.insert(from.to_owned()) {
            return false;
        }
        match self.edges.get(from) {
            None => false,
            Some(targets) => {
                targets.iter().any(|t| t == to) || targets.iter().any(|t| self.reachable(t, to, seen))
            }
        }
    }
}

/// Incrementally constructs a [`DTypeLattice`], validating acyclicity on
/// [`DTypeLatticeBuilder::build`].
#[derive(Default)]
pub struct DTypeLatticeBuilder {
    edges: HashMap<String, Vec<String>>,
}

impl DTypeLatticeBuilder {
    /// Register that `from` is directly castable to `to`.
    pub fn cast(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Finish building, rejecting a cyclic relation.
    pub fn build(self) -> Result<DTypeLattice, LatticeError> {
        for start in self.edges.keys() {
            if let Some(cycle) = find_cycle(&self.edges, start) {
                return Err(LatticeError { cycle });
            }
        }
        Ok(DTypeLattice { edges: self.edges })
    }
}

fn find_cycle(edges: &HashMap<String, Vec<String>>, start: &str) -> Option<Vec<String>> {
    let mut path = vec![start.to_owned()];
    let mut on_stack: HashSet<String> = HashSet::new();
    on_stack.insert(start.to_owned());
    find_cycle_from(edges, start, &mut path, &mut on_stack)
}

/// Standard recursion-stack DFS cycle search: `on_stack` holds the nodes on
/// the current path, so a neighbor already on it closes a cycle.
fn find_cycle_from(
    edges: &HashMap<String, Vec<String>>,
    node: &str,
    path: &mut Vec<String>,
    on_stack: &mut HashSet<String>,
) -> Option<Vec<String>> {
    let targets = match edges.get(node) {
        Some(targets) => targets,
        None => return None,
    };
    for t in targets {
        if on_stack.contains(t) {
            let start = path.iter().position(|n| n == t).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(t.clone());
            return Some(cycle);
        }
        on_stack.insert(t.clone());
        path.push(t.clone());
        if let Some(cycle) = find_cycle_from(edges, t, path, on_stack) {
            return Some(cycle);
        }
        path.pop();
        on_stack.remove(t);
    }
    None
}

lazy_static! {
    static ref DEFAULT_LATTICE: DTypeLattice = DTypeLattice::builder()
        .cast("int8", "int16")
        .cast("int16", "int32")
        .cast("int32", "int64")
        .cast("uint8", "uint16")
        .cast("uint16", "uint32")
        .cast("uint32", "uint64")
        .cast("int8", "float32")
        .cast("int16", "float32")
        .cast("uint8", "float32")
        .cast("uint16", "float32")
        .cast("int32", "float32")
        .cast("uint32", "float32")
        .cast("int32", "float64")
        .cast("uint32", "float64")
        .cast("int64", "float64")
        .cast("uint64", "float64")
        .cast("float32", "float64")
        .build()
        .expect("built-in numeric lattice is acyclic");
}
