//! Boolean operations on polygons and multipolygons in the plane:
//! [`union`], [`intersection`], [`xor`] (symmetric difference), and
//! [`difference`] (subject minus clippers).
//!
//! The engine is a Martinez-style sweep line: input vertices are snapped to
//! a consistent coordinate lattice, segment endpoints are processed in
//! sweep order out of a priority queue while a status structure tracks the
//! segments crossing the sweep line, intersecting segments are split into
//! non-crossing pieces, each surviving piece learns which input rings lie
//! above and below it, and the pieces that belong in the result are
//! stitched back into rings, polygons and multipolygons with correct
//! exterior/hole nesting.
//!
//! # Geometry representation
//!
//! Geometries travel as raw nested coordinate arrays in multipolygon shape
//! ([`Geom`]): polygons, each a list of rings, each a list of `[x, y]`
//! points. The first ring of a polygon is its exterior, the rest are
//! holes. Rings may be left unclosed; repeated points are skipped; extra
//! ordinates beyond x and y are discarded. Output rings are closed (first
//! point repeated last), exteriors wind counter-clockwise and holes
//! clockwise.
//!
//! ```
//! use polygol::union;
//!
//! let a = vec![vec![vec![
//!     vec![0.0, 0.0], vec![2.0, 0.0], vec![2.0, 2.0], vec![0.0, 2.0], vec![0.0, 0.0],
//! ]]];
//! let b = vec![vec![vec![
//!     vec![1.0, 0.0], vec![3.0, 0.0], vec![3.0, 2.0], vec![1.0, 2.0], vec![1.0, 0.0],
//! ]]];
//!
//! let result = union(&a, &[b]).unwrap();
//! assert_eq!(result.len(), 1);
//! ```
//!
//! # Resource caps
//!
//! Pathological inputs (or engine bugs) are kept from looping forever by
//! two caps, each defaulting to 1,000,000 and configurable through the
//! environment: `POLYGOL_MAX_QUEUE_SIZE` bounds the event queue and
//! `POLYGOL_MAX_SWEEPLINE_SEGMENTS` bounds the processed-segment count.
//! Exceeding either aborts the operation with
//! [`Error::ResourceExceeded`].

mod bbox;
mod error;
mod flp;
mod geom_in;
mod geom_out;
mod operation;
mod point;
mod rounder;
mod segment;
mod sweep_event;
mod sweep_line;
mod vector;

pub use error::Error;
pub use operation::OpType;

/// A multipolygon as nested coordinate arrays: polygon, ring, point,
/// ordinate. A polygon-shaped input is one dimension less; lift it with
/// `vec![poly]`.
pub type Geom = Vec<Vec<Vec<Vec<f64>>>>;

/// The union of the subject and all clippers.
pub fn union(subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    operation::run(OpType::Union, subject, clippers)
}

/// The region covered by every one of the subject and clippers.
pub fn intersection(subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    operation::run(OpType::Intersection, subject, clippers)
}

/// The symmetric difference: the region covered by an odd number of the
/// inputs.
pub fn xor(subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    operation::run(OpType::Xor, subject, clippers)
}

/// The subject minus every clipper.
pub fn difference(subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    operation::run(OpType::Difference, subject, clippers)
}

/// Dispatch by operation name: `"union"`, `"intersection"`, `"xor"` or
/// `"difference"`. Unrecognized names report
/// [`Error::UnknownOperation`].
pub fn boolean_op(op: &str, subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    let op_type: OpType = op.parse()?;
    operation::run(op_type, subject, clippers)
}
