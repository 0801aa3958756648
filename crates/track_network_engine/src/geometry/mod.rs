//! Geometrie-Kernel: Winkel, Geraden, Kreise, Bögen und Kurven-Solver.
//!
//! Alle Funktionen sind rein und arbeiten in `f64` ([`glam::DVec2`]).

pub mod angle;
pub mod arc;
pub mod circle;
pub mod fitting;
pub mod line;
pub mod tolerance;

pub use angle::{
    ccw_difference, direction, heading_of, normalize_angle, opposite, same_heading,
    signed_difference, tangents_parallel,
};
pub use arc::{ArcMetadata, Bounds, arc_metadata};
pub use circle::{Circle, circle_line_intersection, circle_through};
pub use fitting::{
    CurveSegment, FreeCurve, arc_between_tangents, arc_from_heading, biarc_arm_length,
    free_curve, project_onto_rail,
};
pub use line::{
    Line, intersection, line_from_point_and_tangent, line_from_points, perpendicular_bisector,
    perpendicular_through, side_test,
};
pub use tolerance::{ANGULAR_EPSILON, LINEAR_EPSILON, Tolerance};
