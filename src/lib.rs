//! Shape binding and orthogonal arrow routing for a 2D diagramming canvas.
//!
//! Arrows attach their ends to shapes and follow them as those shapes are
//! moved, resized, rotated, duplicated, or deleted. Elbow arrows are routed
//! as axis-aligned polylines around the shapes they connect. The host owns
//! persistence and rendering; it feeds pointer gestures into
//! [`engine::EngineCore`] and stores the elements named in the returned
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Engine facade: selection, gestures, and change reporting |
//! | [`scene`] | In-memory element store with versioned mutation |
//! | [`element`] | Element, binding, and update types |
//! | [`binding`] | Binding creation, maintenance, and repair |
//! | [`index`] | Arrow/shape binding index, audit, and back-reference reconciliation |
//! | [`hit`] | Binding hit-testing and suggestions |
//! | [`linear`] | Point math and point edits for lines and arrows |
//! | [`route`] | Elbow arrow A* routing |
//! | [`transform`] | Drag, resize, and rotate of selections |
//! | [`input`] | Modifier keys, resize handles, and the gesture state machine |
//! | [`intersect`] | Shape outlines, distances, and segment intersections |
//! | [`heading`] | Cardinal headings |
//! | [`geom`] | Points, vectors, boxes, and curve math |
//! | [`config`] | Tunables with environment overrides |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (gaps, paddings, tolerances) |

pub mod binding;
pub mod config;
pub mod consts;
pub mod element;
pub mod engine;
pub mod error;
pub mod geom;
pub mod heading;
pub mod hit;
pub mod index;
pub mod input;
pub mod intersect;
pub mod linear;
pub mod route;
pub mod scene;
pub mod transform;
