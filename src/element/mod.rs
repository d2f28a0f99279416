//! Mesh cells: the shared reference element, per-cell geometry and state.

mod geometry;
mod reference;
mod state;

pub use geometry::ElementGeometry;
pub use reference::ReferenceElement;
pub use state::{Element, ElementDerived, ElementState, Elements, Tracers};
