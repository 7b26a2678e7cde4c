//! Chart aggregate: layout, scales, geometry, animation and pointer interaction.

pub mod animation;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod scales;
pub mod scene;
pub mod value_objects;

pub use animation::{EnterAnimation, Transition};
pub use geometry::{CandleGeometry, GeometryBuilder};
pub use interaction::{CandleHoverHandler, HoverRates, PointerHandler, TooltipUpdate};
pub use layout::Layout;
pub use scales::{ScaleEngine, ScaleSet};
pub use scene::{NodeId, NodeKind, SceneGraph};
pub use value_objects::*;
