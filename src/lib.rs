//! Composable meta-effects for node-based image pipelines.
//!
//! A meta-effect is a fixed graph of opaque primitive units (blur, color
//! remap, compositing…) plus a redirection table that forwards a small
//! external parameter surface onto the internal units. The primitives'
//! pixel implementations live in a host engine behind
//! [`registry::PrimitiveRegistry`]; this crate only builds, wires, and
//! re-parameterizes the graph.

#![forbid(unsafe_code)]

pub mod builder;
pub mod error;
pub mod glass;
pub mod graph;
pub mod instance;
pub mod meta;
pub mod redirect;
pub mod registry;
pub mod schema;
pub mod value;

pub use builder::build;
pub use error::{VitricError, VitricResult};
pub use glass::{GLASS_REFRACTION_PIPELINE, GlassObject, ShadowStyle, glass_object_schema};
pub use graph::{Edge, EffectGraph, PORT_AUX, PORT_INPUT, PORT_OUTPUT, PrimitiveUnit, UnitId};
pub use instance::EffectInstance;
pub use meta::MetaEffect;
pub use redirect::{RedirectTable, RedirectTarget};
pub use registry::{PrimitiveRegistry, PrimitiveType, StockRegistry};
pub use schema::{
    AuxEdgeSpec, EffectDescriptor, EffectSchema, ParamSpec, RedirectSpec, SchemaBuilder, UnitSpec,
};
pub use value::{Color, ParamValue};
