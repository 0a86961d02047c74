use crate::{
    error::VitricResult, instance::EffectInstance, registry::PrimitiveRegistry,
    schema::EffectDescriptor,
};

/// The two lifecycle callbacks a host drives, plus the static catalog entry
/// it reads. `attach` builds the primitive subgraph once; `update_graph`
/// relinks it and is called by hosts on every parameter write, so it must be
/// cheap, idempotent, and a silent no-op before `attach` has run.
pub trait MetaEffect {
    fn descriptor(&self) -> &EffectDescriptor;

    fn attach(&mut self, registry: &dyn PrimitiveRegistry) -> VitricResult<()>;

    fn update_graph(&mut self) -> VitricResult<()>;

    /// The built instance, if `attach` has run.
    fn instance(&self) -> Option<&EffectInstance>;
}
