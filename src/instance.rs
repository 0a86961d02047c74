use std::collections::BTreeMap;

use crate::{
    error::{VitricError, VitricResult},
    graph::{EffectGraph, PORT_INPUT, PORT_OUTPUT, PrimitiveUnit, UnitId},
    redirect::RedirectTable,
    schema::{EffectDescriptor, EffectSchema, ParamSpec},
    value::ParamValue,
};

/// A fully built meta-effect: the owned primitive graph, the redirection
/// table, and the current external parameter values. Constructed by
/// [`crate::builder::build`]; single-threaded mutation only.
#[derive(Clone, Debug)]
pub struct EffectInstance {
    pub(crate) schema: EffectSchema,
    pub(crate) graph: EffectGraph,
    pub(crate) table: RedirectTable,
    pub(crate) by_key: BTreeMap<String, UnitId>,
    pub(crate) externals: BTreeMap<String, ParamValue>,
}

impl EffectInstance {
    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.schema.descriptor
    }

    /// External parameter declarations, in schema order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.schema.params
    }

    /// The unit at the head of the main chain.
    pub fn input(&self) -> UnitId {
        self.by_key[self.schema.main_chain.first().expect("validated chain")]
    }

    /// The unit at the tail of the main chain; its output port is the
    /// effect's overall output.
    pub fn output(&self) -> UnitId {
        self.by_key[self.schema.main_chain.last().expect("validated chain")]
    }

    pub fn unit(&self, id: UnitId) -> Option<&PrimitiveUnit> {
        self.graph.unit(id)
    }

    pub fn unit_by_key(&self, key: &str) -> Option<UnitId> {
        self.by_key.get(key).copied()
    }

    pub fn edges(&self) -> &[crate::graph::Edge] {
        self.graph.edges()
    }

    pub fn redirect_table(&self) -> &RedirectTable {
        &self.table
    }

    /// Current value of an external parameter.
    pub fn external(&self, name: &str) -> Option<&ParamValue> {
        self.externals.get(name)
    }

    /// Registers one redirect row, validating the target against this
    /// instance's own units and their declared parameter sets.
    pub fn redirect(&mut self, external: &str, unit: UnitId, internal: &str) -> VitricResult<()> {
        let Some(target) = self.graph.unit(unit) else {
            return Err(VitricError::unknown_target_unit(format!(
                "{unit:?} was not created by this instance's builder"
            )));
        };
        if !target.params.contains_key(internal) {
            return Err(VitricError::unknown_target_parameter(
                target.type_name.clone(),
                internal,
            ));
        }
        self.table.redirect(external, unit, internal);
        Ok(())
    }

    /// Writes an external parameter and relinks, mirroring a host that runs
    /// its update callback on every property write. Values are stored and
    /// forwarded as-is; declared ranges are advisory and never enforced.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> VitricResult<()> {
        if self.schema.param_spec(name).is_none() {
            return Err(VitricError::validation(format!(
                "effect '{}' has no external parameter '{name}'",
                self.schema.descriptor.name
            )));
        }
        self.externals.insert(name.to_string(), value.into());
        self.relink()
    }

    /// Re-establishes the schema's edges and redirect rows, then pushes every
    /// current external value through the table. Idempotent: repeated calls
    /// on an unchanged instance leave the edge set and redirect targets
    /// exactly as a single call would.
    pub fn relink(&mut self) -> VitricResult<()> {
        for pair in self.schema.main_chain.windows(2) {
            let src = self.by_key[&pair[0]];
            let dst = self.by_key[&pair[1]];
            self.graph.connect(src, PORT_OUTPUT, dst, PORT_INPUT)?;
        }
        for e in &self.schema.aux_edges {
            let src = self.by_key[&e.src_key];
            let dst = self.by_key[&e.dst_key];
            self.graph.connect(src, &e.src_port, dst, &e.dst_port)?;
        }

        let rows: Vec<_> = self.schema.redirects.clone();
        for r in &rows {
            let unit = self.by_key[&r.unit_key];
            self.redirect(&r.external, unit, &r.internal)?;
        }

        let current: Vec<(String, ParamValue)> = self
            .externals
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in &current {
            self.table.set(name, value, &mut self.graph);
        }
        tracing::trace!(
            effect = %self.schema.descriptor.name,
            edges = self.graph.edges().len(),
            "relinked"
        );
        Ok(())
    }
}
