use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::{
    graph::{EffectGraph, UnitId},
    value::ParamValue,
};

/// One broadcast destination of an external parameter.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RedirectTarget {
    pub unit: UnitId,
    pub param: String,
}

/// Maps external parameter names to the internal (unit, parameter) pairs
/// they drive. Values are forwarded unchanged; target validation happens in
/// [`crate::instance::EffectInstance`], which owns both the table and the
/// units the targets refer to.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RedirectTable {
    entries: BTreeMap<String, SmallVec<[RedirectTarget; 2]>>,
}

impl RedirectTable {
    /// Registers a broadcast target. Registering an identical
    /// (external, unit, param) triple again is a no-op.
    pub fn redirect(&mut self, external: &str, unit: UnitId, param: &str) {
        let targets = self.entries.entry(external.to_string()).or_default();
        let target = RedirectTarget {
            unit,
            param: param.to_string(),
        };
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    pub fn targets(&self, external: &str) -> &[RedirectTarget] {
        self.entries.get(external).map_or(&[], |t| t.as_slice())
    }

    pub fn externals(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Pushes `value` to every registered target of `external`. An external
    /// name with no registered targets is silently inert.
    pub fn set(&self, external: &str, value: &ParamValue, graph: &mut EffectGraph) {
        let Some(targets) = self.entries.get(external) else {
            return;
        };
        for t in targets {
            if let Some(unit) = graph.unit_mut(t.unit) {
                tracing::trace!(
                    external,
                    unit = %unit.key,
                    param = %t.param,
                    kind = value.kind(),
                    "redirect set"
                );
                unit.params.insert(t.param.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PrimitiveUnit;
    use std::collections::BTreeMap;

    fn graph_with_unit() -> (EffectGraph, UnitId) {
        let mut g = EffectGraph::default();
        let id = g.add_unit(PrimitiveUnit {
            key: "blur".to_string(),
            type_name: "gaussian-blur".to_string(),
            params: BTreeMap::new(),
        });
        (g, id)
    }

    #[test]
    fn broadcast_reaches_every_target() {
        let (mut g, blur) = graph_with_unit();
        let mut table = RedirectTable::default();
        table.redirect("smooth", blur, "std-dev-x");
        table.redirect("smooth", blur, "std-dev-y");

        table.set("smooth", &ParamValue::Double(1.2), &mut g);

        let unit = g.unit(blur).unwrap();
        assert_eq!(unit.param("std-dev-x"), Some(&ParamValue::Double(1.2)));
        assert_eq!(unit.param("std-dev-y"), Some(&ParamValue::Double(1.2)));
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let (_, blur) = graph_with_unit();
        let mut table = RedirectTable::default();
        table.redirect("smooth", blur, "std-dev-x");
        table.redirect("smooth", blur, "std-dev-x");
        assert_eq!(table.targets("smooth").len(), 1);
    }

    #[test]
    fn set_without_redirect_is_a_noop() {
        let (mut g, blur) = graph_with_unit();
        let table = RedirectTable::default();
        table.set("smooth", &ParamValue::Double(9.0), &mut g);
        assert!(g.unit(blur).unwrap().param("std-dev-x").is_none());
    }
}
