use std::collections::BTreeMap;

use crate::{
    error::{VitricError, VitricResult},
    graph::{EffectGraph, PrimitiveUnit, UnitId},
    instance::EffectInstance,
    redirect::RedirectTable,
    registry::PrimitiveRegistry,
    schema::EffectSchema,
    value::ParamValue,
};

/// Builds a fully wired [`EffectInstance`] from a schema. Atomic: any error
/// returns before an instance exists, so no partially-wired state is ever
/// observable. Units are created in schema order; the main chain is wired
/// before aux edges.
#[tracing::instrument(skip_all, fields(effect = %schema.descriptor.name))]
pub fn build(
    schema: EffectSchema,
    registry: &dyn PrimitiveRegistry,
) -> VitricResult<EffectInstance> {
    schema.validate()?;

    let mut graph = EffectGraph::default();
    let mut by_key = BTreeMap::<String, UnitId>::new();
    for spec in &schema.units {
        let ty = registry.require(&spec.type_name)?;
        let mut params = ty.params.clone();
        for (name, value) in &spec.init {
            if !ty.declares(name) {
                return Err(VitricError::validation(format!(
                    "unit '{}': primitive type '{}' declares no parameter '{name}'",
                    spec.key, spec.type_name
                )));
            }
            params.insert(name.clone(), value.clone());
        }
        let id = graph.add_unit(PrimitiveUnit {
            key: spec.key.clone(),
            type_name: spec.type_name.clone(),
            params,
        });
        by_key.insert(spec.key.clone(), id);
    }

    let externals: BTreeMap<String, ParamValue> = schema
        .params
        .iter()
        .map(|p| (p.name.clone(), p.default.clone()))
        .collect();

    let mut instance = EffectInstance {
        schema,
        graph,
        table: RedirectTable::default(),
        by_key,
        externals,
    };

    // Wire once so the cycle check sees the full edge set, then fail before
    // the instance escapes if the topology is bad.
    instance.relink()?;
    instance.graph.check_acyclic()?;

    tracing::debug!(
        effect = %instance.descriptor().name,
        units = instance.schema.units.len(),
        edges = instance.edges().len(),
        redirects = instance.schema.redirects.len(),
        "built effect instance"
    );
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{PORT_INPUT, PORT_OUTPUT},
        registry::StockRegistry,
        schema::{EffectDescriptor, ParamSpec, SchemaBuilder},
    };

    fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "test:minimal".to_string(),
            title: "Minimal".to_string(),
            description: String::new(),
            category: "Test".to_string(),
            menu_label: "Minimal…".to_string(),
        }
    }

    #[test]
    fn unknown_primitive_type_fails_build() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit("warp", "warp-core")
            .main_chain(["in", "warp"])
            .build()
            .unwrap();
        let err = build(schema, &StockRegistry::stock()).unwrap_err();
        assert!(matches!(err, VitricError::UnknownPrimitiveType { .. }));
    }

    #[test]
    fn undeclared_init_param_fails_build() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit_with("blur", "gaussian-blur", [("sharpness", ParamValue::Double(1.0))])
            .main_chain(["in", "blur"])
            .build()
            .unwrap();
        let err = build(schema, &StockRegistry::stock()).unwrap_err();
        assert!(matches!(err, VitricError::Validation(_)));
    }

    #[test]
    fn init_overrides_registry_defaults() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit_with("blur", "gaussian-blur", [("clip-extent", ParamValue::Boolean(false))])
            .main_chain(["in", "blur"])
            .build()
            .unwrap();
        let fx = build(schema, &StockRegistry::stock()).unwrap();
        let blur = fx.unit(fx.unit_by_key("blur").unwrap()).unwrap();
        assert_eq!(blur.param("clip-extent"), Some(&ParamValue::Boolean(false)));
        // Untouched defaults come from the registry declaration.
        assert_eq!(blur.param("std-dev-x"), Some(&ParamValue::Double(1.5)));
    }

    #[test]
    fn cyclic_aux_edge_fails_build() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("a", "pass-through")
            .unit("b", "pass-through")
            .main_chain(["a", "b"])
            .aux_edge("b", PORT_OUTPUT, "a", PORT_INPUT)
            .build()
            .unwrap();
        let err = build(schema, &StockRegistry::stock()).unwrap_err();
        assert!(matches!(err, VitricError::CycleDetected(_)));
    }

    #[test]
    fn defaults_are_pushed_through_redirects_on_build() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit("blur", "gaussian-blur")
            .main_chain(["in", "blur"])
            .param(ParamSpec::double("smooth", "Smooth", 0.5).range(0.0, 3.0))
            .redirect("smooth", "blur", "std-dev-x")
            .redirect("smooth", "blur", "std-dev-y")
            .build()
            .unwrap();
        let fx = build(schema, &StockRegistry::stock()).unwrap();
        let blur = fx.unit(fx.unit_by_key("blur").unwrap()).unwrap();
        assert_eq!(blur.param("std-dev-x"), Some(&ParamValue::Double(0.5)));
        assert_eq!(blur.param("std-dev-y"), Some(&ParamValue::Double(0.5)));
    }
}
