use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{VitricError, VitricResult},
    value::ParamValue,
};

/// Static catalog entry a host reads to list the effect. Purely descriptive;
/// nothing here affects computation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EffectDescriptor {
    pub name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub menu_label: String,
}

/// One primitive to instantiate: schema-local key, registry type name, and
/// construction-time parameter overrides applied on top of the type defaults.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct UnitSpec {
    pub key: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub init: BTreeMap<String, ParamValue>,
}

/// A side connection outside the main chain, e.g. a shadow layer feeding the
/// aux port of a compositing unit.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuxEdgeSpec {
    pub src_key: String,
    pub src_port: String,
    pub dst_key: String,
    pub dst_port: String,
}

/// An externally visible effect parameter. Range and unit hint are advisory
/// presentation metadata; nothing in this crate clamps or converts values.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub default: ParamValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_hint: Option<String>,
}

/// One redirect row: writes to `external` are broadcast onto
/// `unit_key.internal`. An external name may appear in several rows.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RedirectSpec {
    pub external: String,
    pub unit_key: String,
    pub internal: String,
}

/// Declarative description of a complete meta-effect: the units to create,
/// the fixed topology (main chain plus aux edges), the external parameter
/// surface, and the redirect table that wires the two together.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EffectSchema {
    pub descriptor: EffectDescriptor,
    pub units: Vec<UnitSpec>,
    /// Unit keys in main-chain order; the first is the overall input, the
    /// last the overall output.
    pub main_chain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux_edges: Vec<AuxEdgeSpec>,
    pub params: Vec<ParamSpec>,
    pub redirects: Vec<RedirectSpec>,
}

impl EffectSchema {
    pub fn unit_spec(&self, key: &str) -> Option<&UnitSpec> {
        self.units.iter().find(|u| u.key == key)
    }

    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Shape validation: key uniqueness and resolvability. Topology checks
    /// (unknown primitive types, cycles) belong to the builder, which has the
    /// registry in hand.
    pub fn validate(&self) -> VitricResult<()> {
        let mut keys = BTreeSet::new();
        for u in &self.units {
            if u.key.trim().is_empty() {
                return Err(VitricError::validation("unit key must be non-empty"));
            }
            if !keys.insert(u.key.as_str()) {
                return Err(VitricError::validation(format!(
                    "duplicate unit key '{}'",
                    u.key
                )));
            }
        }

        if self.main_chain.len() < 2 {
            return Err(VitricError::validation(
                "main chain must name at least an input and an output unit",
            ));
        }
        for key in &self.main_chain {
            if !keys.contains(key.as_str()) {
                return Err(VitricError::dangling_edge(format!(
                    "main chain references unknown unit '{key}'"
                )));
            }
        }
        for e in &self.aux_edges {
            if !keys.contains(e.src_key.as_str()) {
                return Err(VitricError::dangling_edge(format!(
                    "aux edge references unknown source unit '{}'",
                    e.src_key
                )));
            }
            if !keys.contains(e.dst_key.as_str()) {
                return Err(VitricError::dangling_edge(format!(
                    "aux edge references unknown destination unit '{}'",
                    e.dst_key
                )));
            }
        }

        let mut names = BTreeSet::new();
        for p in &self.params {
            if !names.insert(p.name.as_str()) {
                return Err(VitricError::validation(format!(
                    "duplicate external parameter '{}'",
                    p.name
                )));
            }
        }
        for r in &self.redirects {
            if !names.contains(r.external.as_str()) {
                return Err(VitricError::validation(format!(
                    "redirect references undeclared external parameter '{}'",
                    r.external
                )));
            }
            if !keys.contains(r.unit_key.as_str()) {
                return Err(VitricError::unknown_target_unit(format!(
                    "redirect for '{}' references unknown unit '{}'",
                    r.external, r.unit_key
                )));
            }
        }
        Ok(())
    }
}

pub struct SchemaBuilder {
    descriptor: EffectDescriptor,
    units: Vec<UnitSpec>,
    main_chain: Vec<String>,
    aux_edges: Vec<AuxEdgeSpec>,
    params: Vec<ParamSpec>,
    redirects: Vec<RedirectSpec>,
}

impl SchemaBuilder {
    pub fn new(descriptor: EffectDescriptor) -> Self {
        Self {
            descriptor,
            units: Vec::new(),
            main_chain: Vec::new(),
            aux_edges: Vec::new(),
            params: Vec::new(),
            redirects: Vec::new(),
        }
    }

    pub fn unit(mut self, key: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.units.push(UnitSpec {
            key: key.into(),
            type_name: type_name.into(),
            init: BTreeMap::new(),
        });
        self
    }

    /// Like [`Self::unit`] with construction-time parameter overrides.
    pub fn unit_with(
        mut self,
        key: impl Into<String>,
        type_name: impl Into<String>,
        init: impl IntoIterator<Item = (&'static str, ParamValue)>,
    ) -> Self {
        self.units.push(UnitSpec {
            key: key.into(),
            type_name: type_name.into(),
            init: init
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        });
        self
    }

    pub fn main_chain<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.main_chain = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn aux_edge(
        mut self,
        src_key: impl Into<String>,
        src_port: impl Into<String>,
        dst_key: impl Into<String>,
        dst_port: impl Into<String>,
    ) -> Self {
        self.aux_edges.push(AuxEdgeSpec {
            src_key: src_key.into(),
            src_port: src_port.into(),
            dst_key: dst_key.into(),
            dst_port: dst_port.into(),
        });
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn redirect(
        mut self,
        external: impl Into<String>,
        unit_key: impl Into<String>,
        internal: impl Into<String>,
    ) -> Self {
        self.redirects.push(RedirectSpec {
            external: external.into(),
            unit_key: unit_key.into(),
            internal: internal.into(),
        });
        self
    }

    pub fn build(self) -> VitricResult<EffectSchema> {
        let schema = EffectSchema {
            descriptor: self.descriptor,
            units: self.units,
            main_chain: self.main_chain,
            aux_edges: self.aux_edges,
            params: self.params,
            redirects: self.redirects,
        };
        schema.validate()?;
        Ok(schema)
    }
}

impl ParamSpec {
    pub fn double(name: impl Into<String>, label: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
            default: ParamValue::Double(default),
            min: None,
            max: None,
            unit_hint: None,
        }
    }

    pub fn color(
        name: impl Into<String>,
        label: impl Into<String>,
        default: crate::value::Color,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
            default: ParamValue::Color(default),
            min: None,
            max: None,
            unit_hint: None,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn unit_hint(mut self, hint: impl Into<String>) -> Self {
        self.unit_hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "test:chain".to_string(),
            title: "Chain".to_string(),
            description: String::new(),
            category: "Test".to_string(),
            menu_label: "Chain…".to_string(),
        }
    }

    #[test]
    fn builder_produces_valid_schema() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit("blur", "gaussian-blur")
            .unit("out", "pass-through")
            .main_chain(["in", "blur", "out"])
            .param(ParamSpec::double("smooth", "Smooth", 0.5).range(0.0, 3.0))
            .redirect("smooth", "blur", "std-dev-x")
            .build()
            .unwrap();
        assert_eq!(schema.units.len(), 3);
        assert_eq!(schema.main_chain.first().unwrap(), "in");
    }

    #[test]
    fn duplicate_unit_key_is_rejected() {
        let err = SchemaBuilder::new(descriptor())
            .unit("a", "pass-through")
            .unit("a", "pass-through")
            .main_chain(["a", "a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, VitricError::Validation(_)));
    }

    #[test]
    fn main_chain_with_unknown_key_is_dangling() {
        let err = SchemaBuilder::new(descriptor())
            .unit("a", "pass-through")
            .unit("b", "pass-through")
            .main_chain(["a", "ghost"])
            .build()
            .unwrap_err();
        assert!(matches!(err, VitricError::DanglingEdge(_)));
    }

    #[test]
    fn redirect_to_unknown_unit_is_rejected() {
        let err = SchemaBuilder::new(descriptor())
            .unit("a", "pass-through")
            .unit("b", "pass-through")
            .main_chain(["a", "b"])
            .param(ParamSpec::double("p", "P", 0.0))
            .redirect("p", "ghost", "value")
            .build()
            .unwrap_err();
        assert!(matches!(err, VitricError::UnknownTargetUnit(_)));
    }

    #[test]
    fn json_roundtrip() {
        let schema = SchemaBuilder::new(descriptor())
            .unit("in", "pass-through")
            .unit("out", "pass-through")
            .main_chain(["in", "out"])
            .build()
            .unwrap();
        let s = serde_json::to_string_pretty(&schema).unwrap();
        let de: EffectSchema = serde_json::from_str(&s).unwrap();
        de.validate().unwrap();
        assert_eq!(de.main_chain, schema.main_chain);
    }
}
