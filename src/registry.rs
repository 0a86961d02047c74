use std::collections::BTreeMap;

use crate::{
    error::{VitricError, VitricResult},
    value::{Color, ParamValue},
};

/// Declared shape of a primitive: its type name and the parameter set it
/// accepts, each with a default value. The actual pixel implementation lives
/// in the host engine; this crate only composes and configures primitives.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PrimitiveType {
    pub name: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl PrimitiveType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), default.into());
        self
    }

    pub fn declares(&self, param: &str) -> bool {
        self.params.contains_key(param)
    }
}

/// Supplier of primitive type declarations. Implemented by the host binding;
/// [`StockRegistry`] covers the stock set used by the bundled effects.
pub trait PrimitiveRegistry {
    fn primitive(&self, type_name: &str) -> Option<&PrimitiveType>;

    fn require(&self, type_name: &str) -> VitricResult<&PrimitiveType> {
        self.primitive(type_name)
            .ok_or_else(|| VitricError::unknown_primitive_type(type_name))
    }
}

#[derive(Clone, Debug, Default)]
pub struct StockRegistry {
    types: BTreeMap<String, PrimitiveType>,
}

impl StockRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the primitive set the bundled effects compose.
    pub fn stock() -> Self {
        let mut reg = Self::default();
        for ty in stock_types() {
            reg.types.insert(ty.name.clone(), ty);
        }
        reg
    }

    pub fn register(&mut self, ty: PrimitiveType) -> VitricResult<()> {
        if self.types.contains_key(&ty.name) {
            return Err(VitricError::validation(format!(
                "duplicate primitive type '{}'",
                ty.name
            )));
        }
        self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl PrimitiveRegistry for StockRegistry {
    fn primitive(&self, type_name: &str) -> Option<&PrimitiveType> {
        self.types.get(type_name)
    }
}

fn stock_types() -> Vec<PrimitiveType> {
    vec![
        PrimitiveType::new("gaussian-blur")
            .param("std-dev-x", 1.5)
            .param("std-dev-y", 1.5)
            .param("clip-extent", true)
            .param("abyss-policy", ParamValue::Choice("none".to_string())),
        PrimitiveType::new("median-blur")
            .param("radius", 3.0)
            .param("percentile", 50.0)
            .param("alpha-percentile", 50.0)
            .param("abyss-policy", ParamValue::Choice("none".to_string())),
        PrimitiveType::new("color-to-alpha")
            .param("color", Color::rgb(1.0, 1.0, 1.0))
            .param("transparency-threshold", 0.0)
            .param("opacity-threshold", 1.0),
        PrimitiveType::new("metallic-color-shift")
            .param("solar1", 1.5)
            .param("solar2", 4.8)
            .param("solar3", 2.1),
        PrimitiveType::new("opacity").param("value", 1.0),
        PrimitiveType::new("translate").param("x", 0.0).param("y", 0.0),
        PrimitiveType::new("solid-color").param("value", Color::BLACK),
        PrimitiveType::new("over"),
        PrimitiveType::new("src"),
        PrimitiveType::new("src-in"),
        PrimitiveType::new("pass-through"),
        PrimitiveType::new("drop-shadow")
            .param("x", 20.0)
            .param("y", 20.0)
            .param("radius", 10.0)
            .param("grow-radius", 0.0)
            .param("opacity", 0.5)
            .param("color", Color::BLACK),
        PrimitiveType::new("nested-pipeline")
            .param("pipeline", ParamValue::Text(String::new())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_registry_declares_expected_params() {
        let reg = StockRegistry::stock();
        let names: Vec<&str> = reg.type_names().collect();
        assert!(names.contains(&"gaussian-blur"));
        assert!(names.contains(&"nested-pipeline"));

        let blur = reg.require("gaussian-blur").unwrap();
        assert!(blur.declares("std-dev-x"));
        assert!(blur.declares("std-dev-y"));
        assert!(!blur.declares("radius"));

        let grow = reg.require("median-blur").unwrap();
        assert!(grow.declares("alpha-percentile"));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let reg = StockRegistry::stock();
        let err = reg.require("warp-core").unwrap_err();
        assert!(matches!(
            err,
            VitricError::UnknownPrimitiveType { type_name } if type_name == "warp-core"
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = StockRegistry::empty();
        reg.register(PrimitiveType::new("over")).unwrap();
        assert!(reg.register(PrimitiveType::new("over")).is_err());
    }
}
