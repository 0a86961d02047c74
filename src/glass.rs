use std::collections::BTreeMap;

use crate::{
    builder,
    error::{VitricError, VitricResult},
    graph::{PORT_AUX, PORT_INPUT, PORT_OUTPUT},
    instance::EffectInstance,
    meta::MetaEffect,
    registry::PrimitiveRegistry,
    schema::{EffectDescriptor, EffectSchema, ParamSpec, SchemaBuilder},
    value::{Color, ParamValue},
};

/// Source line for the refraction sub-pipeline. A single `nested-pipeline`
/// unit carries it as an opaque text parameter; the host's pipeline parser
/// interprets it, this crate never does.
pub const GLASS_REFRACTION_PIPELINE: &str = "id=1 over aux=[ ref=1 ] gaussian-blur std-dev-x=0.2 std-dev-y=0.2 clip-extent=false motion-blur-linear length=0.5";

/// How the cast shadow/outline is produced. The external parameter surface
/// is identical across styles; with [`ShadowStyle::None`] the shadow
/// parameters are declared but inert (no redirect rows).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowStyle {
    /// Glass only, no side chain.
    #[default]
    None,
    /// Side chain is the host's single drop-shadow primitive.
    DropShadow,
    /// Side chain built from explicit grow, recolor, blur, translate and
    /// composite primitives.
    ComposedChain,
}

pub fn glass_descriptor() -> EffectDescriptor {
    EffectDescriptor {
        name: "vitric:glass-object".to_string(),
        title: "Glass Object".to_string(),
        description: "Turn a subject into glass, with an optional cast shadow or outline"
            .to_string(),
        category: "Artistic".to_string(),
        menu_label: "Glass transformation…".to_string(),
    }
}

fn glass_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::double("smooth", "Smooth Glass", 0.5)
            .range(0.0, 3.0)
            .unit_hint("pixel-distance"),
        ParamSpec::double("hyperopacity", "Full Opacity of Glass Object", 1.0).range(0.0, 1.4),
        ParamSpec::double("glassrotate1", "Glass Light Rotation (red channel)", 0.13)
            .description("Color shift of the red channel that makes the glass look lit")
            .range(0.0, 0.6),
        ParamSpec::double("glassrotate2", "Glass Light Rotation (green channel)", 4.8)
            .description("Color shift of the green channel that makes the glass look lit")
            .range(3.5, 6.0),
        ParamSpec::double("glassrotate3", "Glass Light Rotation (blue channel)", 2.1)
            .description("Color shift of the blue channel that makes the glass look lit")
            .range(1.5, 3.2),
        ParamSpec::double("x", "X Shadow/Outline", 0.0)
            .description("Horizontal shadow offset")
            .range(-40.0, 40.0)
            .unit_hint("pixel-distance"),
        ParamSpec::double("y", "Y Shadow/Outline", 0.0)
            .description("Vertical shadow offset")
            .range(-40.0, 40.0)
            .unit_hint("pixel-distance"),
        ParamSpec::double("radius", "Shadow/Outline Blur Radius", 5.0)
            .min(0.0)
            .unit_hint("pixel-distance"),
        ParamSpec::double("grow-radius", "Shadow/Outline Grow Radius", -1.0)
            .description(
                "The distance to expand the shadow; a negative value contracts the shadow instead",
            )
            .range(-100.0, 100.0)
            .unit_hint("pixel-distance"),
        ParamSpec::double("opacity", "Opacity of Shadow/Outline", 0.5).range(0.0, 2.0),
        ParamSpec::color("color", "Color of Shadow/Outline", Color::BLACK),
    ]
}

/// Builds the glass-object schema for one shadow style. Topology is fixed;
/// only the side chain differs between styles.
pub fn glass_object_schema(style: ShadowStyle) -> VitricResult<EffectSchema> {
    let keying_grey = Color::from_hex("#6a6a6a")?;

    let mut b = SchemaBuilder::new(glass_descriptor())
        .unit("input", "pass-through")
        .unit_with(
            "smooth-blur",
            "gaussian-blur",
            [
                ("clip-extent", ParamValue::Boolean(false)),
                ("abyss-policy", ParamValue::Choice("none".to_string())),
            ],
        )
        .unit("metallic-color-shift", "metallic-color-shift");

    if style != ShadowStyle::None {
        b = b.unit("shadow-tap", "pass-through").unit("src", "src");
    }

    b = b
        .unit_with(
            "color-to-alpha",
            "color-to-alpha",
            [
                ("color", ParamValue::Color(keying_grey)),
                ("transparency-threshold", ParamValue::Double(0.079)),
                ("opacity-threshold", ParamValue::Double(1.0)),
            ],
        )
        .unit_with(
            "nested-glass-refraction-subgraph",
            "nested-pipeline",
            [(
                "pipeline",
                ParamValue::Text(GLASS_REFRACTION_PIPELINE.to_string()),
            )],
        )
        .unit("opacity-scale", "opacity");

    match style {
        ShadowStyle::None => {
            b = b.unit("output", "pass-through").main_chain([
                "input",
                "smooth-blur",
                "metallic-color-shift",
                "color-to-alpha",
                "nested-glass-refraction-subgraph",
                "opacity-scale",
                "output",
            ]);
        }
        ShadowStyle::DropShadow => {
            b = b
                .unit_with(
                    "drop-shadow",
                    "drop-shadow",
                    [("opacity", ParamValue::Double(1.0))],
                )
                .unit_with("alpha-fix", "median-blur", [("radius", ParamValue::Double(0.0))])
                .unit("output", "pass-through")
                .main_chain([
                    "input",
                    "smooth-blur",
                    "metallic-color-shift",
                    "shadow-tap",
                    "src",
                    "color-to-alpha",
                    "nested-glass-refraction-subgraph",
                    "opacity-scale",
                    "alpha-fix",
                    "output",
                ])
                .aux_edge("shadow-tap", PORT_OUTPUT, "drop-shadow", PORT_INPUT)
                .aux_edge("drop-shadow", PORT_OUTPUT, "src", PORT_AUX)
                .redirect("x", "drop-shadow", "x")
                .redirect("y", "drop-shadow", "y")
                .redirect("radius", "drop-shadow", "radius")
                .redirect("grow-radius", "drop-shadow", "grow-radius")
                .redirect("opacity", "drop-shadow", "opacity")
                .redirect("color", "drop-shadow", "color");
        }
        ShadowStyle::ComposedChain => {
            b = b
                .unit_with(
                    "shadow-grow",
                    "median-blur",
                    [
                        ("percentile", ParamValue::Double(100.0)),
                        ("alpha-percentile", ParamValue::Double(100.0)),
                        ("abyss-policy", ParamValue::Choice("none".to_string())),
                    ],
                )
                .unit("shadow-silhouette", "src-in")
                .unit("shadow-color", "solid-color")
                .unit_with(
                    "shadow-blur",
                    "gaussian-blur",
                    [
                        ("clip-extent", ParamValue::Boolean(false)),
                        ("abyss-policy", ParamValue::Choice("none".to_string())),
                    ],
                )
                .unit("shadow-opacity", "opacity")
                .unit("shadow-translate", "translate")
                .unit("shadow-over", "over")
                .unit_with("alpha-fix", "median-blur", [("radius", ParamValue::Double(0.0))])
                .unit("output", "pass-through")
                .main_chain([
                    "input",
                    "smooth-blur",
                    "metallic-color-shift",
                    "shadow-tap",
                    "src",
                    "color-to-alpha",
                    "nested-glass-refraction-subgraph",
                    "opacity-scale",
                    "alpha-fix",
                    "output",
                ])
                // Side chain: grown and recolored silhouette, blurred, faded,
                // offset, then the untouched object is composited back over it.
                .aux_edge("shadow-tap", PORT_OUTPUT, "shadow-grow", PORT_INPUT)
                .aux_edge("shadow-grow", PORT_OUTPUT, "shadow-silhouette", PORT_INPUT)
                .aux_edge("shadow-color", PORT_OUTPUT, "shadow-silhouette", PORT_AUX)
                .aux_edge("shadow-silhouette", PORT_OUTPUT, "shadow-blur", PORT_INPUT)
                .aux_edge("shadow-blur", PORT_OUTPUT, "shadow-opacity", PORT_INPUT)
                .aux_edge("shadow-opacity", PORT_OUTPUT, "shadow-translate", PORT_INPUT)
                .aux_edge("shadow-translate", PORT_OUTPUT, "shadow-over", PORT_INPUT)
                .aux_edge("shadow-tap", PORT_OUTPUT, "shadow-over", PORT_AUX)
                .aux_edge("shadow-over", PORT_OUTPUT, "src", PORT_AUX)
                .redirect("color", "shadow-color", "value")
                .redirect("grow-radius", "shadow-grow", "radius")
                .redirect("radius", "shadow-blur", "std-dev-x")
                .redirect("radius", "shadow-blur", "std-dev-y")
                .redirect("opacity", "shadow-opacity", "value")
                .redirect("x", "shadow-translate", "x")
                .redirect("y", "shadow-translate", "y");
        }
    }

    for p in glass_params() {
        b = b.param(p);
    }
    b = b
        .redirect("smooth", "smooth-blur", "std-dev-x")
        .redirect("smooth", "smooth-blur", "std-dev-y")
        .redirect("glassrotate1", "metallic-color-shift", "solar1")
        .redirect("glassrotate2", "metallic-color-shift", "solar2")
        .redirect("glassrotate3", "metallic-color-shift", "solar3")
        .redirect("hyperopacity", "opacity-scale", "value");

    b.build()
}

/// The glass-object meta-effect as a host sees it: parameter writes are
/// accepted at any time and applied to the subgraph once attached.
#[derive(Clone, Debug)]
pub struct GlassObject {
    style: ShadowStyle,
    schema: EffectSchema,
    pending: BTreeMap<String, ParamValue>,
    state: Option<EffectInstance>,
}

impl GlassObject {
    pub fn new(style: ShadowStyle) -> VitricResult<Self> {
        Ok(Self {
            style,
            schema: glass_object_schema(style)?,
            pending: BTreeMap::new(),
            state: None,
        })
    }

    pub fn style(&self) -> ShadowStyle {
        self.style
    }

    /// Writes an external parameter. Before `attach` the value is staged;
    /// afterwards it is pushed through the redirection table immediately.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> VitricResult<()> {
        if self.schema.param_spec(name).is_none() {
            return Err(VitricError::validation(format!(
                "glass object has no external parameter '{name}'"
            )));
        }
        let value = value.into();
        match self.state.as_mut() {
            Some(instance) => instance.set(name, value),
            None => {
                self.pending.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn set_smooth(&mut self, v: f64) -> VitricResult<()> {
        self.set("smooth", v)
    }

    pub fn set_glass_opacity(&mut self, v: f64) -> VitricResult<()> {
        self.set("hyperopacity", v)
    }

    pub fn set_light_rotation(&mut self, red: f64, green: f64, blue: f64) -> VitricResult<()> {
        self.set("glassrotate1", red)?;
        self.set("glassrotate2", green)?;
        self.set("glassrotate3", blue)
    }

    pub fn set_shadow_offset(&mut self, x: f64, y: f64) -> VitricResult<()> {
        self.set("x", x)?;
        self.set("y", y)
    }

    pub fn set_shadow_blur_radius(&mut self, v: f64) -> VitricResult<()> {
        self.set("radius", v)
    }

    pub fn set_shadow_grow_radius(&mut self, v: f64) -> VitricResult<()> {
        self.set("grow-radius", v)
    }

    pub fn set_shadow_opacity(&mut self, v: f64) -> VitricResult<()> {
        self.set("opacity", v)
    }

    pub fn set_shadow_color(&mut self, c: Color) -> VitricResult<()> {
        self.set("color", c)
    }
}

impl MetaEffect for GlassObject {
    fn descriptor(&self) -> &EffectDescriptor {
        &self.schema.descriptor
    }

    fn attach(&mut self, registry: &dyn PrimitiveRegistry) -> VitricResult<()> {
        let mut instance = builder::build(self.schema.clone(), registry)?;
        for (name, value) in std::mem::take(&mut self.pending) {
            instance.set(&name, value)?;
        }
        self.state = Some(instance);
        Ok(())
    }

    fn update_graph(&mut self) -> VitricResult<()> {
        // Not attached yet: nothing to relink.
        match self.state.as_mut() {
            Some(instance) => instance.relink(),
            None => Ok(()),
        }
    }

    fn instance(&self) -> Option<&EffectInstance> {
        self.state.as_ref()
    }
}
