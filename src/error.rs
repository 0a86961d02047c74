pub type VitricResult<T> = Result<T, VitricError>;

#[derive(thiserror::Error, Debug)]
pub enum VitricError {
    #[error("unknown primitive type '{type_name}'")]
    UnknownPrimitiveType { type_name: String },

    #[error("dangling edge: {0}")]
    DanglingEdge(String),

    #[error("cycle detected: {0}")]
    CycleDetected(String),

    #[error("unknown target unit: {0}")]
    UnknownTargetUnit(String),

    #[error("unknown target parameter '{param}' on primitive type '{type_name}'")]
    UnknownTargetParameter { type_name: String, param: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VitricError {
    pub fn unknown_primitive_type(type_name: impl Into<String>) -> Self {
        Self::UnknownPrimitiveType {
            type_name: type_name.into(),
        }
    }

    pub fn dangling_edge(msg: impl Into<String>) -> Self {
        Self::DanglingEdge(msg.into())
    }

    pub fn cycle_detected(msg: impl Into<String>) -> Self {
        Self::CycleDetected(msg.into())
    }

    pub fn unknown_target_unit(msg: impl Into<String>) -> Self {
        Self::UnknownTargetUnit(msg.into())
    }

    pub fn unknown_target_parameter(
        type_name: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        Self::UnknownTargetParameter {
            type_name: type_name.into(),
            param: param.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
