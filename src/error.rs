//! Error types for the fallible entry points.
//!
//! Geometry never fails: degenerate inputs are nudged with epsilons. Only two
//! things surface as errors: an elbow arrow the router cannot connect, and a
//! configuration value that does not parse.

use crate::element::ElementId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error("element is not an elbow arrow: {0}")]
    NotElbowArrow(ElementId),
    #[error("elbow arrow {arrow_id} needs at least two points, has {count}")]
    TooFewPoints { arrow_id: ElementId, count: usize },
    #[error("no orthogonal route found for elbow arrow {arrow_id}")]
    Unreachable { arrow_id: ElementId },
}

impl RouteError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ELEMENT_NOT_FOUND",
            Self::NotElbowArrow(_) => "E_NOT_ELBOW_ARROW",
            Self::TooFewPoints { .. } => "E_TOO_FEW_POINTS",
            Self::Unreachable { .. } => "E_ROUTE_UNREACHABLE",
        }
    }

    /// The arrow the failure refers to.
    #[must_use]
    pub fn arrow_id(&self) -> ElementId {
        match self {
            Self::NotFound(id) | Self::NotElbowArrow(id) => *id,
            Self::TooFewPoints { arrow_id, .. } | Self::Unreachable { arrow_id } => *arrow_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}

impl ConfigError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}
