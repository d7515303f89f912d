//! Geography documents produced by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Topology,
    FeatureCollection,
}

impl DocumentKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Topology => "Topology",
            Self::FeatureCollection => "FeatureCollection",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Topology" => Some(Self::Topology),
            "FeatureCollection" => Some(Self::FeatureCollection),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.type_name()) }
}

/// A validated geography document. The shape is checked once when parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeographyDocument {
    Topology(Topology),
    FeatureCollection(FeatureCollection),
}

/// Arc-based compressed topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub objects:   Map<String, Value>,
    #[serde(default)]
    pub arcs:      Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox:      Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra:     Map<String, Value>,
}

/// Direct feature geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox:     Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra:    Map<String, Value>,
}

impl GeographyDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Topology(_) => DocumentKind::Topology,
            Self::FeatureCollection(_) => DocumentKind::FeatureCollection,
        }
    }

    pub fn as_topology(&self) -> Option<&Topology> {
        match self {
            Self::Topology(t) => Some(t),
            Self::FeatureCollection(_) => None,
        }
    }

    pub fn as_feature_collection(&self) -> Option<&FeatureCollection> {
        match self {
            Self::FeatureCollection(fc) => Some(fc),
            Self::Topology(_) => None,
        }
    }

    pub fn bbox(&self) -> Option<&[f64]> {
        match self {
            Self::Topology(t) => t.bbox.as_deref(),
            Self::FeatureCollection(fc) => fc.bbox.as_deref(),
        }
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        match self {
            Self::Topology(t) => format!(
                "Topology with {} object(s) [{}] and {} arc(s)",
                t.objects.len(),
                t.object_names().collect::<Vec<_>>().join(", "),
                t.arcs.len()
            ),
            Self::FeatureCollection(fc) => {
                format!("FeatureCollection with {} feature(s)", fc.features.len())
            }
        }
    }
}

impl Topology {
    pub fn object_names(&self) -> impl Iterator<Item = &str> { self.objects.keys().map(String::as_str) }
}

impl FeatureCollection {
    pub fn feature_count(&self) -> usize { self.features.len() }
}
