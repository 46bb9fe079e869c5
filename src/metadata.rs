//! Hinge-map metadata written next to the CalculiX decks.
//!
//! The file describes the portal frame geometry and the plastic hinges
//! (each identified by the pair of rotation nodes of its spring element).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IdaError, IdaResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HingeMap {
    #[serde(default)]
    pub geometry: FrameGeometry,
    #[serde(default)]
    pub hinges: Vec<HingeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameGeometry {
    /// Column height (m)
    #[serde(rename = "H", default = "default_height")]
    pub height: f64,
    /// Beam span (m)
    #[serde(rename = "L", default = "default_span")]
    pub span: f64,
    #[serde(default = "SectionDims::column")]
    pub column_section: SectionDims,
    #[serde(default = "SectionDims::beam")]
    pub beam_section: SectionDims,
}

fn default_height() -> f64 {
    3.0
}

fn default_span() -> f64 {
    5.0
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            height: default_height(),
            span: default_span(),
            column_section: SectionDims::column(),
            beam_section: SectionDims::beam(),
        }
    }
}

/// Rectangular section width `b` and depth `h` (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionDims {
    pub b: f64,
    pub h: f64,
}

impl SectionDims {
    pub fn column() -> Self {
        Self { b: 0.40, h: 0.60 }
    }

    pub fn beam() -> Self {
        Self { b: 0.25, h: 0.50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HingeDefinition {
    pub name: String,
    #[serde(rename = "rotA")]
    pub rot_a: u32,
    #[serde(rename = "rotB")]
    pub rot_b: u32,
}

impl HingeDefinition {
    /// Hinges named after the left/right columns sit at the column bases;
    /// the rest are beam-column connections.
    pub fn location(&self) -> &'static str {
        if self.name.contains('L') || self.name.contains('R') {
            "Column base"
        } else {
            "Beam-column connection"
        }
    }
}

impl HingeMap {
    pub fn hinge_names(&self) -> Vec<String> {
        self.hinges.iter().map(|h| h.name.clone()).collect()
    }

    pub fn from_json(json: &str) -> IdaResult<Self> {
        let map: HingeMap = serde_json::from_str(json)?;
        if !(map.geometry.height > 0.0) {
            return Err(IdaError::InvalidConfig(format!(
                "frame height must be positive, got {}",
                map.geometry.height
            )));
        }
        Ok(map)
    }

    pub fn load(path: &Path) -> IdaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let map = Self::from_json(&json)?;
        tracing::info!(
            "Loaded hinge map {:?}: H = {} m, L = {} m, {} hinges",
            path,
            map.geometry.height,
            map.geometry.span,
            map.hinges.len()
        );
        Ok(map)
    }

    /// Load the first (sorted by file name) metadata file in `dir`.
    pub fn discover(dir: &Path, suffix: &str) -> IdaResult<Self> {
        match find_metadata_file(dir, suffix)? {
            Some(path) => Self::load(&path),
            None => Err(IdaError::MetadataNotFound {
                dir: dir.to_path_buf(),
                suffix: suffix.to_string(),
            }),
        }
    }

    /// `discover`, falling back to the default portal frame when no
    /// metadata file exists. Used by the plotter and the reporter.
    pub fn discover_or_default(dir: &Path, suffix: &str) -> IdaResult<Self> {
        match find_metadata_file(dir, suffix)? {
            Some(path) => Self::load(&path),
            None => {
                tracing::warn!("No *{} found in {:?}, using default geometry", suffix, dir);
                Ok(Self::default())
            }
        }
    }
}

/// Candidates are sorted and the first one wins when several exist.
pub fn find_metadata_file(dir: &Path, suffix: &str) -> IdaResult<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.ends_with(suffix))
        })
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        tracing::debug!(
            "{} metadata candidates in {:?}, using {:?}",
            candidates.len(),
            dir,
            candidates[0]
        );
    }
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "geometry": {"H": 3.5, "L": 6.0, "column_section": {"b": 0.4, "h": 0.6}},
        "hinges": [
            {"name": "H_L", "rotA": 101, "rotB": 102, "ref": 1},
            {"name": "H_TL", "rotA": 103, "rotB": 104}
        ]
    }"#;

    #[test]
    fn test_parse_hinge_map() {
        let map = HingeMap::from_json(SAMPLE).unwrap();
        assert_eq!(map.geometry.height, 3.5);
        assert_eq!(map.geometry.span, 6.0);
        assert_eq!(map.geometry.beam_section, SectionDims::beam());
        assert_eq!(map.hinge_names(), vec!["H_L", "H_TL"]);
        assert_eq!(map.hinges[0].rot_a, 101);
    }

    #[test]
    fn test_missing_geometry_uses_defaults() {
        let map = HingeMap::from_json(r#"{"hinges": []}"#).unwrap();
        assert_eq!(map.geometry.height, 3.0);
        assert_eq!(map.geometry.span, 5.0);
    }

    #[test]
    fn test_zero_height_rejected() {
        assert!(HingeMap::from_json(r#"{"geometry": {"H": 0.0}}"#).is_err());
    }

    #[test]
    fn test_hinge_location() {
        let base = HingeDefinition { name: "H_L".into(), rot_a: 1, rot_b: 2 };
        let joint = HingeDefinition { name: "H_T1".into(), rot_a: 3, rot_b: 4 };
        assert_eq!(base.location(), "Column base");
        assert_eq!(joint.location(), "Beam-column connection");
    }
}
