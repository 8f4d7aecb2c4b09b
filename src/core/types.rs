//! SG-001: All types — fact document schema, entity model, workflow tree.
//!
//! Three layers, left to right:
//! 1. Raw serde schema for the JSON facts document (heterogeneous, every
//!    field optional — arrays report what they report).
//! 2. Flat entity model (`Volume`, `HostGroup`) with declared defaults
//!    resolved once at extraction time.
//! 3. Workflow document tree (`WorkflowDocument` → `Stage` → `Step`) that
//!    the renderer serializes in a single pass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Raw facts document (JSON schema)
// ============================================================================

/// Top-level facts document. Both sections are optional — a facts file with
/// no `ldevs` key simply describes an array with no volumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactDocument {
    /// Volume facts, nested under `ldevs.ansible_facts.volumes`
    #[serde(default)]
    pub ldevs: Option<VolumeSection>,

    /// Host-group facts, nested under `host_groups.ansible_facts.hostGroups`
    #[serde(default)]
    pub host_groups: Option<HostGroupSection>,
}

/// The `ldevs` fact section wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeSection {
    #[serde(default)]
    pub ansible_facts: VolumeFacts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeFacts {
    #[serde(default)]
    pub volumes: Vec<VolumeRecord>,
}

/// The `host_groups` fact section wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostGroupSection {
    #[serde(default)]
    pub ansible_facts: HostGroupFacts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostGroupFacts {
    #[serde(default, rename = "hostGroups")]
    pub host_groups: Vec<HostGroupRecord>,
}

/// One raw volume record as reported by the array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeRecord {
    #[serde(default)]
    pub ldev_id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    /// Capacity string with unit (e.g. "100G"), passed through unmodified
    #[serde(default)]
    pub total_capacity: Option<String>,

    #[serde(default)]
    pub pool_id: Option<i64>,

    #[serde(default)]
    pub emulation_type: Option<String>,

    #[serde(default)]
    pub deduplication_compression_mode: Option<String>,

    #[serde(default)]
    pub is_data_reduction_share_enabled: Option<bool>,

    /// Embedded host-group references — the authoritative source for the
    /// volume/host-group relationship.
    #[serde(default)]
    pub hostgroups: Vec<HostGroupRef>,
}

/// One raw host-group record as reported by the array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostGroupRecord {
    #[serde(default)]
    pub host_group_id: Option<i64>,

    #[serde(default)]
    pub host_group_name: Option<String>,

    #[serde(default)]
    pub port_id: Option<String>,

    #[serde(default)]
    pub host_mode: Option<String>,

    #[serde(default)]
    pub host_mode_options: Vec<String>,

    #[serde(default)]
    pub wwns: Vec<String>,
}

/// A volume's reference to a host group it is (or should be) visible
/// through. Copied verbatim into the bindings mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroupRef {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub port_id: Option<String>,
}

// ============================================================================
// Entity model
// ============================================================================

/// A logical device (LDEV), normalized. Constructed once per extraction
/// pass; immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Capacity with unit, verbatim from the facts
    pub capacity: Option<String>,
    pub pool_id: Option<i64>,
    pub emulation_type: Option<String>,
    pub capacity_saving: CapacitySaving,
    pub data_reduction_share: bool,
}

/// Capacity-reduction mode for a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySaving {
    None,
    Compression,
    Deduplication,
    CompressionDeduplication,
}

impl Default for CapacitySaving {
    fn default() -> Self {
        Self::CompressionDeduplication
    }
}

impl CapacitySaving {
    /// Resolve a raw fact value. Missing or unrecognized modes fall back to
    /// the default rather than aborting extraction.
    pub fn from_fact(value: Option<&str>) -> Self {
        match value {
            Some("none") => Self::None,
            Some("compression") => Self::Compression,
            Some("deduplication") => Self::Deduplication,
            Some("compression_deduplication") => Self::CompressionDeduplication,
            _ => Self::default(),
        }
    }
}

impl fmt::Display for CapacitySaving {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Compression => write!(f, "compression"),
            Self::Deduplication => write!(f, "deduplication"),
            Self::CompressionDeduplication => write!(f, "compression_deduplication"),
        }
    }
}

/// A host group, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct HostGroup {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub port: Option<String>,
    pub host_mode: Option<String>,
    pub host_mode_options: Vec<String>,
    pub wwns: Vec<String>,
}

/// Bindings mapping: volume id → the host-group references embedded on that
/// volume's record, insertion-ordered. Volumes with no (or an empty)
/// reference array contribute no entry.
pub type Bindings = IndexMap<i64, Vec<HostGroupRef>>;

// ============================================================================
// Workflow document tree
// ============================================================================

/// Which of the four output documents a workflow describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Volumes,
    HostGroups,
    Bindings,
    Combined,
}

impl DocKind {
    /// Fixed output file name for this document.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Volumes => "03_create_ldevs_all.yml",
            Self::HostGroups => "04_create_hostgroups_all.yml",
            Self::Bindings => "05_provision_ldevs_to_hostgroups_all.yml",
            Self::Combined => "00_complete_provisioning_workflow.yml",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volumes => write!(f, "volumes"),
            Self::HostGroups => write!(f, "hostgroups"),
            Self::Bindings => write!(f, "bindings"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

/// Entity a step targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Volume,
    HostGroup,
    Binding,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume => write!(f, "volume"),
            Self::HostGroup => write!(f, "host-group"),
            Self::Binding => write!(f, "binding"),
        }
    }
}

/// Action verb for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Bind,
    BindWwn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Bind => write!(f, "bind"),
            Self::BindWwn => write!(f, "bind-wwn"),
        }
    }
}

/// Scalar grammar of the rendered document. Everything a step parameter can
/// hold must be one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Missing scalars become explicit nulls, never dropped keys.
    pub fn opt_str(v: &Option<String>) -> Self {
        match v {
            Some(s) => Self::Str(s.clone()),
            None => Self::Null,
        }
    }

    pub fn opt_int(v: Option<i64>) -> Self {
        match v {
            Some(n) => Self::Int(n),
            None => Self::Null,
        }
    }

    pub fn str_list(items: &[String]) -> Self {
        Self::List(items.iter().map(|s| Self::Str(s.clone())).collect())
    }
}

/// One declarative step: target entity, action verb, parameter mapping in
/// fixed schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub entity: EntityKind,
    pub action: Action,
    pub params: IndexMap<String, ParamValue>,
}

/// An ordered phase of a workflow document. `depends_on` names stages whose
/// results this stage consumes; a stage may only depend on stages emitted
/// before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub depends_on: Vec<String>,
    pub steps: Vec<Step>,
}

/// A complete workflow document: ordered stages, self-contained,
/// independently re-generatable from the same facts snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    pub kind: DocKind,
    pub name: String,
    pub stages: Vec<Stage>,
}

impl WorkflowDocument {
    /// Steps of a given action across all stages targeting one entity kind.
    pub fn count_steps(&self, entity: EntityKind, action: Action) -> usize {
        self.stages
            .iter()
            .flat_map(|s| &s.steps)
            .filter(|st| st.entity == entity && st.action == action)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sg001_fact_document_parse() {
        let json = r#"{
            "ldevs": {
                "ansible_facts": {
                    "volumes": [
                        {
                            "ldev_id": 100,
                            "name": "vol-A",
                            "total_capacity": "100G",
                            "pool_id": 1,
                            "hostgroups": [{"name": "hg1", "port_id": "CL1-A"}]
                        }
                    ]
                }
            },
            "host_groups": {
                "ansible_facts": {
                    "hostGroups": [
                        {
                            "host_group_id": 5,
                            "host_group_name": "hg1",
                            "port_id": "CL1-A",
                            "host_mode": "LINUX/IRIX",
                            "wwns": ["1000000000000001"]
                        }
                    ]
                }
            }
        }"#;
        let doc: FactDocument = serde_json::from_str(json).unwrap();
        let volumes = &doc.ldevs.as_ref().unwrap().ansible_facts.volumes;
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].ldev_id, Some(100));
        assert_eq!(volumes[0].hostgroups[0].name.as_deref(), Some("hg1"));
        let hgs = &doc.host_groups.as_ref().unwrap().ansible_facts.host_groups;
        assert_eq!(hgs[0].host_group_name.as_deref(), Some("hg1"));
        assert_eq!(hgs[0].wwns, vec!["1000000000000001"]);
    }

    #[test]
    fn test_sg001_missing_sections() {
        let doc: FactDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.ldevs.is_none());
        assert!(doc.host_groups.is_none());
    }

    #[test]
    fn test_sg001_unknown_fields_ignored() {
        let json = r#"{"ldevs": {"ansible_facts": {"volumes": [
            {"ldev_id": 1, "status": "NML", "extra": {"nested": true}}
        ]}}}"#;
        let doc: FactDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.ldevs.unwrap().ansible_facts.volumes[0].ldev_id,
            Some(1)
        );
    }

    #[test]
    fn test_sg001_capacity_saving_from_fact() {
        assert_eq!(CapacitySaving::from_fact(None), CapacitySaving::CompressionDeduplication);
        assert_eq!(CapacitySaving::from_fact(Some("none")), CapacitySaving::None);
        assert_eq!(
            CapacitySaving::from_fact(Some("compression")),
            CapacitySaving::Compression
        );
        assert_eq!(
            CapacitySaving::from_fact(Some("deduplication")),
            CapacitySaving::Deduplication
        );
        // Unrecognized modes fall back to the default
        assert_eq!(
            CapacitySaving::from_fact(Some("turbo")),
            CapacitySaving::CompressionDeduplication
        );
    }

    #[test]
    fn test_sg001_capacity_saving_display() {
        assert_eq!(CapacitySaving::None.to_string(), "none");
        assert_eq!(
            CapacitySaving::CompressionDeduplication.to_string(),
            "compression_deduplication"
        );
    }

    #[test]
    fn test_sg001_doc_kind_file_names() {
        assert_eq!(DocKind::Volumes.file_name(), "03_create_ldevs_all.yml");
        assert_eq!(
            DocKind::Combined.file_name(),
            "00_complete_provisioning_workflow.yml"
        );
    }

    #[test]
    fn test_sg001_action_display() {
        assert_eq!(Action::Create.to_string(), "create");
        assert_eq!(Action::BindWwn.to_string(), "bind-wwn");
    }

    #[test]
    fn test_sg001_param_value_helpers() {
        assert_eq!(ParamValue::opt_int(Some(7)), ParamValue::Int(7));
        assert_eq!(ParamValue::opt_int(None), ParamValue::Null);
        assert_eq!(
            ParamValue::opt_str(&Some("x".to_string())),
            ParamValue::Str("x".to_string())
        );
        assert_eq!(
            ParamValue::str_list(&["a".to_string()]),
            ParamValue::List(vec![ParamValue::Str("a".to_string())])
        );
    }

    #[test]
    fn test_sg001_count_steps() {
        let step = |action| Step {
            entity: EntityKind::HostGroup,
            action,
            params: IndexMap::new(),
        };
        let doc = WorkflowDocument {
            kind: DocKind::HostGroups,
            name: "t".to_string(),
            stages: vec![Stage {
                name: "create-host-groups".to_string(),
                depends_on: vec![],
                steps: vec![step(Action::Create), step(Action::Create), step(Action::BindWwn)],
            }],
        };
        assert_eq!(doc.count_steps(EntityKind::HostGroup, Action::Create), 2);
        assert_eq!(doc.count_steps(EntityKind::HostGroup, Action::BindWwn), 1);
        assert_eq!(doc.count_steps(EntityKind::Volume, Action::Create), 0);
    }
}
