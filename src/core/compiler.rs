//! SG-004: Workflow Compiler — extracted entities to workflow documents.
//!
//! Four pure generation operations over `(volumes, host_groups, bindings)`.
//! Compilation never fails: a missing scalar becomes a null parameter and
//! an unknown binding volume id resolves to a placeholder name, so a partial
//! facts document still yields an operator-reviewable workflow. Step order
//! always follows input order — operators diff regenerated documents against
//! the source facts.

use super::extract::Extraction;
use super::types::{
    Action, Bindings, DocKind, EntityKind, HostGroup, ParamValue, Stage, Step, Volume,
    WorkflowDocument,
};
use indexmap::IndexMap;
use std::collections::HashSet;

pub const STAGE_CREATE_VOLUMES: &str = "create-volumes";
pub const STAGE_CREATE_HOST_GROUPS: &str = "create-host-groups";
pub const STAGE_BIND: &str = "bind";

/// Compile the volume-creation document: one `create` step per volume, in
/// input order.
pub fn compile_volume_creation(volumes: &[Volume]) -> WorkflowDocument {
    let steps = volumes.iter().map(|v| volume_step(v, true)).collect();
    WorkflowDocument {
        kind: DocKind::Volumes,
        name: "Create All Logical Devices (LDEVs)".to_string(),
        stages: vec![Stage {
            name: STAGE_CREATE_VOLUMES.to_string(),
            depends_on: vec![],
            steps,
        }],
    }
}

/// Compile the host-group-creation document: one `create` step per host
/// group, plus exactly one `bind-wwn` step per host group with a non-empty
/// WWN set. An empty WWN set emits nothing — no no-op steps.
pub fn compile_host_group_creation(host_groups: &[HostGroup]) -> WorkflowDocument {
    let mut steps = Vec::new();
    for hg in host_groups {
        steps.push(host_group_create_step(hg));
    }
    for hg in host_groups {
        if !hg.wwns.is_empty() {
            steps.push(wwn_bind_step(hg));
        }
    }
    WorkflowDocument {
        kind: DocKind::HostGroups,
        name: "Create All Hostgroups".to_string(),
        stages: vec![Stage {
            name: STAGE_CREATE_HOST_GROUPS.to_string(),
            depends_on: vec![],
            steps,
        }],
    }
}

/// Compile the binding document: one `bind` step per (volume, host-group
/// reference) pair, in bindings-mapping insertion order then list order.
pub fn compile_bindings(volumes: &[Volume], bindings: &Bindings) -> WorkflowDocument {
    WorkflowDocument {
        kind: DocKind::Bindings,
        name: "Provision All LDEVs to Hostgroups".to_string(),
        stages: vec![bind_stage(volumes, bindings, vec![])],
    }
}

/// Compile the combined workflow: the three stages in fixed order, the bind
/// stage depending by name on both creation stages. Per-entity field sets
/// are reduced relative to the standalone documents.
pub fn compile_combined(extraction: &Extraction) -> WorkflowDocument {
    let volume_steps = extraction
        .volumes
        .iter()
        .map(|v| volume_step(v, false))
        .collect();
    let host_group_steps = extraction
        .host_groups
        .iter()
        .map(host_group_create_step)
        .collect();

    let doc = WorkflowDocument {
        kind: DocKind::Combined,
        name: "Complete Storage Provisioning Workflow".to_string(),
        stages: vec![
            Stage {
                name: STAGE_CREATE_VOLUMES.to_string(),
                depends_on: vec![],
                steps: volume_steps,
            },
            Stage {
                name: STAGE_CREATE_HOST_GROUPS.to_string(),
                depends_on: vec![],
                steps: host_group_steps,
            },
            bind_stage(
                &extraction.volumes,
                &extraction.bindings,
                vec![
                    STAGE_CREATE_VOLUMES.to_string(),
                    STAGE_CREATE_HOST_GROUPS.to_string(),
                ],
            ),
        ],
    };
    debug_assert!(validate_stage_order(&doc).is_ok());
    doc
}

/// A stage referencing a dependency that has not been emitted yet is a
/// compiler defect, not a runtime concern.
pub fn validate_stage_order(doc: &WorkflowDocument) -> Result<(), String> {
    let mut seen: HashSet<&str> = HashSet::new();
    for stage in &doc.stages {
        for dep in &stage.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(format!(
                    "stage '{}' depends on '{}' which does not precede it",
                    stage.name, dep
                ));
            }
        }
        seen.insert(&stage.name);
    }
    Ok(())
}

fn volume_step(v: &Volume, full: bool) -> Step {
    let mut params = IndexMap::from([
        ("ldev_id".to_string(), ParamValue::opt_int(v.id)),
        ("name".to_string(), ParamValue::opt_str(&v.name)),
        ("size".to_string(), ParamValue::opt_str(&v.capacity)),
        ("pool_id".to_string(), ParamValue::opt_int(v.pool_id)),
    ]);
    if full {
        params.insert(
            "emulation_type".to_string(),
            ParamValue::opt_str(&v.emulation_type),
        );
        params.insert(
            "capacity_saving".to_string(),
            ParamValue::Str(v.capacity_saving.to_string()),
        );
        params.insert(
            "data_reduction_share".to_string(),
            ParamValue::Bool(v.data_reduction_share),
        );
    }
    Step {
        entity: EntityKind::Volume,
        action: Action::Create,
        params,
    }
}

fn host_group_create_step(hg: &HostGroup) -> Step {
    Step {
        entity: EntityKind::HostGroup,
        action: Action::Create,
        params: IndexMap::from([
            ("hg_id".to_string(), ParamValue::opt_int(hg.id)),
            ("name".to_string(), ParamValue::opt_str(&hg.name)),
            ("port".to_string(), ParamValue::opt_str(&hg.port)),
            ("host_mode".to_string(), ParamValue::opt_str(&hg.host_mode)),
        ]),
    }
}

fn wwn_bind_step(hg: &HostGroup) -> Step {
    Step {
        entity: EntityKind::HostGroup,
        action: Action::BindWwn,
        params: IndexMap::from([
            ("name".to_string(), ParamValue::opt_str(&hg.name)),
            ("port".to_string(), ParamValue::opt_str(&hg.port)),
            ("wwns".to_string(), ParamValue::str_list(&hg.wwns)),
        ]),
    }
}

fn bind_stage(volumes: &[Volume], bindings: &Bindings, depends_on: Vec<String>) -> Stage {
    let mut steps = Vec::new();
    for (ldev_id, refs) in bindings {
        let ldev_name = resolve_volume_name(volumes, *ldev_id);
        for r in refs {
            steps.push(Step {
                entity: EntityKind::Binding,
                action: Action::Bind,
                params: IndexMap::from([
                    ("ldev_id".to_string(), ParamValue::Int(*ldev_id)),
                    ("ldev_name".to_string(), ParamValue::Str(ldev_name.clone())),
                    ("hostgroup_name".to_string(), ParamValue::opt_str(&r.name)),
                    ("port".to_string(), ParamValue::opt_str(&r.port_id)),
                ]),
            });
        }
    }
    Stage {
        name: STAGE_BIND.to_string(),
        depends_on,
        steps,
    }
}

/// Look up a volume's display name by id. A binding that references an id
/// absent from the volume list still gets a step — with a synthetic
/// placeholder name, never silently dropped.
fn resolve_volume_name(volumes: &[Volume], ldev_id: i64) -> String {
    volumes
        .iter()
        .find(|v| v.id == Some(ldev_id))
        .and_then(|v| v.name.clone())
        .unwrap_or_else(|| format!("Volume-{}", ldev_id))
}
