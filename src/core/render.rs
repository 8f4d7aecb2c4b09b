//! SG-005: Document Renderer — workflow document tree to playbook text.
//!
//! One serialization pass over the tree. Quoting and key ordering are
//! applied uniformly here, never re-implemented per template block: step
//! parameters render in their fixed schema order, strings are always
//! double-quoted, booleans lower-cased, integers bare, missing values
//! explicit `null`. The vendor task blocks (`hv_ldev` / `hv_hg` parameter
//! schemas, tags, loop labels) are fixed interface contracts and rendered
//! verbatim.
//!
//! A value outside the scalar grammar (a string with control characters)
//! surfaces as a `RenderError` naming the offending field path; it is fatal
//! for that document only.

use super::compiler::validate_stage_order;
use super::types::{Action, DocKind, ParamValue, Stage, Step, WorkflowDocument};
use std::fmt;

/// Structured renderer failure: which field, and why.
#[derive(Debug, Clone)]
pub struct RenderError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render error at {}: {}", self.path, self.message)
    }
}

const BANNER: &str =
    "####################################################################\n";

/// Serialize a workflow document into playbook text. The generation
/// timestamp is injected by the caller so regeneration from unchanged facts
/// is byte-identical under a fixed timestamp.
pub fn render_document(
    doc: &WorkflowDocument,
    generated_at: &str,
) -> Result<String, RenderError> {
    validate_stage_order(doc).map_err(|message| RenderError {
        path: "stages".to_string(),
        message,
    })?;
    match doc.kind {
        DocKind::Volumes => render_volumes(doc, generated_at),
        DocKind::HostGroups => render_host_groups(doc, generated_at),
        DocKind::Bindings => render_bindings(doc, generated_at),
        DocKind::Combined => render_combined(doc, generated_at),
    }
}

// ============================================================================
// Per-document assembly
// ============================================================================

fn render_volumes(doc: &WorkflowDocument, generated_at: &str) -> Result<String, RenderError> {
    let stage = single_stage(doc)?;
    let steps = numbered(stage);

    let mut out = header(
        "Auto-Generated LDEV Creation Playbook - All LDEVs",
        generated_at,
        &[("Total LDEVs", steps.len())],
    );
    out.push_str(&play_preamble(&doc.name));
    out.push_str("    # LDEV configuration extracted from the storage facts document\n");
    out.push_str(&config_block("ldev_config", &steps, 0)?);
    out.push('\n');
    out.push_str(VOLUME_TASKS);
    Ok(out)
}

fn render_host_groups(doc: &WorkflowDocument, generated_at: &str) -> Result<String, RenderError> {
    let stage = single_stage(doc)?;
    let creates: Vec<(usize, &Step)> = numbered(stage)
        .into_iter()
        .filter(|(_, s)| s.action == Action::Create)
        .collect();
    let wwn_binds: Vec<(usize, &Step)> = numbered(stage)
        .into_iter()
        .filter(|(_, s)| s.action == Action::BindWwn)
        .collect();

    let mut out = header(
        "Auto-Generated Hostgroup Creation Playbook - All Hostgroups",
        generated_at,
        &[
            ("Total Hostgroups", creates.len()),
            ("WWN Bindings", wwn_binds.len()),
        ],
    );
    out.push_str(&play_preamble(&doc.name));
    out.push_str("    # Hostgroup configuration extracted from the storage facts document\n");
    out.push_str(&config_block("hostgroup_config", &creates, 0)?);
    if !wwn_binds.is_empty() {
        out.push('\n');
        out.push_str("    # Hostgroups carrying WWNs to register\n");
        out.push_str(&config_block("wwn_config", &wwn_binds, 0)?);
    }
    out.push('\n');
    out.push_str(HOST_GROUP_CREATE_TASKS);
    if !wwn_binds.is_empty() {
        out.push('\n');
        out.push_str(WWN_BIND_TASK);
    }
    out.push('\n');
    out.push_str(HOST_GROUP_COLLECT_TASKS);
    Ok(out)
}

fn render_bindings(doc: &WorkflowDocument, generated_at: &str) -> Result<String, RenderError> {
    let stage = single_stage(doc)?;
    let steps = numbered(stage);

    let mut out = header(
        "Auto-Generated LDEV Provisioning to Hostgroups Playbook",
        generated_at,
        &[("Total LDEV-HG Mappings", steps.len())],
    );
    out.push_str(&play_preamble(&doc.name));
    out.push_str("    # LDEV to hostgroup provisioning mappings from the storage facts document\n");
    out.push_str(&config_block("provisioning_mappings", &steps, 0)?);
    out.push('\n');
    out.push_str(BINDING_TASKS);
    Ok(out)
}

fn render_combined(doc: &WorkflowDocument, generated_at: &str) -> Result<String, RenderError> {
    if doc.stages.len() != 3 {
        return Err(RenderError {
            path: "stages".to_string(),
            message: format!("combined document expects 3 stages, got {}", doc.stages.len()),
        });
    }
    let volumes = numbered(&doc.stages[0]);
    let host_groups = numbered(&doc.stages[1]);
    let mappings = numbered(&doc.stages[2]);

    let mut out = header(
        "Auto-Generated Complete Provisioning Workflow",
        generated_at,
        &[
            ("LDEVs", volumes.len()),
            ("Hostgroups", host_groups.len()),
            ("LDEV-HG Mappings", mappings.len()),
        ],
    );
    out.push_str(&play_preamble(&doc.name));
    out.push_str("    # All LDEVs from the storage facts document\n");
    out.push_str(&config_block("ldev_config", &volumes, 0)?);
    out.push('\n');
    out.push_str("    # All hostgroups from the storage facts document\n");
    out.push_str(&config_block("hostgroup_config", &host_groups, 1)?);
    out.push('\n');
    out.push_str("    # LDEV-hostgroup provisioning mappings\n");
    out.push_str(&config_block("provisioning_mappings", &mappings, 2)?);
    out.push('\n');
    out.push_str(COMBINED_TASKS);
    Ok(out)
}

// ============================================================================
// Building blocks
// ============================================================================

fn header(title: &str, generated_at: &str, counts: &[(&str, usize)]) -> String {
    let mut out = String::from("---\n");
    out.push_str(BANNER);
    out.push_str(&format!("# {}\n", title));
    out.push_str(&format!("# Generated: {}\n", generated_at));
    for (label, n) in counts {
        out.push_str(&format!("# {}: {}\n", label, n));
    }
    out.push_str(BANNER);
    out
}

/// Play preamble: local execution, facts not pre-gathered, and the external
/// credential placeholders every document carries so it can run on its own.
fn play_preamble(play_name: &str) -> String {
    let mut out = format!("- name: {}\n", play_name);
    out.push_str(
        r#"  hosts: localhost
  gather_facts: false

  vars_files:
    - ../ansible_vault_vars/ansible_vault_storage_var.yml

  vars:
    connection_info:
      address: "{{ storage_address }}"
      username: "{{ vault_storage_username }}"
      password: "{{ vault_storage_secret }}"

"#,
    );
    out
}

fn single_stage(doc: &WorkflowDocument) -> Result<&Stage, RenderError> {
    doc.stages.first().ok_or_else(|| RenderError {
        path: "stages".to_string(),
        message: "document has no stages".to_string(),
    })
}

/// Steps paired with their index within the stage, for error paths.
fn numbered(stage: &Stage) -> Vec<(usize, &Step)> {
    stage.steps.iter().enumerate().collect()
}

/// Render a vars list from step parameter maps. An empty step list renders
/// an explicit empty sequence so the key always exists.
fn config_block(
    key: &str,
    steps: &[(usize, &Step)],
    stage_idx: usize,
) -> Result<String, RenderError> {
    if steps.is_empty() {
        return Ok(format!("    {}: []\n", key));
    }
    let mut out = format!("    {}:\n", key);
    for (step_idx, step) in steps {
        let mut first = true;
        for (param, value) in &step.params {
            let path = format!("stages[{}].steps[{}].{}", stage_idx, step_idx, param);
            let rendered = scalar(value, &path)?;
            if first {
                out.push_str(&format!("      - {}: {}\n", param, rendered));
                first = false;
            } else {
                out.push_str(&format!("        {}: {}\n", param, rendered));
            }
        }
    }
    Ok(out)
}

fn scalar(value: &ParamValue, path: &str) -> Result<String, RenderError> {
    match value {
        ParamValue::Null => Ok("null".to_string()),
        ParamValue::Bool(b) => Ok(b.to_string()),
        ParamValue::Int(n) => Ok(n.to_string()),
        ParamValue::Str(s) => quote(s, path),
        ParamValue::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                parts.push(scalar(item, &format!("{}[{}]", path, i))?);
            }
            Ok(format!("[{}]", parts.join(", ")))
        }
    }
}

fn quote(s: &str, path: &str) -> Result<String, RenderError> {
    if let Some(c) = s.chars().find(|c| c.is_control()) {
        return Err(RenderError {
            path: path.to_string(),
            message: format!(
                "control character {:?} cannot be represented in a quoted scalar",
                c
            ),
        });
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    Ok(out)
}

// ============================================================================
// Timestamps
// ============================================================================

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`. Manual conversion — no chrono
/// dependency.
pub fn now_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let days = secs / 86400;
    let tod = secs % 86400;
    let (hours, minutes, seconds) = (tod / 3600, (tod % 3600) / 60, tod % 60);

    let mut year = 1970u64;
    let mut remaining = days;
    loop {
        let year_days = if is_leap(year) { 366 } else { 365 };
        if remaining < year_days {
            break;
        }
        remaining -= year_days;
        year += 1;
    }
    let month_days = [
        31,
        if is_leap(year) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 1;
    for md in month_days {
        if remaining < md {
            break;
        }
        remaining -= md;
        month += 1;
    }
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        remaining + 1,
        hours,
        minutes,
        seconds
    )
}

fn is_leap(y: u64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

// ============================================================================
// Fixed vendor task blocks (interface contracts, rendered verbatim)
// ============================================================================

const VOLUME_TASKS: &str = r#"  tasks:
    - name: Create All LDEVs from storage facts
      hitachivantara.vspone_block.vsp.hv_ldev:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          pool_id: "{{ item.pool_id }}"
          size: "{{ item.size }}"
          name: "{{ item.name }}"
          capacity_saving: "{{ item.capacity_saving }}"
          data_reduction_share: "{{ item.data_reduction_share }}"
      register: ldev_result
      loop: "{{ ldev_config }}"
      loop_control:
        label: "LDEV {{ item.ldev_id }}: {{ item.name }}"
      tags:
        - ldev
        - always

    - name: Collect created LDEV IDs
      ansible.builtin.set_fact:
        created_ldev_ids: "{{ ldev_result.results | map(attribute='item.ldev_id') | list }}"
      when: ldev_result is succeeded

  post_tasks:
    - name: Display created LDEVs information
      ansible.builtin.debug:
        msg: |
          LDEVs created: {{ ldev_config | length }}
          Created LDEV IDs: {{ created_ldev_ids | default([]) }}
"#;

const HOST_GROUP_CREATE_TASKS: &str = r#"  tasks:
    - name: Create All Hostgroups from storage facts
      hitachivantara.vspone_block.vsp.hv_hg:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          name: "{{ item.name }}"
          port: "{{ item.port }}"
          host_mode: "{{ item.host_mode }}"
      register: hostgroup_result
      loop: "{{ hostgroup_config }}"
      loop_control:
        label: "HG {{ item.hg_id }}: {{ item.name }} on {{ item.port }}"
      tags:
        - hostgroup
        - always
"#;

const WWN_BIND_TASK: &str = r#"    - name: Add WWNs to Hostgroups
      hitachivantara.vspone_block.vsp.hv_hg:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          state: add_wwn
          name: "{{ item.name }}"
          port: "{{ item.port }}"
          wwns: "{{ item.wwns }}"
      loop: "{{ wwn_config }}"
      loop_control:
        label: "{{ item.name }}"
      tags:
        - hostgroup
        - wwn
"#;

const HOST_GROUP_COLLECT_TASKS: &str = r#"    - name: Collect created hostgroup information
      ansible.builtin.set_fact:
        created_hostgroups: "{{ hostgroup_result.results | map(attribute='item') | list }}"
      when: hostgroup_result is succeeded

  post_tasks:
    - name: Display created hostgroups information
      ansible.builtin.debug:
        msg: |
          Hostgroups created: {{ hostgroup_config | length }}
"#;

const BINDING_TASKS: &str = r#"  tasks:
    - name: Provision LDEVs to Hostgroups
      hitachivantara.vspone_block.vsp.hv_hg:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          state: present_ldev
          name: "{{ item.hostgroup_name }}"
          port: "{{ item.port }}"
          ldevs: ["{{ item.ldev_id }}"]
      register: provision_result
      loop: "{{ provisioning_mappings }}"
      loop_control:
        label: "LDEV {{ item.ldev_id }} ({{ item.ldev_name }}) -> {{ item.hostgroup_name }} on {{ item.port }}"
      tags:
        - provision
        - always

  post_tasks:
    - name: Display provisioning summary
      ansible.builtin.debug:
        msg: |
          LDEV-HG mappings applied: {{ provisioning_mappings | length }}
"#;

const COMBINED_TASKS: &str = r#"  tasks:
    - name: Create All LDEVs from storage facts
      hitachivantara.vspone_block.vsp.hv_ldev:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          pool_id: "{{ item.pool_id }}"
          size: "{{ item.size }}"
          name: "{{ item.name }}"
      register: ldev_result
      loop: "{{ ldev_config }}"
      loop_control:
        label: "LDEV {{ item.ldev_id }}: {{ item.name }}"
      tags:
        - ldev
        - always

    - name: Collect LDEV creation results
      ansible.builtin.set_fact:
        created_ldevs: "{{ ldev_result.results | map(attribute='item') | list }}"
      when: ldev_result is succeeded

    - name: Create All Hostgroups from storage facts
      hitachivantara.vspone_block.vsp.hv_hg:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          name: "{{ item.name }}"
          port: "{{ item.port }}"
          host_mode: "{{ item.host_mode }}"
      register: hostgroup_result
      loop: "{{ hostgroup_config }}"
      loop_control:
        label: "HG {{ item.hg_id }}: {{ item.name }} on {{ item.port }}"
      tags:
        - hostgroup
        - always

    - name: Collect Hostgroup creation results
      ansible.builtin.set_fact:
        created_hostgroups: "{{ hostgroup_result.results | map(attribute='item') | list }}"
      when: hostgroup_result is succeeded

    - name: Provision LDEVs to Hostgroups
      hitachivantara.vspone_block.vsp.hv_hg:
        connection_info: "{{ connection_info }}"
        state: present
        spec:
          state: present_ldev
          name: "{{ item.hostgroup_name }}"
          port: "{{ item.port }}"
          ldevs: ["{{ item.ldev_id }}"]
      register: provision_result
      loop: "{{ provisioning_mappings }}"
      loop_control:
        label: "LDEV {{ item.ldev_id }} -> {{ item.hostgroup_name }}"
      tags:
        - provision
        - always

  post_tasks:
    - name: Display provisioning summary
      ansible.builtin.debug:
        msg: |
          LDEVs created: {{ ldev_config | length }}
          Hostgroups created: {{ hostgroup_config | length }}
          LDEV-HG mappings applied: {{ provisioning_mappings | length }}
"#;

// ============================================================================
// Tests
// ============================================================================
