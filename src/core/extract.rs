//! SG-003: Entity Extractor — raw fact records to the flat entity model.
//!
//! Normalizes the nested fact sections into two ordered entity lists and the
//! bindings mapping, applying declared defaults exactly once. A record
//! missing an expected field never aborts extraction; the field stays
//! absent and flows through to the rendered document as an explicit null.

use super::types::{
    Bindings, CapacitySaving, FactDocument, HostGroup, HostGroupRecord, Volume, VolumeRecord,
};
use indexmap::IndexMap;

/// Everything the compiler needs, extracted in one pass. Owned by the
/// compilation pass that produced it; never shared across documents.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub volumes: Vec<Volume>,
    pub host_groups: Vec<HostGroup>,
    pub bindings: Bindings,
}

/// Extract entities and bindings from a parsed facts document. Idempotent;
/// absent top-level sections yield empty collections, not errors.
pub fn extract(doc: &FactDocument) -> Extraction {
    let volume_records: &[VolumeRecord] = doc
        .ldevs
        .as_ref()
        .map(|s| s.ansible_facts.volumes.as_slice())
        .unwrap_or(&[]);
    let host_group_records: &[HostGroupRecord] = doc
        .host_groups
        .as_ref()
        .map(|s| s.ansible_facts.host_groups.as_slice())
        .unwrap_or(&[]);

    let mut bindings: Bindings = IndexMap::new();
    for record in volume_records {
        // The volume-side reference array is the authoritative relationship
        // source. A missing or empty array contributes no entry; records
        // without an ldev_id cannot be keyed and contribute none either.
        if let Some(id) = record.ldev_id {
            if !record.hostgroups.is_empty() {
                bindings.insert(id, record.hostgroups.clone());
            }
        }
    }

    Extraction {
        volumes: volume_records.iter().map(volume_entity).collect(),
        host_groups: host_group_records.iter().map(host_group_entity).collect(),
        bindings,
    }
}

fn volume_entity(record: &VolumeRecord) -> Volume {
    Volume {
        id: record.ldev_id,
        name: record.name.clone(),
        capacity: record.total_capacity.clone(),
        pool_id: record.pool_id,
        emulation_type: record.emulation_type.clone(),
        capacity_saving: CapacitySaving::from_fact(
            record.deduplication_compression_mode.as_deref(),
        ),
        data_reduction_share: record.is_data_reduction_share_enabled.unwrap_or(true),
    }
}

fn host_group_entity(record: &HostGroupRecord) -> HostGroup {
    HostGroup {
        id: record.host_group_id,
        name: record.host_group_name.clone(),
        port: record.port_id.clone(),
        host_mode: record.host_mode.clone(),
        host_mode_options: record.host_mode_options.clone(),
        wwns: record.wwns.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::facts::parse_facts;

    fn facts(json: &str) -> Extraction {
        extract(&parse_facts(json).unwrap())
    }

    #[test]
    fn test_sg003_empty_document() {
        let ex = facts("{}");
        assert!(ex.volumes.is_empty());
        assert!(ex.host_groups.is_empty());
        assert!(ex.bindings.is_empty());
    }

    #[test]
    fn test_sg003_volume_defaults_applied_once() {
        let ex = facts(
            r#"{"ldevs": {"ansible_facts": {"volumes": [
                {"ldev_id": 100, "name": "vol-A", "total_capacity": "100G", "pool_id": 1},
                {"ldev_id": 101, "deduplication_compression_mode": "none",
                 "is_data_reduction_share_enabled": false}
            ]}}}"#,
        );
        assert_eq!(ex.volumes.len(), 2);
        // Missing fields get the declared defaults
        assert_eq!(
            ex.volumes[0].capacity_saving,
            CapacitySaving::CompressionDeduplication
        );
        assert!(ex.volumes[0].data_reduction_share);
        // Explicit values are not overwritten by a sibling's defaulting
        assert_eq!(ex.volumes[1].capacity_saving, CapacitySaving::None);
        assert!(!ex.volumes[1].data_reduction_share);
    }

    #[test]
    fn test_sg003_volume_order_preserved() {
        let ex = facts(
            r#"{"ldevs": {"ansible_facts": {"volumes": [
                {"ldev_id": 9}, {"ldev_id": 3}, {"ldev_id": 7}
            ]}}}"#,
        );
        let ids: Vec<_> = ex.volumes.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![Some(9), Some(3), Some(7)]);
    }

    #[test]
    fn test_sg003_host_group_extraction() {
        let ex = facts(
            r#"{"host_groups": {"ansible_facts": {"hostGroups": [
                {"host_group_id": 5, "host_group_name": "hg1", "port_id": "CL1-A",
                 "host_mode": "LINUX/IRIX", "host_mode_options": ["2", "13"],
                 "wwns": ["1000000000000001", "1000000000000002"]}
            ]}}}"#,
        );
        assert_eq!(ex.host_groups.len(), 1);
        let hg = &ex.host_groups[0];
        assert_eq!(hg.id, Some(5));
        assert_eq!(hg.port.as_deref(), Some("CL1-A"));
        assert_eq!(hg.host_mode_options, vec!["2", "13"]);
        assert_eq!(hg.wwns.len(), 2);
    }

    #[test]
    fn test_sg003_bindings_verbatim_and_ordered() {
        let ex = facts(
            r#"{"ldevs": {"ansible_facts": {"volumes": [
                {"ldev_id": 100, "hostgroups": [
                    {"name": "hg2", "port_id": "CL2-B"},
                    {"name": "hg1", "port_id": "CL1-A"}
                ]},
                {"ldev_id": 101},
                {"ldev_id": 102, "hostgroups": []}
            ]}}}"#,
        );
        // Only the volume with a non-empty reference array has an entry
        assert_eq!(ex.bindings.len(), 1);
        let refs = &ex.bindings[&100];
        assert_eq!(refs[0].name.as_deref(), Some("hg2"));
        assert_eq!(refs[1].name.as_deref(), Some("hg1"));
    }

    #[test]
    fn test_sg003_binding_without_ldev_id_skipped() {
        let ex = facts(
            r#"{"ldevs": {"ansible_facts": {"volumes": [
                {"name": "orphan", "hostgroups": [{"name": "hg1", "port_id": "CL1-A"}]}
            ]}}}"#,
        );
        assert!(ex.bindings.is_empty());
        assert_eq!(ex.volumes.len(), 1);
    }

    #[test]
    fn test_sg003_idempotent() {
        let doc = parse_facts(
            r#"{"ldevs": {"ansible_facts": {"volumes": [
                {"ldev_id": 1, "hostgroups": [{"name": "hg", "port_id": "CL1-A"}]}
            ]}}}"#,
        )
        .unwrap();
        let a = extract(&doc);
        let b = extract(&doc);
        assert_eq!(a.volumes, b.volumes);
        assert_eq!(a.bindings, b.bindings);
    }
}
