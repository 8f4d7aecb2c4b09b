//! SG-006: CLI subcommands — generate, validate.
//!
//! The only layer that touches the filesystem for output. Each document is
//! generated and written independently: a render failure in one playbook is
//! reported and skips only that playbook. Writes are atomic (temp file +
//! rename) so a failure mid-generation never truncates a previously
//! published document.

use crate::core::extract::{extract, Extraction};
use crate::core::types::{DocKind, WorkflowDocument};
use crate::core::{compiler, facts, render};
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate provisioning playbooks from a storage facts document
    Generate {
        /// Path to the storage facts JSON
        #[arg(short, long, default_value = "all_storage_facts.json")]
        facts: PathBuf,

        /// Directory to write generated playbooks into
        #[arg(short, long, default_value = "generated_playbooks")]
        out_dir: PathBuf,

        /// Generate only one document kind
        #[arg(long, value_enum)]
        only: Option<DocFilter>,
    },

    /// Parse a facts document and report entity counts without writing
    Validate {
        /// Path to the storage facts JSON
        #[arg(short, long, default_value = "all_storage_facts.json")]
        facts: PathBuf,
    },
}

/// CLI-facing selection of a single output document.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFilter {
    Volumes,
    Hostgroups,
    Bindings,
    Combined,
}

impl DocFilter {
    fn kind(self) -> DocKind {
        match self {
            Self::Volumes => DocKind::Volumes,
            Self::Hostgroups => DocKind::HostGroups,
            Self::Bindings => DocKind::Bindings,
            Self::Combined => DocKind::Combined,
        }
    }
}

const ALL_KINDS: [DocKind; 4] = [
    DocKind::Volumes,
    DocKind::HostGroups,
    DocKind::Bindings,
    DocKind::Combined,
];

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Generate {
            facts,
            out_dir,
            only,
        } => cmd_generate(&facts, &out_dir, only),
        Commands::Validate { facts } => cmd_validate(&facts),
    }
}

fn cmd_generate(
    facts_path: &Path,
    out_dir: &Path,
    only: Option<DocFilter>,
) -> Result<(), String> {
    // Input errors are fatal before any output is produced.
    let doc = facts::parse_facts_file(facts_path)?;
    let extraction = extract(&doc);

    println!(
        "Loaded {}: {} LDEVs, {} hostgroups, {} LDEV-HG mappings",
        facts_path.display(),
        extraction.volumes.len(),
        extraction.host_groups.len(),
        extraction.bindings.len()
    );

    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("cannot create output dir {}: {}", out_dir.display(), e))?;

    let generated_at = render::now_timestamp();
    let mut failed = 0;
    for kind in ALL_KINDS {
        if let Some(filter) = only {
            if filter.kind() != kind {
                continue;
            }
        }
        match generate_one(kind, &extraction, out_dir, &generated_at) {
            Ok((path, bytes)) => {
                println!("Generated: {} ({:.1} KB)", path.display(), bytes as f64 / 1024.0);
            }
            Err(e) => {
                eprintln!("  ERROR: {} document: {}", kind, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} document(s) failed", failed));
    }
    Ok(())
}

/// Compile, render, and atomically publish one document.
fn generate_one(
    kind: DocKind,
    extraction: &Extraction,
    out_dir: &Path,
    generated_at: &str,
) -> Result<(PathBuf, usize), String> {
    let workflow = compile_for(kind, extraction);
    let text = render::render_document(&workflow, generated_at).map_err(|e| e.to_string())?;

    // The runner consumes YAML; catch a malformed document before publishing.
    serde_yaml_ng::from_str::<serde_yaml_ng::Value>(&text)
        .map_err(|e| format!("generated document is not well-formed YAML: {}", e))?;

    let path = out_dir.join(kind.file_name());
    write_atomic(&path, &text)?;
    Ok((path, text.len()))
}

fn compile_for(kind: DocKind, extraction: &Extraction) -> WorkflowDocument {
    match kind {
        DocKind::Volumes => compiler::compile_volume_creation(&extraction.volumes),
        DocKind::HostGroups => compiler::compile_host_group_creation(&extraction.host_groups),
        DocKind::Bindings => {
            compiler::compile_bindings(&extraction.volumes, &extraction.bindings)
        }
        DocKind::Combined => compiler::compile_combined(extraction),
    }
}

/// Atomic publish: write to a temp file, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    let tmp_path = path.with_extension("yml.tmp");
    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}

fn cmd_validate(facts_path: &Path) -> Result<(), String> {
    let doc = facts::parse_facts_file(facts_path)?;
    let extraction = extract(&doc);
    let wwn_groups = extraction
        .host_groups
        .iter()
        .filter(|hg| !hg.wwns.is_empty())
        .count();
    println!(
        "OK: {} ({} LDEVs, {} hostgroups ({} with WWNs), {} LDEV-HG mappings)",
        facts_path.display(),
        extraction.volumes.len(),
        extraction.host_groups.len(),
        wwn_groups,
        extraction.bindings.len()
    );
    Ok(())
}
