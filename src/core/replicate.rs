//! Variant replication: one renamed copy of a base file per name-table
//! column.
//!
//! Each variant works on its own fresh clone, so a failed pass only costs
//! that clone. Per-variant errors are recorded in the run summary and the
//! next variant proceeds.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::log_status;
use crate::patch::{self, RenameRule};
use crate::paths::{self, InputKind};
use crate::scene::{self, ChannelKind};
use crate::table::NameTable;

/// The mutable target inside a project bundle.
pub const PROJECT_DATA_RELATIVE: &str = "Alternatives/000/ProjectData";

/// Name slot budget in the project blob.
pub const MAX_NAME_LEN: usize = 20;

/// Suffix appended to old names so a project-blob token cannot be a prefix
/// of another track's name.
const TOKEN_SEPARATOR_SUFFIX: &str = "__";

/// Replacement written for the empty (disable) sentinel in a project blob.
const EMPTY_PLACEHOLDER: &str = "____EMPTY____";

// ============================================================================
// Summaries
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantStatus {
    Created,
    SkippedExists,
    Failed { error: String },
}

/// What happened to one variant column.
#[derive(Debug, Clone, Serialize)]
pub struct VariantOutcome {
    pub variant: String,
    pub target: String,
    #[serde(flatten)]
    pub status: VariantStatus,
    pub replacements: usize,
    pub not_found: Vec<String>,
}

/// Per-run summary for one base input.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicateSummary {
    pub base: String,
    pub created: usize,
    pub variants: Vec<VariantOutcome>,
}

impl ReplicateSummary {
    pub fn all_created(&self) -> bool {
        self.created == self.variants.len()
    }
}

// ============================================================================
// Project bundles
// ============================================================================

/// Build the fixed-footprint rules for one variant of a project blob.
fn project_rules(mapping: &HashMap<String, String>) -> Result<Vec<RenameRule>> {
    let mut names: Vec<(&String, &String)> = mapping.iter().collect();
    names.sort();

    let mut rules = Vec::with_capacity(names.len());
    for (old, new) in names {
        if old.is_empty() {
            continue;
        }
        let new = if new.is_empty() {
            EMPTY_PLACEHOLDER
        } else {
            new.as_str()
        };
        if new.len() > MAX_NAME_LEN {
            return Err(Error::LengthOverflow {
                name: new.to_string(),
                len: new.len(),
                budget: MAX_NAME_LEN,
            });
        }
        rules.push(RenameRule::new(
            &format!("{old}{TOKEN_SEPARATOR_SUFFIX}"),
            new,
        )?);
    }
    Ok(rules)
}

fn build_project_variant(
    bundle: &Path,
    target: &Path,
    mapping: &HashMap<String, String>,
) -> Result<patch::PatchSummary> {
    let rules = project_rules(mapping)?;
    paths::copy_dir_recursive(bundle, target)?;
    patch::patch_file(&target.join(PROJECT_DATA_RELATIVE), &rules)
}

/// Clone `bundle` once per variant column and patch each clone's
/// ProjectData in place.
pub fn replicate_project(
    bundle: &Path,
    table: &NameTable,
    target_dir: &Path,
) -> Result<ReplicateSummary> {
    paths::ensure_dir(target_dir)?;
    let base = paths::base_name(bundle)?;

    let mut variants = Vec::new();
    let mut created = 0;
    for variant in table.variants() {
        let target = paths::variant_path(target_dir, &base, variant, InputKind::Project);
        if target.exists() {
            log_status!("create", "{} already exists, skipped", target.display());
            variants.push(VariantOutcome {
                variant: variant.clone(),
                target: target.display().to_string(),
                status: VariantStatus::SkippedExists,
                replacements: 0,
                not_found: Vec::new(),
            });
            continue;
        }

        let mapping = table.mapping(variant)?;
        match build_project_variant(bundle, &target, &mapping) {
            Ok(summary) => {
                log_status!("create", "Created {}", target.display());
                created += 1;
                variants.push(VariantOutcome {
                    variant: variant.clone(),
                    target: target.display().to_string(),
                    status: VariantStatus::Created,
                    replacements: summary.replacements,
                    not_found: summary.not_found,
                });
            }
            Err(err) => {
                // A half-written clone is useless; remove it and move on.
                let _ = fs::remove_dir_all(&target);
                log_status!("create", "Variant {} failed: {}", variant, err);
                variants.push(VariantOutcome {
                    variant: variant.clone(),
                    target: target.display().to_string(),
                    status: VariantStatus::Failed {
                        error: err.to_string(),
                    },
                    replacements: 0,
                    not_found: Vec::new(),
                });
            }
        }
    }

    Ok(ReplicateSummary {
        base,
        created,
        variants,
    })
}

// ============================================================================
// Mixer scenes
// ============================================================================

fn build_scene_variant(
    scene_text: &str,
    title: &str,
    mapping: &HashMap<String, String>,
) -> Result<(String, scene::RenameOutcome)> {
    let enabled = ChannelKind::parse_mode("abc")?;
    let outcome = scene::rename(scene_text, mapping, &enabled);
    let retitled = scene::rename_scene_title(&outcome.output, title)?;
    Ok((retitled, outcome))
}

/// Write one renamed copy of `scene_file` per variant column, retitling
/// each copy `{base}_{variant}`.
pub fn replicate_scene(
    scene_file: &Path,
    table: &NameTable,
    target_dir: &Path,
) -> Result<ReplicateSummary> {
    paths::ensure_dir(target_dir)?;
    let base = paths::base_name(scene_file)?;
    let scene_text = fs::read_to_string(scene_file)?;

    let mut variants = Vec::new();
    let mut created = 0;
    for variant in table.variants() {
        let target = paths::variant_path(target_dir, &base, variant, InputKind::Scene);
        if target.exists() {
            log_status!("create", "{} already exists, skipped", target.display());
            variants.push(VariantOutcome {
                variant: variant.clone(),
                target: target.display().to_string(),
                status: VariantStatus::SkippedExists,
                replacements: 0,
                not_found: Vec::new(),
            });
            continue;
        }

        let mapping = table.mapping(variant)?;
        let title = format!("{base}_{variant}");
        let written = build_scene_variant(&scene_text, &title, &mapping).and_then(
            |(output, outcome)| {
                fs::write(&target, output)?;
                Ok(outcome)
            },
        );
        match written {
            Ok(outcome) => {
                log_status!("create", "Created {}", target.display());
                created += 1;
                variants.push(VariantOutcome {
                    variant: variant.clone(),
                    target: target.display().to_string(),
                    status: VariantStatus::Created,
                    replacements: outcome.renamed.len(),
                    not_found: outcome.not_found,
                });
            }
            Err(err) => {
                let _ = fs::remove_file(&target);
                log_status!("create", "Variant {} failed: {}", variant, err);
                variants.push(VariantOutcome {
                    variant: variant.clone(),
                    target: target.display().to_string(),
                    status: VariantStatus::Failed {
                        error: err.to_string(),
                    },
                    replacements: 0,
                    not_found: Vec::new(),
                });
            }
        }
    }

    Ok(ReplicateSummary {
        base,
        created,
        variants,
    })
}

// ============================================================================
// Batch entry point
// ============================================================================

/// Replicate every project bundle and scene file directly under `base_dir`.
/// Unknown entries are skipped with a status line.
pub fn replicate_all(
    base_dir: &Path,
    table: &NameTable,
    target_dir: &Path,
) -> Result<Vec<ReplicateSummary>> {
    let mut entries: Vec<_> = fs::read_dir(base_dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut summaries = Vec::new();
    for path in entries {
        match paths::detect(&path) {
            Some(InputKind::Project) => {
                summaries.push(replicate_project(&path, table, target_dir)?);
            }
            Some(InputKind::Scene) => {
                summaries.push(replicate_scene(&path, table, target_dir)?);
            }
            None => {
                log_status!("create", "Unknown file {}, skipped", path.display());
            }
        }
    }
    Ok(summaries)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = concat!(
        "#4.0# \"Base Show\" \"\" %000000000 1\n",
        "/ch/01/config \"Kick\" 1 RD 1\n",
        "/ch/02/config \"Snare\" 2 GN 2\n",
        "/ch/01/mix ON -10.0\n",
    );

    fn write_table(dir: &Path) -> NameTable {
        let path = dir.join("names.csv");
        fs::write(&path, "Base,Fri,Sat\nKick,Kick F,Kick S\nSnare,,Snare S\n").unwrap();
        NameTable::load(&path).unwrap()
    }

    fn write_bundle(dir: &Path, blob: &[u8]) -> std::path::PathBuf {
        let bundle = dir.join("show.logicx");
        fs::create_dir_all(bundle.join("Alternatives/000")).unwrap();
        fs::write(bundle.join(PROJECT_DATA_RELATIVE), blob).unwrap();
        bundle
    }

    #[test]
    fn project_rules_append_separator_and_map_sentinel() {
        let mapping = HashMap::from([
            ("Kick".to_string(), "Drum".to_string()),
            ("Snare".to_string(), String::new()),
        ]);
        let rules = project_rules(&mapping).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].label(), "Kick__");
        assert_eq!(rules[1].label(), "Snare__");
        // The sentinel placeholder sets the footprint of the second rule.
        assert_eq!(rules[1].footprint(), EMPTY_PLACEHOLDER.len());
    }

    #[test]
    fn project_rules_reject_names_over_budget() {
        let mapping = HashMap::from([(
            "Kick".to_string(),
            "An Extremely Long Track Name".to_string(),
        )]);
        assert!(matches!(
            project_rules(&mapping),
            Err(Error::LengthOverflow { budget: 20, .. })
        ));
    }

    #[test]
    fn replicates_scene_per_variant() {
        let dir = tempfile::tempdir().unwrap();
        let scene_file = dir.path().join("show.scn");
        fs::write(&scene_file, SCENE).unwrap();
        let table = write_table(dir.path());
        let out = dir.path().join("out");

        let summary = replicate_scene(&scene_file, &table, &out).unwrap();
        assert_eq!(summary.created, 2);
        assert!(summary.all_created());

        let fri = fs::read_to_string(out.join("show_Fri.scn")).unwrap();
        assert!(fri.contains("#4.0# \"show_Fri\" \"\" %000000000 1"));
        assert!(fri.contains("/ch/01/config \"Kick F\" 1 RD 1"));
        // Empty cell disables the channel.
        assert!(fri.contains("/ch/02/config \"\" 1 OFF 0"));

        let sat = fs::read_to_string(out.join("show_Sat.scn")).unwrap();
        assert!(sat.contains("\"Kick S\""));
        assert!(sat.contains("\"Snare S\""));
    }

    #[test]
    fn existing_scene_target_is_skipped_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let scene_file = dir.path().join("show.scn");
        fs::write(&scene_file, SCENE).unwrap();
        let table = write_table(dir.path());
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("show_Fri.scn"), "do not touch").unwrap();

        let summary = replicate_scene(&scene_file, &table, &out).unwrap();
        assert_eq!(summary.created, 1);
        assert!(matches!(
            summary.variants[0].status,
            VariantStatus::SkippedExists
        ));
        assert_eq!(
            fs::read_to_string(out.join("show_Fri.scn")).unwrap(),
            "do not touch"
        );
    }

    #[test]
    fn replicates_project_bundle_per_variant() {
        let dir = tempfile::tempdir().unwrap();
        // Slots are padded with separator bytes well past the longest
        // replacement, as in a real project blob.
        let blob = b"[Kick_______________][Snare______________]";
        let bundle = write_bundle(dir.path(), blob);
        let table = write_table(dir.path());
        let out = dir.path().join("out");

        let summary = replicate_project(&bundle, &table, &out).unwrap();
        assert_eq!(summary.created, 2);

        let fri = fs::read(out.join("show_Fri.logicx").join(PROJECT_DATA_RELATIVE)).unwrap();
        assert_eq!(fri.len(), blob.len());
        assert!(fri.windows(6).any(|w| w == b"Kick F"));
        // Empty cell writes the placeholder into the slot.
        assert!(fri
            .windows(EMPTY_PLACEHOLDER.len())
            .any(|w| w == EMPTY_PLACEHOLDER.as_bytes()));
    }

    #[test]
    fn failed_project_variant_removes_partial_clone_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), b"[Kick_______]");
        let path = dir.path().join("names.csv");
        // Fri is over the 20-byte budget; Sat is fine.
        fs::write(
            &path,
            "Base,Fri,Sat\nKick,An Extremely Long Track Name,Kick S\n",
        )
        .unwrap();
        let table = NameTable::load(&path).unwrap();
        let out = dir.path().join("out");

        let summary = replicate_project(&bundle, &table, &out).unwrap();
        assert_eq!(summary.created, 1);
        assert!(matches!(
            summary.variants[0].status,
            VariantStatus::Failed { .. }
        ));
        assert!(!out.join("show_Fri.logicx").exists());
        assert!(out.join("show_Sat.logicx").exists());
    }

    #[test]
    fn failed_scene_write_is_recorded_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let scene_file = dir.path().join("show.scn");
        fs::write(&scene_file, SCENE).unwrap();
        let path = dir.path().join("names.csv");
        // The first variant name cannot be written as a file name.
        fs::write(&path, "Base,Bad/Sub,Good\nKick,Kick B,Kick G\n").unwrap();
        let table = NameTable::load(&path).unwrap();
        let out = dir.path().join("out");

        let summary = replicate_scene(&scene_file, &table, &out).unwrap();
        assert_eq!(summary.created, 1);
        assert!(matches!(
            summary.variants[0].status,
            VariantStatus::Failed { .. }
        ));
        assert!(matches!(summary.variants[1].status, VariantStatus::Created));
        assert!(out.join("show_Good.scn").exists());
    }

    #[test]
    fn not_found_names_surface_in_variant_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let scene_file = dir.path().join("show.scn");
        fs::write(&scene_file, SCENE).unwrap();
        let path = dir.path().join("names.csv");
        fs::write(&path, "Base,Fri\nKick,Kick F\nTheremin,Wave\n").unwrap();
        let table = NameTable::load(&path).unwrap();
        let out = dir.path().join("out");

        let summary = replicate_scene(&scene_file, &table, &out).unwrap();
        assert_eq!(summary.variants[0].not_found, vec!["Theremin".to_string()]);
    }

    #[test]
    fn replicate_all_dispatches_on_kind_and_skips_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("show.scn"), SCENE).unwrap();
        fs::write(base.join("notes.txt"), "ignore").unwrap();
        let bundle = base.join("tour.logicx");
        fs::create_dir_all(bundle.join("Alternatives/000")).unwrap();
        fs::write(bundle.join(PROJECT_DATA_RELATIVE), b"[Kick_______]").unwrap();
        let table = write_table(dir.path());
        let out = dir.path().join("out");

        let summaries = replicate_all(&base, &table, &out).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(out.join("show_Fri.scn").exists());
        assert!(out.join("tour_Sat.logicx").exists());
    }
}
