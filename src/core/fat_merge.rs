//! Fat package reassembly
//!
//! Merges every architecture's package scratch tree into the unified package
//! root. The first architecture's copy of a file lands verbatim; later
//! architectures either combine binaries through the combining tool (once per
//! relative path, with every architecture's candidate as input) or leave the
//! first copy of plain files in place.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::ARCH_FOLDER;
use crate::core::arch::Arch;
use crate::core::classify::{self, FileClass};
use crate::core::context::Output;
use crate::core::global_config::MergeConfig;
use crate::core::merge::{MergeStats, TreeMerger};
use crate::error::{FilesystemError, MergeError, MergeFailure};
use crate::infra::combine::Combiner;
use crate::infra::filesystem;

/// Result of a fat merge
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FatMergeReport {
    /// Summed tree merge counters
    pub stats: MergeStats,
    /// Package-relative paths combined into universal binaries
    pub combined: Vec<PathBuf>,
    /// Package-relative plain files whose content differed between architectures
    pub conflicts: Vec<PathBuf>,
}

/// Root of the per-architecture package scratch folders
pub fn scratch_root(package_root: &Path) -> PathBuf {
    package_root.join(ARCH_FOLDER)
}

/// Merge `archs`' package scratch trees into `package_root`
pub fn merge_package(
    package_root: &Path,
    archs: &[Arch],
    config: &MergeConfig,
    output: &Output,
) -> Result<FatMergeReport, MergeError> {
    let combiner = Combiner::new(&config.combine_tool);
    let mut combined: HashSet<PathBuf> = HashSet::new();
    let mut report = FatMergeReport::default();
    let mut failures: Vec<MergeFailure> = Vec::new();

    for arch in archs {
        let arch_root = arch.scratch_dir(package_root);
        if !arch_root.is_dir() {
            output.warn(format!("No package output for arch {arch}"));
            continue;
        }
        output.info(format!("Merging package of arch {arch}"));

        let conflicts = &mut report.conflicts;
        let combined = &mut combined;
        let merged = TreeMerger::new()
            .with_merge_fn(|src, dst| {
                let Ok(rel) = src.strip_prefix(&arch_root) else {
                    return Ok(());
                };
                merge_file(
                    src,
                    dst,
                    rel,
                    MergeTarget {
                        package_root,
                        archs,
                        arch,
                        combiner: &combiner,
                        check_plain_conflicts: config.check_plain_conflicts,
                        output,
                    },
                    combined,
                    conflicts,
                )
            })
            .merge(&arch_root, package_root);

        match merged {
            Ok(stats) => {
                report.stats.copied += stats.copied;
                report.stats.skipped += stats.skipped;
                report.stats.delegated += stats.delegated;
            }
            // Later architectures still get merged; failures are reported together
            Err(MergeError::Aggregate { failures: arch_failures }) => {
                output.warn(format!(
                    "Merging arch {arch} left {} failed entries",
                    arch_failures.len()
                ));
                failures.extend(arch_failures);
            }
            Err(e @ MergeError::Combine(_)) => return Err(e),
        }
    }

    if !failures.is_empty() {
        return Err(MergeError::Aggregate { failures });
    }

    let mut combined: Vec<PathBuf> = combined.into_iter().collect();
    combined.sort();
    report.combined = combined;
    Ok(report)
}

/// Remove the per-architecture package scratch root
pub fn discard_scratch(package_root: &Path) -> Result<(), FilesystemError> {
    filesystem::remove_dir_all(&scratch_root(package_root))
}

struct MergeTarget<'a> {
    package_root: &'a Path,
    archs: &'a [Arch],
    arch: &'a Arch,
    combiner: &'a Combiner,
    check_plain_conflicts: bool,
    output: &'a Output,
}

fn merge_file(
    src: &Path,
    dst: &Path,
    rel: &Path,
    target: MergeTarget<'_>,
    combined: &mut HashSet<PathBuf>,
    conflicts: &mut Vec<PathBuf>,
) -> Result<(), MergeError> {
    if dst.symlink_metadata().is_err() {
        return filesystem::copy_file_preserving(src, dst)
            .map_err(|e| MergeError::io(src, dst, &e));
    }

    match classify::classify(src) {
        FileClass::Binary => {
            if combined.contains(rel) {
                return Ok(());
            }
            let candidates: Vec<PathBuf> = target
                .archs
                .iter()
                .map(|a| a.scratch_dir(target.package_root).join(rel))
                .filter(|p| p.is_file())
                .collect();

            if candidates.len() < 2 {
                return filesystem::copy_file_preserving(src, dst)
                    .map_err(|e| MergeError::io(src, dst, &e));
            }

            target.output.info(format!(
                "Combining {} slices of {}",
                candidates.len(),
                rel.display()
            ));
            target.combiner.combine(dst, &candidates)?;
            combined.insert(rel.to_path_buf());
            Ok(())
        }
        FileClass::Plain => {
            if target.check_plain_conflicts {
                match filesystem::same_content(src, dst) {
                    Ok(true) => {}
                    Ok(false) => {
                        let first = target
                            .archs
                            .iter()
                            .find(|a| a.scratch_dir(target.package_root).join(rel).is_file())
                            .unwrap_or(target.arch);
                        target.output.warn(format!(
                            "{} differs in arch {}; keeping the copy of arch {first}",
                            rel.display(),
                            target.arch
                        ));
                        conflicts.push(rel.to_path_buf());
                    }
                    Err(e) => return Err(MergeError::io(src, dst, &e)),
                }
            }
            Ok(())
        }
    }
}
