//! Block-stream patch engine for fixed-layout binary files.
//!
//! Logic project blobs store track names in fixed-offset slots padded out
//! with `_`, and every other structure in the file is addressed by absolute
//! offset. A rename must therefore never grow or shrink the file. Every rule
//! is normalized to a fixed footprint, a planned edit extends over the
//! separator fill trailing its slot, and patching runs in two phases:
//! a read-only scan that produces an edit plan, then a single apply pass
//! that seeks and overwrites each planned span.

use std::fs::OpenOptions;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Byte written over the unused tail of a slot after a shorter name lands.
pub const PAD_BYTE: u8 = b' ';

/// Byte the container uses to fill the unused tail of a name slot.
pub const SEPARATOR_BYTE: u8 = b'_';

/// Block size for the forward scan.
const BLOCK_SIZE: usize = 16 * 1024;

// ============================================================================
// Rules
// ============================================================================

/// One old → new token substitution, normalized to a fixed footprint.
///
/// Both sides are extended to `L = max(len(old), len(new))`: the search side
/// with separator bytes (that is what the container pads slots with, so the
/// extended token still matches on disk), the write side with pad bytes. The
/// scan then widens each match over the separator run trailing it, so the
/// whole slot ends up space-padded however long it is. Repeated application
/// is a fixed point: once a slot holds the space-padded replacement, the
/// separator-padded search token no longer occurs there.
#[derive(Debug, Clone)]
pub struct RenameRule {
    search: Vec<u8>,
    replacement: Vec<u8>,
    label: String,
}

impl RenameRule {
    pub fn new(old: &str, new: &str) -> Result<Self> {
        if old.is_empty() {
            return Err(Error::Format("empty search token in rename rule".into()));
        }
        let footprint = old.len().max(new.len());
        let mut search = old.as_bytes().to_vec();
        search.resize(footprint, SEPARATOR_BYTE);
        let mut replacement = new.as_bytes().to_vec();
        replacement.resize(footprint, PAD_BYTE);
        Ok(RenameRule {
            search,
            replacement,
            label: old.to_string(),
        })
    }

    /// The old name this rule was built from, for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn footprint(&self) -> usize {
        self.search.len()
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A single fixed-footprint edit at an absolute file offset.
#[derive(Debug, Clone)]
pub struct Edit {
    pub offset: u64,
    pub old: Vec<u8>,
    pub new: Vec<u8>,
}

/// Per-rule match count from a scan pass.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCount {
    pub name: String,
    pub count: usize,
}

/// Output of the read-only scan phase: every edit the apply phase will
/// perform, in ascending offset order, plus per-rule match counts.
#[derive(Debug)]
pub struct PatchPlan {
    pub edits: Vec<Edit>,
    pub matches: Vec<MatchCount>,
}

impl PatchPlan {
    /// Labels of rules that never matched, in rule order.
    pub fn not_found(&self) -> Vec<String> {
        self.matches
            .iter()
            .filter(|m| m.count == 0)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Reject any plan that could grow the file or rewrite a byte twice.
    fn validate(&self) -> Result<()> {
        let mut prev_end = 0u64;
        for edit in &self.edits {
            if edit.new.len() != edit.old.len() {
                return Err(Error::Format(format!(
                    "edit at offset {} would change length ({} -> {} bytes)",
                    edit.offset,
                    edit.old.len(),
                    edit.new.len()
                )));
            }
            if edit.offset < prev_end {
                return Err(Error::Format(format!(
                    "overlapping edit at offset {}",
                    edit.offset
                )));
            }
            prev_end = edit.offset + edit.old.len() as u64;
        }
        Ok(())
    }

    fn summary(&self) -> PatchSummary {
        PatchSummary {
            replacements: self.edits.len(),
            not_found: self.not_found(),
            matched: self.matches.clone(),
        }
    }
}

/// What a patch pass did, for the per-run report.
#[derive(Debug, Clone, Serialize)]
pub struct PatchSummary {
    pub replacements: usize,
    pub matched: Vec<MatchCount>,
    pub not_found: Vec<String>,
}

// ============================================================================
// Scan phase
// ============================================================================

/// Scan `reader` for rule matches, treating it as one logical byte stream
/// addressed by absolute offset.
///
/// The rolling buffer retains a tail of `max_footprint - 1` bytes from the
/// previous block, so a token straddling two blocks is still found. Matches
/// are taken left to right, first rule wins at each position, and the scan
/// resumes past a matched span, so a planned edit is never re-matched. Each
/// edit is widened over the contiguous separator bytes after its match,
/// rewriting the rest of the slot's filler to pad bytes.
pub fn scan<R: Read>(reader: R, rules: &[RenameRule]) -> Result<PatchPlan> {
    scan_blocks(reader, rules, BLOCK_SIZE)
}

pub(crate) fn scan_blocks<R: Read>(
    mut reader: R,
    rules: &[RenameRule],
    block_size: usize,
) -> Result<PatchPlan> {
    let max_footprint = rules.iter().map(RenameRule::footprint).max().unwrap_or(0);
    let mut counts = vec![0usize; rules.len()];
    let mut edits: Vec<Edit> = Vec::new();

    if max_footprint > 0 {
        let overlap = max_footprint - 1;
        let mut block = vec![0u8; block_size.max(1)];
        let mut buf: Vec<u8> = Vec::with_capacity(block_size + overlap);
        // Absolute offset of buf[0].
        let mut base: u64 = 0;
        // Next start position to examine, relative to buf. Carries past a
        // matched span across refills so a replaced region is not rescanned.
        let mut pos: usize = 0;
        // A separator run cut off at the end of the buffer resumes after
        // the next refill.
        let mut scrub_open = false;

        loop {
            let read = fill(&mut reader, &mut block)?;
            buf.extend_from_slice(&block[..read]);
            let eof = read < block.len();

            if scrub_open {
                if let Some(edit) = edits.last_mut() {
                    scrub_separator_run(&buf, &mut pos, edit);
                }
                scrub_open = pos == buf.len() && !eof;
            }

            // Starts inside the overlap tail cannot yet see a full token;
            // defer them to the next block unless the stream has ended.
            let limit = if eof {
                buf.len()
            } else {
                buf.len().saturating_sub(overlap)
            };

            while pos < limit {
                let mut matched = false;
                for (idx, rule) in rules.iter().enumerate() {
                    let token = &rule.search;
                    if buf.len() - pos >= token.len() && buf[pos..pos + token.len()] == token[..] {
                        let mut edit = Edit {
                            offset: base + pos as u64,
                            old: token.clone(),
                            new: rule.replacement.clone(),
                        };
                        counts[idx] += 1;
                        pos += token.len();
                        scrub_separator_run(&buf, &mut pos, &mut edit);
                        scrub_open = pos == buf.len() && !eof;
                        edits.push(edit);
                        matched = true;
                        break;
                    }
                }
                if !matched {
                    pos += 1;
                }
            }

            if eof {
                break;
            }
            if limit > 0 {
                base += limit as u64;
                buf.drain(..limit);
                pos -= limit;
            }
        }
    }

    let plan = PatchPlan {
        edits,
        matches: rules
            .iter()
            .zip(counts)
            .map(|(rule, count)| MatchCount {
                name: rule.label().to_string(),
                count,
            })
            .collect(),
    };
    plan.validate()?;
    Ok(plan)
}

/// Widen an edit over the separator run trailing its matched span, planning
/// a pad byte over every filler byte left in the slot.
fn scrub_separator_run(buf: &[u8], pos: &mut usize, edit: &mut Edit) {
    while *pos < buf.len() && buf[*pos] == SEPARATOR_BYTE {
        edit.old.push(SEPARATOR_BYTE);
        edit.new.push(PAD_BYTE);
        *pos += 1;
    }
}

/// Read until `block` is full or the stream ends; returns bytes read.
fn fill<R: Read>(reader: &mut R, block: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = reader.read(&mut block[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

// ============================================================================
// Apply phase
// ============================================================================

/// Apply a plan to `file`. Seeks are absolute; each edit overwrites exactly
/// its matched span, so unrelated offsets are untouched and the file length
/// cannot change. Not transactional: a crash mid-pass leaves a same-length
/// but inconsistent file, which is why callers patch a disposable copy.
pub fn apply<F: Write + Seek>(file: &mut F, plan: &PatchPlan) -> Result<()> {
    plan.validate()?;
    for edit in &plan.edits {
        file.seek(SeekFrom::Start(edit.offset))?;
        file.write_all(&edit.new)?;
    }
    file.flush()?;
    Ok(())
}

/// Scan and patch `path` in place.
pub fn patch_file(path: &Path, rules: &[RenameRule]) -> Result<PatchSummary> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let plan = scan(BufReader::new(&file), rules)?;
    apply(&mut file, &plan)?;
    Ok(plan.summary())
}

// ============================================================================
// Tests
// ============================================================================
