//! Archive construction
//!
//! [`build`] consumes `(name, source path)` pairs, streams each source file
//! through the obfuscation cipher into the output archive, and finishes by
//! appending the TOC and patching the header.
//!
//! Error policy: a hash collision between two distinct canonical names is
//! fatal and detected before the output file is created. Repeated names and
//! missing source files are warnings; the build continues without them. Any
//! other I/O failure aborts and leaves the partial file at the output path.
//! There is no temp-file-plus-rename step; callers wanting atomicity build
//! to a scratch path and rename afterwards.

use crate::cipher;
use crate::error::{PakError, Result};
use crate::format::{AssetRecord, Header};
use crate::name;
use ahash::{AHashMap, AHashSet};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a successful build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildReport {
    /// Assets written to the payload and recorded in the TOC.
    pub written: usize,

    /// Entries dropped because their canonical name repeated an earlier
    /// one.
    pub skipped_duplicates: usize,

    /// Entries dropped because their source file did not exist.
    pub skipped_missing: usize,

    /// Total obfuscated payload bytes.
    pub payload_bytes: u64,

    /// Final TOC offset patched into the header.
    pub toc_offset: i64,
}

struct PlannedAsset {
    name: String,
    id: u64,
    source: PathBuf,
}

/// Pack `assets` into a single archive at `output`.
///
/// Iteration order of `assets` decides payload order and which of two
/// duplicate names survives (the first).
pub fn build<P, I, S, Q>(output: P, assets: I) -> Result<BuildReport>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (S, Q)>,
    S: AsRef<str>,
    Q: AsRef<Path>,
{
    let output = output.as_ref();
    // The collision pre-pass runs over the whole mapping before the output
    // file exists, so a fatal collision never leaves a file behind.
    let (planned, skipped_duplicates) = plan_assets(assets)?;

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&Header::placeholder().to_bytes())?;

    let mut report = BuildReport {
        skipped_duplicates,
        ..Default::default()
    };
    let mut records: Vec<AssetRecord> = Vec::with_capacity(planned.len());

    for asset in &planned {
        let mut data = match std::fs::read(&asset.source) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "source file {:?} for asset '{}' is missing, skipping",
                    asset.source, asset.name
                );
                report.skipped_missing += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let size = i32::try_from(data.len()).map_err(|_| PakError::AssetTooLarge {
            name: asset.name.clone(),
            len: data.len(),
        })?;

        cipher::apply_in_place(&mut data);
        let offset = writer.stream_position()? as i64;
        writer.write_all(&data)?;
        records.push(AssetRecord {
            id: asset.id,
            offset,
            size,
        });
        report.payload_bytes += data.len() as u64;
        debug!(
            "packed '{}' as {:#018x}, {} bytes at offset {}",
            asset.name,
            asset.id,
            data.len(),
            offset
        );
    }

    let toc_offset = writer.stream_position()? as i64;
    for record in &records {
        writer.write_all(&record.to_bytes())?;
    }

    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(&Header::new(records.len() as i32, toc_offset).to_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    report.written = records.len();
    report.toc_offset = toc_offset;
    info!(
        "packed {} assets ({} payload bytes) into {:?}",
        report.written, report.payload_bytes, output
    );
    Ok(report)
}

/// Canonicalize and address every entry, dropping repeated names and
/// failing on cross-name id collisions.
fn plan_assets<I, S, Q>(assets: I) -> Result<(Vec<PlannedAsset>, usize)>
where
    I: IntoIterator<Item = (S, Q)>,
    S: AsRef<str>,
    Q: AsRef<Path>,
{
    let mut planned = Vec::new();
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut claims: AHashMap<u64, String> = AHashMap::new();
    let mut skipped = 0usize;

    for (raw, source) in assets {
        let raw = raw.as_ref();
        let canonical = name::normalize(raw);
        if seen.contains(&canonical) {
            warn!("duplicate asset name '{raw}' (canonical '{canonical}'), keeping the first occurrence");
            skipped += 1;
            continue;
        }

        let id = name::hash(&canonical);
        claim_id(&mut claims, &canonical, id)?;
        seen.insert(canonical);
        planned.push(PlannedAsset {
            name: raw.to_string(),
            id,
            source: source.as_ref().to_path_buf(),
        });
    }

    Ok((planned, skipped))
}

/// Register `canonical` as the owner of `id`.
///
/// The id is the only lookup key at read time: if a different canonical
/// name already claimed it, one of the two assets would be permanently
/// unreachable, so the build must fail.
fn claim_id(claims: &mut AHashMap<u64, String>, canonical: &str, id: u64) -> Result<()> {
    match claims.get(&id) {
        Some(existing) if existing != canonical => Err(PakError::HashCollision {
            first: existing.clone(),
            second: canonical.to_string(),
            id,
        }),
        _ => {
            claims.insert(id, canonical.to_string());
            Ok(())
        }
    }
}
