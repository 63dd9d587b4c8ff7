//! Format conversion command.
//!
//! All inputs share one [`Context`], so a correction id used by two input
//! files is reported as a collision.

use crate::ConvertArgs;
use anyhow::{Context as _, Result, bail};
use cdl_core::{ColorCollection, ColorCorrection, Context, Triplet};
use cdl_io::Format;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};

const USUAL_SCALE: (f64, f64) = (0.1, 3.0);
const USUAL_OFFSET: (f64, f64) = (-1.0, 1.0);

pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    trace!(inputs = ?args.input, output = ?args.output, "convert::run");

    let config = super::load_config(args.config.as_deref())?;
    let mut ctx = Context::from_config(&config);
    if args.halt {
        ctx.set_strict_errors(true);
    }

    let Some(tags) = args.output.as_deref().or(config.dest_format.as_deref()) else {
        bail!("No output format: pass -o or set dest_format in the config");
    };
    let formats = super::parse_formats(tags)?;
    let inputs = super::expand_inputs(&args.input)?;

    if let Some(dest) = &args.dest {
        std::fs::create_dir_all(dest)
            .with_context(|| format!("Failed to create: {}", dest.display()))?;
    }

    let mut written = 0;
    let mut failed = 0;
    for input in &inputs {
        let result = convert_file(&mut ctx, input, &formats, args.dest.as_deref(), args.check);
        match result {
            Ok(paths) => {
                for path in &paths {
                    if verbose > 0 {
                        println!("{} -> {}", input.display(), path.display());
                    }
                }
                written += paths.len();
            }
            Err(e) if !ctx.strict_errors() => {
                failed += 1;
                eprintln!("Error: {:#}", e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(inputs = inputs.len(), written, failed, "Conversion complete");
    println!("Converted {} input(s): {} written, {} failed", inputs.len(), written, failed);

    if failed > 0 {
        bail!("{} input(s) failed", failed);
    }
    Ok(())
}

fn convert_file(
    ctx: &mut Context,
    input: &Path,
    formats: &[Format],
    dest: Option<&Path>,
    check: bool,
) -> Result<Vec<PathBuf>> {
    let mut col = super::load_collection(ctx, input)?;
    if col.is_empty() {
        warn!(path = %input.display(), "no corrections found");
    }
    if check {
        for line in check_collection(ctx, &col) {
            println!("{}: {}", input.display(), line);
        }
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted".to_string());

    let mut written = Vec::new();
    for &format in formats {
        match format {
            Format::Cc => {
                for handle in col.all_corrections() {
                    let Some(cc) = ctx.correction_mut(handle) else { continue };
                    let path = redirect(cc.determine_dest(format.extension()), dest);
                    if skip_overwrite(input, &path) {
                        continue;
                    }
                    cdl_io::write_cc(ctx, handle, &path)
                        .with_context(|| format!("Failed to write: {}", path.display()))?;
                    written.push(path);
                }
            }
            Format::Ccc | Format::Cdl => {
                let path = redirect(col.determine_dest(&stem, format.extension()), dest);
                if skip_overwrite(input, &path) {
                    continue;
                }
                let result = if format == Format::Ccc {
                    cdl_io::write_ccc(ctx, &col, &path)
                } else {
                    cdl_io::write_cdl(ctx, &col, &path)
                };
                result.with_context(|| format!("Failed to write: {}", path.display()))?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

fn redirect(path: &Path, dest: Option<&Path>) -> PathBuf {
    match (dest, path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn skip_overwrite(input: &Path, output: &Path) -> bool {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if same {
        warn!(path = %input.display(), "output would replace its input, skipping");
    }
    same
}

/// Lists values outside the range graders normally use.
pub fn check_collection(ctx: &Context, col: &ColorCollection) -> Vec<String> {
    col.all_corrections()
        .into_iter()
        .filter_map(|h| ctx.correction(h))
        .flat_map(check_correction)
        .collect()
}

fn check_correction(cc: &ColorCorrection) -> Vec<String> {
    let mut notes = Vec::new();
    let mut triplet = |field: &str, values: Triplet, (lo, hi): (f64, f64)| {
        if values.iter().any(|v| *v < lo || *v > hi) {
            notes.push(format!(
                "{} {} {:?} outside {}..{}",
                cc.id(),
                field,
                values,
                lo,
                hi
            ));
        }
    };
    triplet("slope", cc.slope(), USUAL_SCALE);
    triplet("offset", cc.offset(), USUAL_OFFSET);
    triplet("power", cc.power(), USUAL_SCALE);

    let (lo, hi) = USUAL_SCALE;
    if cc.sat() < lo || cc.sat() > hi {
        notes.push(format!("{} saturation {} outside {}..{}", cc.id(), cc.sat(), lo, hi));
    }
    notes
}
