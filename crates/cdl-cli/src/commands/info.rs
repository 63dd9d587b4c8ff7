//! Document info command.
//!
//! Prints descriptions, grade values and media references, including the
//! image sequences found next to each reference.

use crate::InfoArgs;
use anyhow::Result;
use cdl_core::{ColorCorrection, ColorSpaceDesc, Context, Descriptions, Handle, MediaRef, Triplet};
use tracing::trace;

pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.input.len(), "info::run");
    let config = super::load_config(args.config.as_deref())?;

    for path in &args.input {
        let mut ctx = Context::from_config(&config);
        let col = super::load_collection(&mut ctx, path)?;

        println!("{}", path.display());
        println!("  Kind:        {}", col.kind().extension());
        print_desc(col.desc(), col.color_space(), 1);

        for decision in col.decisions() {
            println!("  Decision {}", decision.id());
            print_desc(decision.desc(), decision.color_space(), 2);
            if let Some(h) = decision.media_ref() {
                print_media_ref(&mut ctx, h, verbose);
            }
            if let Some(cc) = ctx.correction(decision.correction()) {
                print_correction(cc, 2);
            }
        }
        for &h in col.corrections() {
            if let Some(cc) = ctx.correction(h) {
                print_correction(cc, 1);
            }
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_desc(desc: &Descriptions, cs: &ColorSpaceDesc, depth: usize) {
    let pad = "  ".repeat(depth);
    for entry in desc.iter() {
        println!("{pad}Description: {entry}");
    }
    if let Some(input) = cs.input_desc() {
        println!("{pad}Input:       {input}");
    }
    if let Some(viewing) = cs.viewing_desc() {
        println!("{pad}Viewing:     {viewing}");
    }
}

fn print_correction(cc: &ColorCorrection, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}Correction {}", cc.id());
    print_desc(cc.desc(), cc.color_space(), depth + 1);
    let fmt = |t: Triplet| format!("{} {} {}", t[0], t[1], t[2]);
    println!("{pad}  Slope:       {}", fmt(cc.slope()));
    println!("{pad}  Offset:      {}", fmt(cc.offset()));
    println!("{pad}  Power:       {}", fmt(cc.power()));
    println!("{pad}  Saturation:  {}", cc.sat());
}

fn print_media_ref(ctx: &mut Context, h: Handle<MediaRef>, verbose: u8) {
    let Some(mr) = ctx.media_ref(h) else { return };
    println!("    MediaRef:    {}", mr.uri());
    if verbose > 0 {
        println!("      Exists:    {}", mr.exists());
    }
    match ctx.sequences(h) {
        Ok(sequences) if sequences.is_empty() => {}
        Ok(sequences) => {
            for seq in sequences {
                println!("      Sequence:  {seq}");
            }
        }
        Err(e) => println!("      Sequence:  unavailable ({e})"),
    }
}
