//! Writers for `.cc`, `.ccc` and `.cdl` documents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use cdl_core::value::Triplet;
use cdl_core::{
    CdlError, ColorCollection, ColorCorrection, ColorSpaceDesc, Context, Descriptions, Handle,
};
use quick_xml::escape::escape;
use tracing::debug;

use crate::IoResult;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const NAMESPACE: &str = "urn:ASC:CDL:v1.01";

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn triplet(t: Triplet) -> String {
    format!("{} {} {}", t[0], t[1], t[2])
}

fn write_desc<W: Write>(w: &mut W, desc: &Descriptions, depth: usize) -> IoResult<()> {
    for entry in desc.iter() {
        writeln!(w, "{}<Description>{}</Description>", indent(depth), escape(entry))?;
    }
    Ok(())
}

fn write_color_space<W: Write>(w: &mut W, cs: &ColorSpaceDesc, depth: usize) -> IoResult<()> {
    if let Some(input) = cs.input_desc() {
        writeln!(w, "{}<InputDescription>{}</InputDescription>", indent(depth), escape(input))?;
    }
    if let Some(viewing) = cs.viewing_desc() {
        writeln!(w, "{}<ViewingDescription>{}</ViewingDescription>", indent(depth), escape(viewing))?;
    }
    Ok(())
}

fn write_correction<W: Write>(
    w: &mut W,
    cc: &ColorCorrection,
    depth: usize,
    xmlns: bool,
) -> IoResult<()> {
    let pad = indent(depth);
    let inner = indent(depth + 1);
    let leaf = indent(depth + 2);

    if xmlns {
        writeln!(w, r#"{pad}<ColorCorrection id="{}" xmlns="{NAMESPACE}">"#, escape(cc.id()))?;
    } else {
        writeln!(w, r#"{pad}<ColorCorrection id="{}">"#, escape(cc.id()))?;
    }
    write_desc(w, cc.desc(), depth + 1)?;
    write_color_space(w, cc.color_space(), depth + 1)?;

    writeln!(w, "{inner}<SOPNode>")?;
    write_desc(w, cc.sop().desc(), depth + 2)?;
    writeln!(w, "{leaf}<Slope>{}</Slope>", triplet(cc.slope()))?;
    writeln!(w, "{leaf}<Offset>{}</Offset>", triplet(cc.offset()))?;
    writeln!(w, "{leaf}<Power>{}</Power>", triplet(cc.power()))?;
    writeln!(w, "{inner}</SOPNode>")?;

    writeln!(w, "{inner}<SatNode>")?;
    write_desc(w, cc.sat_node().desc(), depth + 2)?;
    writeln!(w, "{leaf}<Saturation>{}</Saturation>", cc.sat())?;
    writeln!(w, "{inner}</SatNode>")?;

    writeln!(w, "{pad}</ColorCorrection>")?;
    Ok(())
}

fn lookup(ctx: &Context, handle: Handle<ColorCorrection>) -> IoResult<&ColorCorrection> {
    Ok(ctx.correction(handle).ok_or(CdlError::StaleHandle)?)
}

fn create(path: &Path) -> IoResult<BufWriter<File>> {
    debug!(path = %path.display(), "writing");
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes one correction to a `.cc` file.
pub fn write_cc(ctx: &Context, handle: Handle<ColorCorrection>, path: &Path) -> IoResult<()> {
    let mut file = create(path)?;
    write_cc_to(&mut file, ctx, handle)?;
    file.flush()?;
    Ok(())
}

/// Writes one correction as a `<ColorCorrection>` document.
pub fn write_cc_to<W: Write>(w: &mut W, ctx: &Context, handle: Handle<ColorCorrection>) -> IoResult<()> {
    writeln!(w, "{XML_DECL}")?;
    write_correction(w, lookup(ctx, handle)?, 0, true)
}

/// Writes a collection to a `.ccc` file.
pub fn write_ccc(ctx: &Context, col: &ColorCollection, path: &Path) -> IoResult<()> {
    let mut file = create(path)?;
    write_ccc_to(&mut file, ctx, col)?;
    file.flush()?;
    Ok(())
}

/// Writes every correction of `col`, including those inside decisions, as a
/// `<ColorCorrectionCollection>`.
pub fn write_ccc_to<W: Write>(w: &mut W, ctx: &Context, col: &ColorCollection) -> IoResult<()> {
    writeln!(w, "{XML_DECL}")?;
    writeln!(w, r#"<ColorCorrectionCollection xmlns="{NAMESPACE}">"#)?;
    write_desc(w, col.desc(), 1)?;
    write_color_space(w, col.color_space(), 1)?;
    for handle in col.all_corrections() {
        write_correction(w, lookup(ctx, handle)?, 1, false)?;
    }
    writeln!(w, "</ColorCorrectionCollection>")?;
    Ok(())
}

/// Writes a collection to a `.cdl` file.
pub fn write_cdl(ctx: &Context, col: &ColorCollection, path: &Path) -> IoResult<()> {
    let mut file = create(path)?;
    write_cdl_to(&mut file, ctx, col)?;
    file.flush()?;
    Ok(())
}

/// Writes `col` as a `<ColorDecisionList>`.
///
/// Bare corrections not used by any decision get a decision of their own,
/// without a media reference.
pub fn write_cdl_to<W: Write>(w: &mut W, ctx: &Context, col: &ColorCollection) -> IoResult<()> {
    writeln!(w, "{XML_DECL}")?;
    writeln!(w, r#"<ColorDecisionList xmlns="{NAMESPACE}">"#)?;
    write_desc(w, col.desc(), 1)?;
    write_color_space(w, col.color_space(), 1)?;

    for decision in col.decisions() {
        writeln!(w, "{}<ColorDecision>", indent(1))?;
        write_desc(w, decision.desc(), 2)?;
        write_color_space(w, decision.color_space(), 2)?;
        if let Some(mr) = decision.media_ref().and_then(|h| ctx.media_ref(h)) {
            writeln!(w, r#"{}<MediaRef ref="{}"/>"#, indent(2), escape(mr.uri()))?;
        }
        write_correction(w, lookup(ctx, decision.correction())?, 2, false)?;
        writeln!(w, "{}</ColorDecision>", indent(1))?;
    }

    let in_decisions: Vec<_> = col.decisions().iter().map(|d| d.correction()).collect();
    for handle in col.corrections() {
        if in_decisions.contains(handle) {
            continue;
        }
        writeln!(w, "{}<ColorDecision>", indent(1))?;
        write_correction(w, lookup(ctx, *handle)?, 2, false)?;
        writeln!(w, "{}</ColorDecision>", indent(1))?;
    }

    writeln!(w, "</ColorDecisionList>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::tests::{CCC_SAMPLE, CC_SAMPLE, CDL_SAMPLE};
    use crate::{parse_cc, parse_ccc, parse_cdl};
    use cdl_core::{CollectionKind, ValuePolicy};
    use std::io::Cursor;

    fn to_string<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> IoResult<()>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_cc_output() {
        let mut ctx = Context::default();
        let h = ctx.new_correction("sh010", None).unwrap();
        let cc = ctx.correction_mut(h).unwrap();
        cc.set_slope([1.1, 1.2, 1.3], ValuePolicy::Strict).unwrap();
        cc.set_sat(0.8, ValuePolicy::Strict).unwrap();
        cc.desc_mut().push("grade <v2> & notes");

        let xml = to_string(|w| write_cc_to(w, &ctx, h));
        assert!(xml.starts_with(XML_DECL));
        assert!(xml.contains(r#"<ColorCorrection id="sh010" xmlns="urn:ASC:CDL:v1.01">"#));
        assert!(xml.contains("<Slope>1.1 1.2 1.3</Slope>"));
        assert!(xml.contains("<Offset>0 0 0</Offset>"));
        assert!(xml.contains("<Saturation>0.8</Saturation>"));
        assert!(xml.contains("<Description>grade &lt;v2&gt; &amp; notes</Description>"));
        assert!(!xml.contains("InputDescription"));
    }

    #[test]
    fn test_cc_preserved_through_write() {
        let mut ctx = Context::default();
        let h = parse_cc(&mut ctx, Cursor::new(CC_SAMPLE), None).unwrap();
        let xml = to_string(|w| write_cc_to(w, &ctx, h));

        let mut other = Context::default();
        let h2 = parse_cc(&mut other, Cursor::new(xml), None).unwrap();
        let (a, b) = (ctx.correction(h).unwrap(), other.correction(h2).unwrap());
        assert_eq!(a.id(), b.id());
        assert_eq!(a.slope(), b.slope());
        assert_eq!(a.offset(), b.offset());
        assert_eq!(a.power(), b.power());
        assert_eq!(a.sat(), b.sat());
        assert_eq!(a.desc(), b.desc());
        assert_eq!(a.color_space(), b.color_space());
        assert_eq!(a.sop().desc(), b.sop().desc());
    }

    #[test]
    fn test_ccc_from_cdl() {
        let mut ctx = Context::default();
        let col = parse_cdl(&mut ctx, Cursor::new(CDL_SAMPLE), None).unwrap();
        let xml = to_string(|w| write_ccc_to(w, &ctx, &col));
        assert!(xml.contains("<ColorCorrectionCollection"));
        assert!(!xml.contains("MediaRef"));

        let mut other = Context::default();
        let col2 = parse_ccc(&mut other, Cursor::new(xml), None).unwrap();
        assert_eq!(col2.corrections().len(), 1);
        assert_eq!(other.correction(col2.corrections()[0]).unwrap().id(), "shot001");
    }

    #[test]
    fn test_cdl_from_ccc_wraps_corrections() {
        let mut ctx = Context::default();
        let mut col = parse_ccc(&mut ctx, Cursor::new(CCC_SAMPLE), None).unwrap();
        col.set_kind(CollectionKind::Cdl);
        let xml = to_string(|w| write_cdl_to(w, &ctx, &col));
        assert_eq!(xml.matches("<ColorDecision>").count(), 2);
        assert!(xml.contains("<Description>Reel one</Description>"));

        let mut other = Context::default();
        let col2 = parse_cdl(&mut other, Cursor::new(xml), None).unwrap();
        assert_eq!(col2.decisions().len(), 2);
        assert_eq!(col2.desc().as_slice(), ["Reel one"]);
    }

    #[test]
    fn test_cdl_keeps_media_ref() {
        let mut ctx = Context::default();
        let col = parse_cdl(&mut ctx, Cursor::new(CDL_SAMPLE), None).unwrap();
        let xml = to_string(|w| write_cdl_to(w, &ctx, &col));
        assert!(xml.contains(r#"<MediaRef ref="some/path.0001.dpx"/>"#));
        assert!(xml.contains("<Description>first decision</Description>"));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = Context::default();
        let col = parse_ccc(&mut ctx, Cursor::new(CCC_SAMPLE), None).unwrap();

        let path = dir.path().join("out.ccc");
        write_ccc(&ctx, &col, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("<ColorCorrection ").count(), 2);

        let path = dir.path().join("cc0001.cc");
        write_cc(&ctx, col.corrections()[0], &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains(r#"id="cc0001""#));
    }
}
