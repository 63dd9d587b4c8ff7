//! Readers for `.cc`, `.ccc` and `.cdl` documents.
//!
//! A document is first collected into plain text fields, then turned into
//! [`cdl_core`] entities inside a [`Context`]. Every value goes through the
//! core setters, so the context's [`ValuePolicy`] decides what happens to
//! out-of-domain numbers.
//!
//! Under the lenient policy an entity that still fails (an id collision, a
//! non-numeric slope, a decision without a correction) is logged and left
//! out; the rest of the document is read. Under the strict policy the first
//! failure aborts the read.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cdl_core::{
    CdlError, CollectionKind, ColorCollection, ColorCorrection, ColorDecision, ColorSpaceDesc,
    Context, Descriptions, Handle, ValuePolicy,
};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::{Format, IoError, IoResult};

// ============================================================================
// Raw document
// ============================================================================

#[derive(Debug, Default)]
struct RawMeta {
    desc: Vec<String>,
    input_desc: Option<String>,
    viewing_desc: Option<String>,
}

#[derive(Debug, Default)]
struct RawCorrection {
    id: String,
    meta: RawMeta,
    sop_desc: Vec<String>,
    sat_desc: Vec<String>,
    slope: Option<String>,
    offset: Option<String>,
    power: Option<String>,
    sat: Option<String>,
}

#[derive(Debug, Default)]
struct RawDecision {
    meta: RawMeta,
    media_ref: Option<String>,
    correction: Option<RawCorrection>,
}

#[derive(Debug, Default)]
struct RawDocument {
    root: String,
    meta: RawMeta,
    corrections: Vec<RawCorrection>,
    decisions: Vec<RawDecision>,
}

/// Element currently being filled.
#[derive(Default)]
struct Cursor {
    correction: Option<RawCorrection>,
    decision: Option<RawDecision>,
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).into_owned();
            match unescape(&raw) {
                Ok(Cow::Owned(value)) => value,
                _ => raw,
            }
        })
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(value) = resolve_predefined_entity(name) {
        return Some(value.to_string());
    }
    let code = name.strip_prefix('#')?;
    let code = match code.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}

fn open_element(name: &str, e: &BytesStart, doc: &mut RawDocument, cur: &mut Cursor) {
    if doc.root.is_empty() {
        doc.root = name.to_string();
    }
    match name {
        "ColorCorrection" => {
            cur.correction = Some(RawCorrection {
                id: get_attr(e, b"id").unwrap_or_default(),
                ..Default::default()
            });
        }
        "ColorDecision" => cur.decision = Some(RawDecision::default()),
        "MediaRef" => {
            if let Some(decision) = cur.decision.as_mut() {
                decision.media_ref = get_attr(e, b"ref");
            }
        }
        _ => {}
    }
}

fn meta_for<'a>(parent: &str, doc: &'a mut RawDocument, cur: &'a mut Cursor) -> Option<&'a mut RawMeta> {
    match parent {
        "ColorCorrection" => cur.correction.as_mut().map(|cc| &mut cc.meta),
        "ColorDecision" => cur.decision.as_mut().map(|d| &mut d.meta),
        "ColorCorrectionCollection" | "ColorDecisionList" => Some(&mut doc.meta),
        _ => None,
    }
}

fn close_element(name: &str, parent: &str, text: &str, doc: &mut RawDocument, cur: &mut Cursor) {
    let value = text.trim().to_string();
    match name {
        "Slope" | "Offset" | "Power" | "Saturation" => {
            if let Some(cc) = cur.correction.as_mut() {
                let slot = match name {
                    "Slope" => &mut cc.slope,
                    "Offset" => &mut cc.offset,
                    "Power" => &mut cc.power,
                    _ => &mut cc.sat,
                };
                *slot = Some(value);
            }
        }
        "Description" => match parent {
            "SOPNode" | "SatNode" => {
                if let Some(cc) = cur.correction.as_mut() {
                    let list = if parent == "SOPNode" { &mut cc.sop_desc } else { &mut cc.sat_desc };
                    list.push(value);
                }
            }
            _ => {
                if let Some(meta) = meta_for(parent, doc, cur) {
                    meta.desc.push(value);
                }
            }
        },
        "InputDescription" => {
            if let Some(meta) = meta_for(parent, doc, cur) {
                meta.input_desc = Some(value);
            }
        }
        "ViewingDescription" => {
            if let Some(meta) = meta_for(parent, doc, cur) {
                meta.viewing_desc = Some(value);
            }
        }
        "ColorCorrection" => {
            if let Some(cc) = cur.correction.take() {
                match cur.decision.as_mut() {
                    Some(decision) => decision.correction = Some(cc),
                    None => doc.corrections.push(cc),
                }
            }
        }
        "ColorDecision" => {
            if let Some(decision) = cur.decision.take() {
                doc.decisions.push(decision);
            }
        }
        _ => {}
    }
}

fn parse_document<R: BufRead>(reader: R) -> IoResult<RawDocument> {
    let mut xml = Reader::from_reader(reader);

    let mut buf = Vec::new();
    let mut doc = RawDocument::default();
    let mut cur = Cursor::default();
    let mut text = String::new();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(&e);
                open_element(&name, &e, &mut doc, &mut cur);
                stack.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                open_element(&name, &e, &mut doc, &mut cur);
                let parent = stack.last().map(String::as_str).unwrap_or_default();
                close_element(&name, parent, "", &mut doc, &mut cur);
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    return Err(IoError::parse("unbalanced closing tag"));
                };
                let parent = stack.last().map(String::as_str).unwrap_or_default();
                close_element(&name, parent, &text, &mut doc, &mut cur);
                text.clear();
            }
            Event::Text(e) => text.push_str(&e.decode().unwrap_or_default()),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                if let Some(value) = resolve_reference(&e.decode().unwrap_or_default()) {
                    text.push_str(&value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn expect_root(doc: &RawDocument, format: Format) -> IoResult<()> {
    if doc.root != format.root_element() {
        return Err(IoError::WrongDocument {
            expected: format.root_element(),
            found: doc.root.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// Building entities
// ============================================================================

fn fill_desc(desc: &mut Descriptions, entries: &[String]) {
    desc.replace(entries.iter().cloned());
}

fn fill_color_space(cs: &mut ColorSpaceDesc, meta: &RawMeta) {
    cs.set_input_desc(meta.input_desc.as_deref());
    cs.set_viewing_desc(meta.viewing_desc.as_deref());
}

fn fill_correction(
    ctx: &mut Context,
    handle: Handle<ColorCorrection>,
    raw: &RawCorrection,
) -> IoResult<()> {
    let policy = ctx.policy();
    let cc = ctx.correction_mut(handle).ok_or(CdlError::StaleHandle)?;
    if let Some(slope) = &raw.slope {
        cc.set_slope(slope.as_str(), policy)?;
    }
    if let Some(offset) = &raw.offset {
        cc.set_offset(offset.as_str(), policy)?;
    }
    if let Some(power) = &raw.power {
        cc.set_power(power.as_str(), policy)?;
    }
    if let Some(sat) = &raw.sat {
        cc.set_sat(sat.as_str(), policy)?;
    }
    fill_desc(cc.desc_mut(), &raw.meta.desc);
    fill_color_space(cc.color_space_mut(), &raw.meta);
    fill_desc(cc.sop_mut().desc_mut(), &raw.sop_desc);
    fill_desc(cc.sat_node_mut().desc_mut(), &raw.sat_desc);
    Ok(())
}

/// Registers a correction; nothing stays registered if a value is rejected.
fn build_correction(
    ctx: &mut Context,
    raw: &RawCorrection,
    file_in: Option<&Path>,
) -> IoResult<Handle<ColorCorrection>> {
    let handle = ctx.new_correction(&raw.id, file_in)?;
    if let Err(err) = fill_correction(ctx, handle, raw) {
        ctx.remove_correction(handle);
        return Err(err);
    }
    Ok(handle)
}

fn build_decision(
    ctx: &mut Context,
    raw: &RawDecision,
    file_in: Option<&Path>,
) -> IoResult<ColorDecision> {
    let raw_cc = raw
        .correction
        .as_ref()
        .ok_or_else(|| IoError::parse("ColorDecision has no ColorCorrection"))?;
    let handle = build_correction(ctx, raw_cc, file_in)?;

    let mut decision = ctx.new_decision(handle)?;
    fill_desc(decision.desc_mut(), &raw.meta.desc);
    fill_color_space(decision.color_space_mut(), &raw.meta);
    if let Some(uri) = &raw.media_ref {
        if let Err(err) = ctx.attach_media_ref(&mut decision, uri) {
            ctx.remove_correction(handle);
            return Err(err.into());
        }
    }
    Ok(decision)
}

/// Turns a recoverable failure into a skip under the lenient policy.
fn recover<T>(policy: ValuePolicy, result: IoResult<T>, what: &str) -> IoResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if !policy.is_strict() && err.is_recoverable() => {
            warn!(error = %err, "skipping {what}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn build_collection(
    ctx: &mut Context,
    doc: &RawDocument,
    kind: CollectionKind,
    file_in: Option<&Path>,
) -> IoResult<ColorCollection> {
    let mut col = ColorCollection::new(kind, file_in)?;
    fill_desc(col.desc_mut(), &doc.meta.desc);
    fill_color_space(col.color_space_mut(), &doc.meta);

    for raw in &doc.corrections {
        let result = build_correction(ctx, raw, file_in);
        if let Some(handle) = recover(ctx.policy(), result, "color correction")? {
            col.push_correction(handle);
        }
    }
    for raw in &doc.decisions {
        let result = build_decision(ctx, raw, file_in);
        if let Some(decision) = recover(ctx.policy(), result, "color decision")? {
            col.push_decision(decision);
        }
    }

    debug!(
        corrections = col.corrections().len(),
        decisions = col.decisions().len(),
        "built collection"
    );
    Ok(col)
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a `.cc` file into `ctx`.
pub fn read_cc(ctx: &mut Context, path: &Path) -> IoResult<Handle<ColorCorrection>> {
    let file = File::open(path)?;
    parse_cc(ctx, BufReader::new(file), Some(path))
}

/// Parses a single `<ColorCorrection>` document.
///
/// `file_in` is recorded on the correction; it is not opened.
pub fn parse_cc<R: BufRead>(
    ctx: &mut Context,
    reader: R,
    file_in: Option<&Path>,
) -> IoResult<Handle<ColorCorrection>> {
    let doc = parse_document(reader)?;
    expect_root(&doc, Format::Cc)?;
    let raw = doc
        .corrections
        .first()
        .ok_or_else(|| IoError::parse("empty ColorCorrection document"))?;
    build_correction(ctx, raw, file_in)
}

/// Reads a `.ccc` file into `ctx`.
pub fn read_ccc(ctx: &mut Context, path: &Path) -> IoResult<ColorCollection> {
    let file = File::open(path)?;
    parse_ccc(ctx, BufReader::new(file), Some(path))
}

/// Parses a `<ColorCorrectionCollection>` document.
pub fn parse_ccc<R: BufRead>(
    ctx: &mut Context,
    reader: R,
    file_in: Option<&Path>,
) -> IoResult<ColorCollection> {
    let doc = parse_document(reader)?;
    expect_root(&doc, Format::Ccc)?;
    build_collection(ctx, &doc, CollectionKind::Ccc, file_in)
}

/// Reads a `.cdl` file into `ctx`.
pub fn read_cdl(ctx: &mut Context, path: &Path) -> IoResult<ColorCollection> {
    let file = File::open(path)?;
    parse_cdl(ctx, BufReader::new(file), Some(path))
}

/// Parses a `<ColorDecisionList>` document.
pub fn parse_cdl<R: BufRead>(
    ctx: &mut Context,
    reader: R,
    file_in: Option<&Path>,
) -> IoResult<ColorCollection> {
    let doc = parse_document(reader)?;
    expect_root(&doc, Format::Cdl)?;
    build_collection(ctx, &doc, CollectionKind::Cdl, file_in)
}

/// Reads any CDL file, detecting the format from its extension.
///
/// A `.cc` file comes back as a one-correction `.ccc` collection.
pub fn read_any(ctx: &mut Context, path: &Path) -> IoResult<ColorCollection> {
    let format = Format::detect_or_err(path)?;
    debug!(path = %path.display(), %format, "reading");
    match format {
        Format::Cc => {
            let handle = read_cc(ctx, path)?;
            let mut col = ColorCollection::new(CollectionKind::Ccc, Some(path))?;
            col.push_correction(handle);
            Ok(col)
        }
        Format::Ccc => read_ccc(ctx, path),
        Format::Cdl => read_cdl(ctx, path),
    }
}
