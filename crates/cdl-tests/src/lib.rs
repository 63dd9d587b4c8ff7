//! Integration tests for the cdl crates.
//!
//! These run the readers, writers and sequence detection against real
//! files in temporary directories.

#[cfg(test)]
mod tests {
    use cdl_core::{CdlError, Config, Context, ErrorKind, ValuePolicy};
    use cdl_io::IoError;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch_frames(dir: &Path, prefix: &str, frames: std::ops::Range<u32>, ext: &str) {
        for frame in frames {
            fs::write(dir.join(format!("{prefix}.{frame:04}.{ext}")), b"").unwrap();
        }
    }

    fn cdl_with_ref(uri: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ColorDecisionList xmlns="urn:ASC:CDL:v1.01">
  <ColorDecision>
    <MediaRef ref="{uri}"/>
    <ColorCorrection id="sh010">
      <SOPNode>
        <Slope>1.2 1.1 1.0</Slope>
        <Offset>0.01 0 -0.01</Offset>
        <Power>1 1 1</Power>
      </SOPNode>
      <SatNode><Saturation>0.9</Saturation></SatNode>
    </ColorCorrection>
  </ColorDecision>
</ColorDecisionList>"#
        )
    }

    /// Media reference pointing at a directory of frames
    #[test]
    fn test_media_ref_scans_real_directory() {
        let dir = tempdir().unwrap();
        let plates = dir.path().join("plates");
        fs::create_dir(&plates).unwrap();
        touch_frames(&plates, "sh010_bg", 1001..1006, "exr");
        touch_frames(&plates, "sh010_fg", 1..3, "exr");
        fs::write(plates.join("notes.txt"), b"").unwrap();
        fs::create_dir(plates.join("proxies")).unwrap();

        let cdl = dir.path().join("grade.cdl");
        fs::write(&cdl, cdl_with_ref(&plates.display().to_string())).unwrap();

        let mut ctx = Context::default();
        let col = cdl_io::read_cdl(&mut ctx, &cdl).unwrap();
        let h = col.decisions()[0].media_ref().unwrap();

        assert!(ctx.media_ref(h).unwrap().is_dir());
        assert!(ctx.is_seq(h).unwrap());
        assert_eq!(ctx.seq(h).unwrap(), Some("sh010_bg.####.exr"));
        assert_eq!(ctx.sequences(h).unwrap(), ["sh010_bg.####.exr", "sh010_fg.####.exr"]);
    }

    /// Media reference naming one frame of a sequence
    #[test]
    fn test_media_ref_single_frame() {
        let dir = tempdir().unwrap();
        touch_frames(dir.path(), "plate", 1..4, "dpx");
        let frame = dir.path().join("plate.0002.dpx");

        let mut ctx = Context::default();
        let h = ctx.new_media_ref(&frame.display().to_string(), None).unwrap();

        let mr = ctx.media_ref(h).unwrap();
        assert!(mr.exists());
        assert!(mr.is_abs());
        assert!(!mr.is_dir());
        assert_eq!(mr.filename(), "plate.0002.dpx");
        assert_eq!(mr.cached_is_seq(), None);

        assert!(ctx.is_seq(h).unwrap());
        assert_eq!(ctx.seq(h).unwrap(), Some("plate.####.dpx"));
        assert_eq!(ctx.media_ref(h).unwrap().cached_is_seq(), Some(true));
    }

    #[test]
    fn test_directory_scan_disabled_by_config() {
        let dir = tempdir().unwrap();
        touch_frames(dir.path(), "plate", 1..4, "dpx");

        let config = Config::from_yaml_str("scan_directories: false\n").unwrap();
        let mut ctx = Context::from_config(&config);
        let h = ctx.new_media_ref(&dir.path().display().to_string(), None).unwrap();

        assert!(!ctx.is_seq(h).unwrap());
        assert!(ctx.sequences(h).unwrap().is_empty());
    }

    #[test]
    fn test_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cdl.yaml");
        fs::write(&path, "strict_errors: true\ndest_format: cc\n").unwrap();

        let config = Config::load(&path).unwrap();
        let ctx = Context::from_config(&config);
        assert!(ctx.strict_errors());
        assert_eq!(config.dest_format.as_deref(), Some("cc"));

        let err = Config::load(dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    /// cc -> cdl -> ccc through files on disk
    #[test]
    fn test_file_conversion_chain() {
        let dir = tempdir().unwrap();
        let cc_path = dir.path().join("sh010.cc");
        fs::write(
            &cc_path,
            r#"<ColorCorrection id="sh010">
  <Description>warm up</Description>
  <InputDescription>ACEScct</InputDescription>
  <SOPNode>
    <Slope>1.2 1.1 1.0</Slope>
    <Offset>0.01 0 -0.01</Offset>
    <Power>0.9 1 1.1</Power>
  </SOPNode>
  <SatNode><Saturation>1.1</Saturation></SatNode>
</ColorCorrection>"#,
        )
        .unwrap();

        let mut ctx = Context::default();
        let col = cdl_io::read_any(&mut ctx, &cc_path).unwrap();
        let cdl_path = dir.path().join("sh010.cdl");
        cdl_io::write_cdl(&ctx, &col, &cdl_path).unwrap();

        let mut ctx2 = Context::default();
        let col2 = cdl_io::read_cdl(&mut ctx2, &cdl_path).unwrap();
        assert_eq!(col2.decisions().len(), 1);
        let ccc_path = dir.path().join("sh010.ccc");
        cdl_io::write_ccc(&ctx2, &col2, &ccc_path).unwrap();

        let mut ctx3 = Context::default();
        let col3 = cdl_io::read_ccc(&mut ctx3, &ccc_path).unwrap();
        let cc = ctx3.correction(col3.corrections()[0]).unwrap();
        assert_eq!(cc.id(), "sh010");
        assert_eq!(cc.slope(), [1.2, 1.1, 1.0]);
        assert_eq!(cc.offset(), [0.01, 0.0, -0.01]);
        assert_eq!(cc.power(), [0.9, 1.0, 1.1]);
        assert_eq!(cc.sat(), 1.1);
        assert_eq!(cc.desc().as_slice(), ["warm up"]);
        assert_eq!(cc.input_desc(), Some("ACEScct"));
        assert_eq!(cc.file_in(), Some(ccc_path.as_path()));
    }

    #[test]
    fn test_ids_collide_across_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.cc");
        let b = dir.path().join("b.cc");
        let doc = r#"<ColorCorrection id="same"><SatNode><Saturation>1</Saturation></SatNode></ColorCorrection>"#;
        fs::write(&a, doc).unwrap();
        fs::write(&b, doc).unwrap();

        let mut ctx = Context::new(ValuePolicy::Strict);
        cdl_io::read_cc(&mut ctx, &a).unwrap();
        let err = cdl_io::read_cc(&mut ctx, &b).unwrap_err();
        assert!(matches!(err, IoError::Cdl(CdlError::DuplicateId { .. })));

        ctx.reset();
        assert!(cdl_io::read_cc(&mut ctx, &b).is_ok());
    }

    #[test]
    fn test_lenient_read_clamps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.ccc");
        fs::write(
            &path,
            r#"<ColorCorrectionCollection>
  <ColorCorrection id="neg">
    <SOPNode><Slope>-1 1 1</Slope></SOPNode>
    <SatNode><Saturation>-0.5</Saturation></SatNode>
  </ColorCorrection>
</ColorCorrectionCollection>"#,
        )
        .unwrap();

        let mut lenient = Context::new(ValuePolicy::Lenient);
        let col = cdl_io::read_ccc(&mut lenient, &path).unwrap();
        let cc = lenient.correction(col.corrections()[0]).unwrap();
        assert_eq!(cc.slope(), [0.0, 1.0, 1.0]);
        assert_eq!(cc.sat(), 0.0);

        let mut strict = Context::new(ValuePolicy::Strict);
        let err = cdl_io::read_ccc(&mut strict, &path).unwrap_err();
        assert!(matches!(err, IoError::Cdl(ref e) if e.is_value_error()));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grade.edl");
        fs::write(&path, "").unwrap();
        let mut ctx = Context::default();
        assert!(matches!(
            cdl_io::read_any(&mut ctx, &path),
            Err(IoError::UnknownFormat(_))
        ));
    }
}
