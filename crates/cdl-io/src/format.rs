//! CDL document formats and extension detection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::{IoError, IoResult};

/// One of the three ASC XML documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `.cc`: a single `<ColorCorrection>`.
    Cc,
    /// `.ccc`: a `<ColorCorrectionCollection>`.
    Ccc,
    /// `.cdl`: a `<ColorDecisionList>`.
    Cdl,
}

impl Format {
    /// All formats, in output order.
    pub const ALL: [Format; 3] = [Format::Cc, Format::Ccc, Format::Cdl];

    /// Detects the format from a file extension (case-insensitive).
    ///
    /// ```rust
    /// use cdl_io::Format;
    /// use std::path::Path;
    ///
    /// assert_eq!(Format::detect(Path::new("grades/A001.CDL")), Some(Format::Cdl));
    /// assert_eq!(Format::detect(Path::new("notes.txt")), None);
    /// ```
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        ext.parse().ok()
    }

    /// Like [`detect`](Self::detect), failing with [`IoError::UnknownFormat`].
    pub fn detect_or_err(path: &Path) -> IoResult<Self> {
        Self::detect(path).ok_or_else(|| {
            let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
            IoError::UnknownFormat(ext.unwrap_or_else(|| path.display().to_string()))
        })
    }

    /// File extension and format tag.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Cc => "cc",
            Format::Ccc => "ccc",
            Format::Cdl => "cdl",
        }
    }

    /// Root element name.
    pub fn root_element(self) -> &'static str {
        match self {
            Format::Cc => "ColorCorrection",
            Format::Ccc => "ColorCorrectionCollection",
            Format::Cdl => "ColorDecisionList",
        }
    }
}

impl FromStr for Format {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "cc" => Ok(Format::Cc),
            "ccc" => Ok(Format::Ccc),
            "cdl" => Ok(Format::Cdl),
            _ => Err(IoError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
