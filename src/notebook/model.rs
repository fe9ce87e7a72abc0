//! Typed view of the notebook JSON subset the formatter understands

use std::borrow::Cow;

use serde::Deserialize;
use strum::Display;

/// Text stored either as one string or as fragments to concatenate
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Single(String),
    Fragments(Vec<String>),
}

impl MultilineText {
    /// Concatenate the fragments with no separator
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Single(text) => Cow::Borrowed(text),
            Self::Fragments(parts) => Cow::Owned(parts.concat()),
        }
    }

    /// Whether the value counts as present: a non-empty string or any list
    pub fn is_present(&self) -> bool {
        match self {
            Self::Single(text) => !text.is_empty(),
            Self::Fragments(_) => true,
        }
    }
}

/// A notebook document
#[derive(Debug, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub metadata: Option<NotebookMetadata>,
    #[serde(default)]
    pub cells: Option<Vec<Cell>>,
}

#[derive(Debug, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub kernelspec: Option<KernelSpec>,
    #[serde(default)]
    pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Deserialize)]
pub struct KernelSpec {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// Kind of a cell, displayed uppercase in cell headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CellKind {
    Code,
    Markdown,
    Raw,
}

/// A notebook cell
#[derive(Debug, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        #[serde(default)]
        source: Option<MultilineText>,
        #[serde(default)]
        outputs: Option<Vec<Output>>,
    },
    Markdown {
        #[serde(default)]
        source: Option<MultilineText>,
    },
    Raw {
        #[serde(default)]
        source: Option<MultilineText>,
    },
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Code { .. } => CellKind::Code,
            Self::Markdown { .. } => CellKind::Markdown,
            Self::Raw { .. } => CellKind::Raw,
        }
    }
}

/// An output attached to a code cell
#[derive(Debug, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        text: MultilineText,
    },
    ExecuteResult {
        #[serde(default)]
        data: Option<MimeBundle>,
    },
    DisplayData {
        #[serde(default)]
        data: Option<MimeBundle>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Option<Vec<String>>,
    },
    /// Output types the formatter does not render
    #[serde(other)]
    Unknown,
}

/// Image mime types, in the order they are looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ImageKind {
    #[strum(serialize = "PNG")]
    Png,
    #[strum(serialize = "JPEG")]
    Jpeg,
    #[strum(serialize = "SVG")]
    Svg,
}

impl ImageKind {
    pub const ALL: [ImageKind; 3] = [ImageKind::Png, ImageKind::Jpeg, ImageKind::Svg];

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Mime-keyed payload of a result or display output
#[derive(Debug, Default, Deserialize)]
pub struct MimeBundle {
    #[serde(rename = "text/plain", default)]
    pub text_plain: Option<MultilineText>,
    #[serde(rename = "image/png", default)]
    pub image_png: Option<MultilineText>,
    #[serde(rename = "image/jpeg", default)]
    pub image_jpeg: Option<MultilineText>,
    #[serde(rename = "image/svg+xml", default)]
    pub image_svg: Option<MultilineText>,
}

impl MimeBundle {
    /// First image representation present, png before jpeg before svg
    pub fn image_kind(&self) -> Option<ImageKind> {
        ImageKind::ALL
            .into_iter()
            .find(|kind| self.image(*kind).is_some_and(MultilineText::is_present))
    }

    fn image(&self, kind: ImageKind) -> Option<&MultilineText> {
        match kind {
            ImageKind::Png => self.image_png.as_ref(),
            ImageKind::Jpeg => self.image_jpeg.as_ref(),
            ImageKind::Svg => self.image_svg.as_ref(),
        }
    }
}
