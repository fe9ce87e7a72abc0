/*!
 * Notebook (.ipynb) handling
 *
 * A notebook is kept as the raw JSON value it was parsed from. Formatting
 * reads it through the typed model in [`model`] and falls back to a pretty
 * printed dump of the raw value when the structure does not fit.
 */

mod format;
mod images;
pub mod model;

pub use format::{format_notebook, EMBEDDED_IMAGE_PLACEHOLDER};
pub use images::{image_size_impact, line_has_image, source_has_image};

use serde_json::Value;

use crate::settings::{read_flag, SettingsStore, NOTEBOOK_IMAGES_KEY, NOTEBOOK_OUTPUTS_KEY};

/// Inclusion policy applied when flattening notebooks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotebookOptions {
    /// Render code cell outputs
    pub include_outputs: bool,
    /// Keep markdown images and tag image outputs
    pub include_images: bool,
}

impl NotebookOptions {
    pub fn new(include_outputs: bool, include_images: bool) -> Self {
        Self {
            include_outputs,
            include_images,
        }
    }

    /// Read both flags from a settings store, defaulting to off
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            include_outputs: read_flag(store, NOTEBOOK_OUTPUTS_KEY),
            include_images: read_flag(store, NOTEBOOK_IMAGES_KEY),
        }
    }

    /// Write both flags to a settings store
    pub fn save(&self, store: &dyn SettingsStore) -> crate::error::Result<()> {
        store.set(NOTEBOOK_OUTPUTS_KEY, &self.include_outputs.to_string())?;
        store.set(NOTEBOOK_IMAGES_KEY, &self.include_images.to_string())
    }
}

/// Number of cells per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub code: usize,
    pub markdown: usize,
    pub raw: usize,
    /// Code cells with at least one output
    pub code_with_output: usize,
}

/// A parsed notebook document
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookDocument {
    value: Value,
}

impl NotebookDocument {
    /// Parse notebook JSON
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(|value| Self { value })
    }

    /// Wrap an already parsed JSON value
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Raw JSON value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Flatten to text under the given inclusion policy
    pub fn format(&self, options: NotebookOptions) -> String {
        format_notebook(self, options)
    }

    /// Percentage of the serialized size taken by image payloads
    pub fn image_size_impact(&self) -> u8 {
        image_size_impact(self)
    }

    /// Count cells by kind, skipping anything that is not a known cell
    pub fn cell_counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        let Some(cells) = self.value.get("cells").and_then(Value::as_array) else {
            return counts;
        };

        for cell in cells {
            match cell.get("cell_type").and_then(Value::as_str) {
                Some("code") => {
                    counts.code += 1;
                    let has_output = cell
                        .get("outputs")
                        .and_then(Value::as_array)
                        .is_some_and(|outputs| !outputs.is_empty());
                    if has_output {
                        counts.code_with_output += 1;
                    }
                }
                Some("markdown") => counts.markdown += 1,
                Some("raw") => counts.raw += 1,
                _ => {}
            }
        }
        counts
    }
}
