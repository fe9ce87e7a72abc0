//! Flattening a notebook into plain text

use serde::Deserialize;
use tracing::debug;

use super::images::{line_has_image, source_has_image};
use super::model::{Cell, MimeBundle, MultilineText, Notebook, NotebookMetadata, Output};
use super::{NotebookDocument, NotebookOptions};

/// Line substituted for markdown lines carrying an image
pub const EMBEDDED_IMAGE_PLACEHOLDER: &str = "# [Embedded image removed]";

/// Flatten a notebook into text
///
/// The output is a pure function of the document and options. If the
/// document does not match the notebook structure, the raw JSON is returned
/// pretty printed instead.
pub fn format_notebook(document: &NotebookDocument, options: NotebookOptions) -> String {
    match Notebook::deserialize(document.value()) {
        Ok(notebook) => render(&notebook, options),
        Err(e) => {
            debug!(error = %e, "Notebook structure not recognized, using raw JSON");
            serde_json::to_string_pretty(document.value()).unwrap_or_default()
        }
    }
}

fn render(notebook: &Notebook, options: NotebookOptions) -> String {
    let mut out = String::new();

    if let Some(metadata) = &notebook.metadata {
        write_metadata(&mut out, metadata);
    }

    for (index, cell) in notebook.cells.iter().flatten().enumerate() {
        out.push_str(&format!("# Cell [{}] - {}\n", index + 1, cell.kind()));

        match cell {
            Cell::Code { source, outputs } => {
                if let Some(source) = source.as_ref().filter(|s| s.is_present()) {
                    push_line_terminated(&mut out, &source.joined());
                }
                if options.include_outputs {
                    if let Some(outputs) = outputs.as_ref().filter(|o| !o.is_empty()) {
                        write_outputs(&mut out, outputs, options);
                    }
                }
            }
            Cell::Markdown { source } => {
                if let Some(source) = source.as_ref().filter(|s| s.is_present()) {
                    write_markdown(&mut out, source, options);
                }
            }
            Cell::Raw { source } => {
                if let Some(source) = source.as_ref().filter(|s| s.is_present()) {
                    push_line_terminated(&mut out, &source.joined());
                }
            }
        }

        out.push('\n');
    }

    out
}

fn write_metadata(out: &mut String, metadata: &NotebookMetadata) {
    out.push_str("# Notebook Metadata\n");

    let kernel = metadata
        .kernelspec
        .as_ref()
        .and_then(|k| k.display_name.as_deref())
        .filter(|name| !name.is_empty());
    if let Some(kernel) = kernel {
        out.push_str(&format!("# Kernel: {}\n", kernel));
    }

    let language = metadata
        .language_info
        .as_ref()
        .and_then(|l| l.name.as_deref())
        .filter(|name| !name.is_empty());
    if let Some(language) = language {
        out.push_str(&format!("# Language: {}\n", language));
    }

    out.push('\n');
}

fn write_outputs(out: &mut String, outputs: &[Output], options: NotebookOptions) {
    out.push_str("\n# Output:\n");

    for output in outputs {
        match output {
            Output::Stream { text } => push_line_terminated(out, &text.joined()),
            Output::ExecuteResult { data } | Output::DisplayData { data } => {
                if let Some(data) = data {
                    write_mime_bundle(out, data, options);
                }
            }
            Output::Error {
                ename,
                evalue,
                traceback,
            } => {
                out.push_str(&format!("# Error: {}\n", ename));
                out.push_str(&format!("# {}\n", evalue));
                if let Some(traceback) = traceback {
                    out.push_str("# Traceback:\n# ");
                    out.push_str(&traceback.join("\n# "));
                    out.push('\n');
                }
            }
            Output::Unknown => {}
        }
    }
}

fn write_mime_bundle(out: &mut String, data: &MimeBundle, options: NotebookOptions) {
    if let Some(text) = data.text_plain.as_ref().filter(|t| t.is_present()) {
        push_line_terminated(out, &text.joined());
    }

    // Only a tag is ever written, never the image payload
    if options.include_images {
        if let Some(kind) = data.image_kind() {
            out.push_str(&format!("\n# [Image data: {}]\n", kind));
        }
    }
}

fn write_markdown(out: &mut String, source: &MultilineText, options: NotebookOptions) {
    let source = source.joined();

    if !options.include_images && source_has_image(&source) {
        let filtered: Vec<&str> = source
            .split('\n')
            .map(|line| {
                if line_has_image(line) {
                    EMBEDDED_IMAGE_PLACEHOLDER
                } else {
                    line
                }
            })
            .collect();
        out.push_str(&filtered.join("\n"));
    } else {
        out.push_str(&source);
    }

    if !source.ends_with('\n') {
        out.push('\n');
    }
}

fn push_line_terminated(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> NotebookDocument {
        NotebookDocument::from_value(value)
    }

    fn sample() -> NotebookDocument {
        doc(json!({
            "metadata": {
                "kernelspec": {"display_name": "Python 3", "name": "python3"},
                "language_info": {"name": "python"}
            },
            "cells": [
                {
                    "cell_type": "code",
                    "source": ["import math\n", "print(math.pi)"],
                    "outputs": [
                        {"output_type": "stream", "name": "stdout", "text": ["3.14159\n"]},
                        {
                            "output_type": "execute_result",
                            "data": {"text/plain": ["<Figure>"], "image/png": "iVBORw0KGgo="}
                        },
                        {
                            "output_type": "error",
                            "ename": "ValueError",
                            "evalue": "bad value",
                            "traceback": ["line 1", "line 2"]
                        }
                    ]
                },
                {"cell_type": "markdown", "source": "# Title\n![plot](http://x/p.png)\nText"},
                {"cell_type": "raw", "source": "raw text\n"}
            ]
        }))
    }

    #[test]
    fn test_format_without_outputs_or_images() {
        let text = format_notebook(&sample(), NotebookOptions::new(false, false));

        let expected = "# Notebook Metadata\n\
                        # Kernel: Python 3\n\
                        # Language: python\n\
                        \n\
                        # Cell [1] - CODE\n\
                        import math\n\
                        print(math.pi)\n\
                        \n\
                        # Cell [2] - MARKDOWN\n\
                        # Title\n\
                        # [Embedded image removed]\n\
                        Text\n\
                        \n\
                        # Cell [3] - RAW\n\
                        raw text\n\
                        \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_with_outputs_and_images() {
        let text = format_notebook(&sample(), NotebookOptions::new(true, true));

        assert!(text.contains(
            "print(math.pi)\n\n# Output:\n3.14159\n<Figure>\n\n# [Image data: PNG]\n"
        ));
        assert!(text.contains("# Error: ValueError\n# bad value\n# Traceback:\n# line 1\n# line 2\n"));
        assert!(text.contains("![plot](http://x/p.png)"));
        assert!(!text.contains(EMBEDDED_IMAGE_PLACEHOLDER));
        assert!(!text.contains("iVBORw0KGgo="), "image bytes never leak");
    }

    #[test]
    fn test_outputs_without_images_skip_image_tag() {
        let text = format_notebook(&sample(), NotebookOptions::new(true, false));
        assert!(text.contains("# Output:\n"));
        assert!(!text.contains("# [Image data"));
    }

    #[test]
    fn test_format_is_deterministic_and_pure() {
        let document = sample();
        let before = document.clone();
        let options = NotebookOptions::new(true, true);

        let first = format_notebook(&document, options);
        let second = format_notebook(&document, options);

        assert_eq!(first, second);
        assert_eq!(document, before);
    }

    #[test]
    fn test_markdown_only_image_lines_are_replaced() {
        let document = doc(json!({
            "cells": [{
                "cell_type": "markdown",
                "source": [
                    "intro\n",
                    "<img src=\"a.png\">\n",
                    "see data:IMAGE/png;base64,AAAA\n",
                    "outro"
                ]
            }]
        }));

        let text = format_notebook(&document, NotebookOptions::default());
        assert_eq!(
            text,
            "# Cell [1] - MARKDOWN\n\
             intro\n\
             # [Embedded image removed]\n\
             # [Embedded image removed]\n\
             outro\n\
             \n"
        );
    }

    #[test]
    fn test_no_metadata_no_header() {
        let document = doc(json!({"cells": [{"cell_type": "raw", "source": "r"}]}));
        let text = format_notebook(&document, NotebookOptions::default());
        assert_eq!(text, "# Cell [1] - RAW\nr\n\n");
    }

    #[test]
    fn test_empty_metadata_still_emits_header() {
        let document = doc(json!({"metadata": {}, "cells": []}));
        let text = format_notebook(&document, NotebookOptions::default());
        assert_eq!(text, "# Notebook Metadata\n\n");
    }

    #[test]
    fn test_structural_failure_falls_back_to_pretty_json() {
        let value = json!({"cells": [{"cell_type": "code", "source": 42}]});
        let document = doc(value.clone());

        let text = format_notebook(&document, NotebookOptions::default());
        assert_eq!(text, serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_stream_without_text_falls_back() {
        let value = json!({"cells": [{
            "cell_type": "code",
            "source": "x",
            "outputs": [{"output_type": "stream"}]
        }]});

        let text = format_notebook(&doc(value.clone()), NotebookOptions::new(true, false));
        assert_eq!(text, serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_error_without_traceback() {
        let document = doc(json!({"cells": [{
            "cell_type": "code",
            "source": "boom()\n",
            "outputs": [{"output_type": "error", "ename": "NameError", "evalue": "boom"}]
        }]}));

        let text = format_notebook(&document, NotebookOptions::new(true, false));
        assert_eq!(
            text,
            "# Cell [1] - CODE\nboom()\n\n# Output:\n# Error: NameError\n# boom\n\n"
        );
    }
}
