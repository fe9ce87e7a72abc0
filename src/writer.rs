/*!
 * Digest writers
 *
 * `text` is the flattened content exactly as aggregated. `xml` wraps the
 * folder tree and each relevant file in a small document.
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;
use clap::ValueEnum;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use strum::Display;

use crate::error::Result;
use crate::session::Session;
use crate::tree::TreeNode;

/// Output format of a digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Flattened `path:` blocks
    #[default]
    Text,
    /// Tree and contents as XML
    Xml,
}

/// Renders a session's digest in one format
#[derive(Debug, Clone, Copy)]
pub struct DigestWriter {
    format: OutputFormat,
}

impl DigestWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render the digest of `session`
    pub fn render(&self, session: &Session) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(session.combined_content()),
            OutputFormat::Xml => self.render_xml(session),
        }
    }

    /// Write rendered output to a file, or stdout when `output` is `None`
    pub fn write(&self, digest: &str, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(path)?);
                writer.write_all(digest.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(digest.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn render_xml(&self, session: &Session) -> Result<String> {
        let mut xml_writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut start_tag = BytesStart::new("digest");
        let timestamp = Local::now().to_rfc3339();
        start_tag.push_attribute(("timestamp", timestamp.as_str()));
        xml_writer.write_event(Event::Start(start_tag))?;

        xml_writer.write_event(Event::Start(BytesStart::new("tree")))?;
        for node in session.tree().children() {
            self.write_node(node, &mut xml_writer)?;
        }
        xml_writer.write_event(Event::End(BytesEnd::new("tree")))?;

        xml_writer.write_event(Event::Start(BytesStart::new("files")))?;
        for (path, content) in session.repository().relevant_entries() {
            let mut file_tag = BytesStart::new("file");
            file_tag.push_attribute(("path", path));
            xml_writer.write_event(Event::Start(file_tag))?;

            xml_writer.write_event(Event::Start(BytesStart::new("content")))?;
            xml_writer.write_event(Event::Text(BytesText::new(content)))?;
            xml_writer.write_event(Event::End(BytesEnd::new("content")))?;

            xml_writer.write_event(Event::End(BytesEnd::new("file")))?;
        }
        xml_writer.write_event(Event::End(BytesEnd::new("files")))?;

        xml_writer.write_event(Event::End(BytesEnd::new("digest")))?;

        Ok(String::from_utf8_lossy(&xml_writer.into_inner()).into_owned())
    }

    fn write_node<W: Write>(&self, node: &TreeNode, writer: &mut Writer<W>) -> io::Result<()> {
        match node {
            TreeNode::Folder(folder) => {
                let mut start_tag = BytesStart::new("folder");
                start_tag.push_attribute(("name", folder.name.as_str()));
                writer.write_event(Event::Start(start_tag))?;
                for child in &folder.children {
                    self.write_node(child, writer)?;
                }
                writer.write_event(Event::End(BytesEnd::new("folder")))?;
            }
            TreeNode::File(file) => {
                let mut tag = BytesStart::new("file");
                tag.push_attribute(("name", file.name.as_str()));
                tag.push_attribute(("path", file.path.as_str()));
                tag.push_attribute(("relevant", if file.relevant { "true" } else { "false" }));
                writer.write_event(Event::Empty(tag))?;
            }
        }
        Ok(())
    }
}
