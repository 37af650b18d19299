use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use std::io::Write;
use stream_resolver::StreamDescriptor;
#[cfg(feature = "table-output")]
use std::borrow::Cow;
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_descriptor(
        &self,
        descriptor: &StreamDescriptor,
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_pretty(descriptor)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(descriptor)? + "\n"),
            OutputFormat::JsonCompact => Ok(serde_json::to_string(descriptor)? + "\n"),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.format_table(descriptor)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => {
                // Fallback to pretty format when table feature is disabled
                Ok(self.format_pretty(descriptor))
            }
        }
    }

    fn format_pretty(&self, descriptor: &StreamDescriptor) -> String {
        let mut output = String::new();

        output.push_str(&self.colorize("Stream Descriptor:", &Color::Green, true));
        output.push('\n');

        output.push_str(&format!(
            "  {}: {}\n",
            self.colorize("Destination", &Color::Yellow, false),
            self.colorize(descriptor.destination_url.as_str(), &Color::Blue, false)
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            self.colorize("Kind", &Color::Yellow, false),
            self.colorize(&descriptor.endpoint_kind.to_string(), &Color::Cyan, false)
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            self.colorize("Endpoint", &Color::Yellow, false),
            self.colorize(descriptor.endpoint(), &Color::Cyan, false)
        ));

        if !descriptor.request_headers.is_empty() {
            output.push_str(&format!(
                "  {}:\n",
                self.colorize("Request Headers", &Color::Yellow, false)
            ));
            for (name, value) in descriptor.request_headers.sorted() {
                output.push_str(&format!(
                    "    {}: {}\n",
                    self.colorize(name, &Color::Green, false),
                    self.colorize(value, &Color::Cyan, false)
                ));
            }
        }

        if let Some(metadata) = descriptor.metadata.as_ref().filter(|m| !m.is_empty()) {
            output.push_str(&format!(
                "  {}:\n",
                self.colorize("Metadata", &Color::Yellow, false)
            ));
            let mut entries: Vec<_> = metadata.iter().collect();
            entries.sort();
            for (key, value) in entries {
                output.push_str(&format!(
                    "    {}: {}\n",
                    self.colorize(key, &Color::Green, false),
                    self.colorize(value, &Color::Cyan, false)
                ));
            }
        }

        output
    }

    #[cfg(feature = "table-output")]
    fn format_table(&self, descriptor: &StreamDescriptor) -> String {
        #[derive(Tabled)]
        struct TableRow<'a> {
            property: Cow<'a, str>,
            value: Cow<'a, str>,
        }

        let mut rows = vec![
            TableRow {
                property: Cow::Borrowed("Destination"),
                value: Cow::Borrowed(descriptor.destination_url.as_str()),
            },
            TableRow {
                property: Cow::Borrowed("Kind"),
                value: Cow::Owned(descriptor.endpoint_kind.to_string()),
            },
            TableRow {
                property: Cow::Borrowed("Endpoint"),
                value: Cow::Borrowed(descriptor.endpoint()),
            },
        ];

        for (name, value) in descriptor.request_headers.sorted() {
            rows.push(TableRow {
                property: Cow::Owned(format!("header: {name}")),
                value: Cow::Borrowed(value),
            });
        }

        if let Some(metadata) = &descriptor.metadata {
            let mut entries: Vec<_> = metadata.iter().collect();
            entries.sort();
            for (key, value) in entries {
                rows.push(TableRow {
                    property: Cow::Owned(format!("metadata: {key}")),
                    value: Cow::Borrowed(value),
                });
            }
        }

        Table::new(rows).with(Style::modern()).to_string() + "\n"
    }

    pub fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                    Color::Red => text.red(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (self.colored, color, bold);
            text.to_string()
        }
    }
}

pub enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
    Red,
}

pub fn write_output(content: &str, output_file: Option<&std::path::Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
