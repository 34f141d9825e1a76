// src/report/surface.rs
//! Rendering surfaces.
//!
//! Reports and the dashboard chrome describe their output as a stream of
//! [`Element`]s. A surface decides what to do with them: [`TextSurface`]
//! prints plain text for the CLI, [`RecordingSurface`] keeps them for JSON
//! responses and for staging report output until a render succeeds.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::data::Value;
use crate::filter::{DimensionGroup, FilterSelection};

/// One piece of visual output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Header {
        brand: String,
        tagline: String,
        help_url: Option<String>,
    },
    Navigation {
        reports: Vec<String>,
        selected: Option<String>,
    },
    Filters {
        groups: Vec<DimensionGroup>,
        selection: BTreeMap<String, Vec<Value>>,
    },
    Title {
        title: String,
        subtitle: Option<String>,
    },
    Text {
        text: String,
    },
    Kpi {
        label: String,
        value: String,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Labelled fields shown as a card section.
    Fields {
        title: String,
        fields: Vec<(String, String)>,
    },
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
    LoginRequired,
    Footer,
}

/// Destination for rendered elements.
pub trait RenderSurface {
    fn emit(&mut self, element: Element);

    fn title(&mut self, title: &str, subtitle: Option<&str>) {
        self.emit(Element::Title {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
        });
    }

    fn text(&mut self, text: &str) {
        self.emit(Element::Text {
            text: text.to_string(),
        });
    }

    fn kpi(&mut self, label: &str, value: &str) {
        self.emit(Element::Kpi {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    fn table(&mut self, headers: Vec<String>, rows: Vec<Vec<String>>) {
        self.emit(Element::Table { headers, rows });
    }

    fn fields(&mut self, title: &str, fields: Vec<(String, String)>) {
        self.emit(Element::Fields {
            title: title.to_string(),
            fields,
        });
    }

    fn warning(&mut self, message: &str) {
        self.emit(Element::Warning {
            message: message.to_string(),
        });
    }

    fn error(&mut self, message: &str) {
        self.emit(Element::Error {
            message: message.to_string(),
        });
    }

    /// Filter panel: the dimension choices plus what is currently picked.
    fn filters(&mut self, groups: Vec<DimensionGroup>, selection: &FilterSelection) {
        let selection = selection
            .active()
            .map(|(column, values)| (column.to_string(), values.iter().cloned().collect()))
            .collect();
        self.emit(Element::Filters { groups, selection });
    }
}

/// Keeps every element in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordingSurface {
    elements: Vec<Element>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Forward every recorded element to `surface`.
    pub fn replay_into(self, surface: &mut dyn RenderSurface) {
        for element in self.elements {
            surface.emit(element);
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn emit(&mut self, element: Element) {
        self.elements.push(element);
    }
}

/// Plain-text rendering for terminals.
#[derive(Debug, Clone, Default)]
pub struct TextSurface {
    out: String,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn write_table(&mut self, headers: &[String], rows: &[Vec<String>]) {
        let columns = headers
            .len()
            .max(rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let format_row = |row: &[String]| {
            let mut line = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if i > 0 {
                    line.push_str("  ");
                }
                let _ = write!(line, "{:<width$}", cell, width = width);
            }
            line.trim_end().to_string()
        };

        if !headers.is_empty() {
            let header = format_row(headers);
            self.line(&header);
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            let rule = format_row(&rule);
            self.line(&rule);
        }
        for row in rows {
            let row = format_row(row);
            self.line(&row);
        }
    }
}

impl RenderSurface for TextSurface {
    fn emit(&mut self, element: Element) {
        match element {
            Element::Header {
                brand,
                tagline,
                help_url,
            } => {
                self.line(&format!("{} | {}", brand, tagline));
                if let Some(url) = help_url {
                    self.line(&format!("Help: {}", url));
                }
                self.line("");
            }
            Element::Navigation { reports, selected } => {
                self.line("Reports:");
                for report in reports {
                    let marker = if selected.as_deref() == Some(report.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    self.line(&format!(" {} {}", marker, report));
                }
                self.line("");
            }
            Element::Filters { groups, selection } => {
                for group in groups {
                    self.line(&format!("{}:", group.title));
                    for dim in group.dimensions {
                        let picked = selection
                            .get(&dim.column)
                            .map(|values| join_values(values))
                            .unwrap_or_else(|| "All".to_string());
                        self.line(&format!(
                            "  {}: {} ({} options)",
                            dim.label,
                            picked,
                            dim.values.len()
                        ));
                    }
                }
                self.line("");
            }
            Element::Title { title, subtitle } => {
                self.line(&format!("== {} ==", title));
                if let Some(subtitle) = subtitle {
                    self.line(&subtitle);
                }
            }
            Element::Text { text } => self.line(&text),
            Element::Kpi { label, value } => self.line(&format!("{}: {}", label, value)),
            Element::Table { headers, rows } => self.write_table(&headers, &rows),
            Element::Fields { title, fields } => {
                self.line(&format!("-- {} --", title));
                let width = fields
                    .iter()
                    .map(|(label, _)| label.chars().count())
                    .max()
                    .unwrap_or(0);
                for (label, value) in fields {
                    self.line(&format!("{:<width$}  {}", label, value, width = width));
                }
            }
            Element::Warning { message } => self.line(&format!("warning: {}", message)),
            Element::Error { message } => self.line(&format!("error: {}", message)),
            Element::LoginRequired => self.line("Login required."),
            Element::Footer => {}
        }
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
