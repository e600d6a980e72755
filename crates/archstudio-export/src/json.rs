//! Structured JSON dump of the diagram.
//!
//! The default dump is `{elements, connections}`; groups are only written when
//! [`ExportOptions::include_groups`] is set.

use anyhow::{Context, Result};
use archstudio_core::{Connection, DiagramSnapshot, Element, Group};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_groups: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDump {
    pub elements: Vec<Element>,
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

impl DiagramDump {
    pub fn from_snapshot(snapshot: &DiagramSnapshot, options: ExportOptions) -> Self {
        Self {
            elements: snapshot.elements.clone(),
            connections: snapshot.connections.clone(),
            groups: options.include_groups.then(|| snapshot.groups.clone()),
        }
    }

    pub fn into_snapshot(self) -> DiagramSnapshot {
        DiagramSnapshot {
            elements: self.elements,
            groups: self.groups.unwrap_or_default(),
            connections: self.connections,
        }
    }
}

/// Pretty-printed JSON dump
pub fn render(snapshot: &DiagramSnapshot, options: ExportOptions) -> Result<String> {
    let dump = DiagramDump::from_snapshot(snapshot, options);
    serde_json::to_string_pretty(&dump).context("Failed to serialize diagram")
}

pub fn parse(text: &str) -> Result<DiagramDump> {
    serde_json::from_str(text).context("Failed to parse diagram JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::{ConnectionDetails, ConnectionKind, Diagram, ElementKind, IdGenerator};
    use archstudio_geometry::{Point, Size};

    fn snapshot() -> DiagramSnapshot {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let group = diagram.add_group("Core", "#8b5cf6", None, Point::ORIGIN, Size::new(500.0, 300.0));
        let a = diagram.add_element(ElementKind::Microservice, "Orders", Point::new(20.0, 20.0));
        let b = diagram.add_element(ElementKind::Database, "Postgres", Point::new(260.0, 20.0));
        diagram.assign_element_to_group(a.id, Some(group.id)).unwrap();
        diagram
            .add_connection(a.id, b.id, ConnectionDetails::new("SQL", ConnectionKind::Data).with_description("writes"))
            .unwrap();
        diagram.snapshot()
    }

    #[test]
    fn groups_are_excluded_by_default() {
        let snapshot = snapshot();
        let text = render(&snapshot, ExportOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("groups").is_none());
        assert_eq!(value["elements"].as_array().unwrap().len(), 2);
        assert_eq!(value["connections"][0]["type"], "data");
    }

    #[test]
    fn round_trips_with_groups() {
        let snapshot = snapshot();
        let text = render(&snapshot, ExportOptions { include_groups: true }).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.into_snapshot(), snapshot);
    }

    #[test]
    fn round_trips_without_groups() {
        let snapshot = snapshot();
        let text = render(&snapshot, ExportOptions::default()).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, DiagramDump::from_snapshot(&snapshot, ExportOptions::default()));
    }

    #[test]
    fn parse_reports_garbage() {
        assert!(parse("{not json").is_err());
    }
}
