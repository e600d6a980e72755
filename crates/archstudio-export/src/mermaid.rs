//! Mermaid `graph TB` flowchart output.

use std::fmt::Write;

use archstudio_core::{Connection, ConnectionKind, Element};

const HEADER: &str = "graph TB";

/// Render elements as nodes and connections as labeled edges.
///
/// Nodes: `    <id>["<name><br/><techStack>"]`
/// Edges: `    <from> <arrow>|<protocol>| <to>`, with `-->` for sync and `-.->`
/// for everything else.
pub fn render<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
    connections: impl IntoIterator<Item = &'a Connection>,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{HEADER}");

    for element in elements {
        let tech = element.tech_stack.as_deref().unwrap_or("");
        let _ = writeln!(
            output,
            r#"    {}["{}<br/>{}"]"#,
            element.id,
            escape_label(&element.name),
            escape_label(tech)
        );
    }

    output.push('\n');

    for connection in connections {
        let _ = writeln!(
            output,
            "    {} {}|{}| {}",
            connection.from,
            arrow(connection.kind),
            escape_label(&connection.protocol),
            connection.to
        );
    }

    output
}

fn arrow(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::Sync => "-->",
        ConnectionKind::Async | ConnectionKind::Data => "-.->",
    }
}

/// Mermaid labels cannot contain raw double quotes or pipes
fn escape_label(s: &str) -> String {
    s.replace('"', "#quot;").replace('|', "#124;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::{ConnectionDetails, Diagram, ElementKind, ElementPatch, IdGenerator};
    use archstudio_geometry::Point;

    #[test]
    fn nodes_then_edges() {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let web = diagram.add_element(ElementKind::WebApp, "Web", Point::new(100.0, 100.0));
        let db = diagram.add_element(ElementKind::Database, "Orders \"DB\"", Point::new(400.0, 100.0));
        diagram
            .update_element(web.id, ElementPatch::default().tech_stack("React"))
            .unwrap();
        diagram
            .add_connection(web.id, db.id, ConnectionDetails::new("REST", ConnectionKind::Sync))
            .unwrap();
        diagram
            .add_connection(db.id, web.id, ConnectionDetails::new("CDC", ConnectionKind::Async))
            .unwrap();

        let text = render(diagram.elements(), diagram.connections());
        assert_eq!(
            text,
            "graph TB\n    1[\"Web<br/>React\"]\n    2[\"Orders #quot;DB#quot;<br/>\"]\n\n    1 -->|REST| 2\n    2 -.->|CDC| 1\n"
        );
    }

    #[test]
    fn data_edges_are_dotted() {
        assert_eq!(arrow(ConnectionKind::Data), "-.->");
    }
}
