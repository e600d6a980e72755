//! PlantUML component diagram output.

use std::fmt::Write;

use archstudio_core::{Connection, Element};

pub fn render<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
    connections: impl IntoIterator<Item = &'a Connection>,
) -> String {
    let mut output = String::from("@startuml\n");

    for element in elements {
        let _ = writeln!(
            output,
            r#"component "{}" as {}"#,
            element.name.replace('"', "'"),
            element.id
        );
    }

    for connection in connections {
        let _ = writeln!(
            output,
            "{} --> {} : {}",
            connection.from, connection.to, connection.protocol
        );
    }

    output.push_str("@enduml\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::{ConnectionDetails, ConnectionKind, Diagram, ElementKind, IdGenerator};
    use archstudio_geometry::Point;

    #[test]
    fn wraps_components_and_links() {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let api = diagram.add_element(ElementKind::ApiGateway, "Gateway", Point::ORIGIN);
        let queue = diagram.add_element(ElementKind::Queue, "Jobs", Point::new(300.0, 0.0));
        diagram
            .add_connection(api.id, queue.id, ConnectionDetails::new("AMQP", ConnectionKind::Async))
            .unwrap();

        let text = render(diagram.elements(), diagram.connections());
        assert_eq!(
            text,
            "@startuml\ncomponent \"Gateway\" as 1\ncomponent \"Jobs\" as 2\n1 --> 2 : AMQP\n@enduml\n"
        );
    }

    #[test]
    fn empty_diagram_still_has_markers() {
        assert_eq!(render([], []), "@startuml\n@enduml\n");
    }
}
