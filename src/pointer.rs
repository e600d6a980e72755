use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use archstudio_session::PointerResponse;

use crate::app::{App, Mode};

/// Route a terminal mouse event into the editing session. While a prompt is
/// open only button releases get through, so a gesture always ends.
pub fn handle_mouse_event(app: &mut App, event: MouseEvent) {
    if app.mode != Mode::Normal {
        if event.kind == MouseEventKind::Up(MouseButton::Left) {
            let response = app.editor.pointer_up();
            on_response(app, response);
        }
        return;
    }

    let client = app.cell_to_client(event.column, event.row);
    app.last_cursor = app.editor.viewport().client_to_canvas(client);

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let response = app.editor.pointer_down(client);
            on_response(app, response);
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            let response = app.editor.pointer_move(client);
            on_response(app, response);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let response = app.editor.pointer_up();
            on_response(app, response);
        }
        // Ctrl+scroll zooms, plain scroll pans
        MouseEventKind::ScrollUp if event.modifiers.contains(KeyModifiers::CONTROL) => app.zoom_in(),
        MouseEventKind::ScrollDown if event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.zoom_out()
        }
        MouseEventKind::ScrollUp => app.pan(0, -3),
        MouseEventKind::ScrollDown => app.pan(0, 3),
        MouseEventKind::ScrollLeft => app.pan(-3, 0),
        MouseEventKind::ScrollRight => app.pan(3, 0),
        _ => {}
    }
}

fn on_response(app: &mut App, response: PointerResponse) {
    match response {
        PointerResponse::ConnectionSourceChosen(id) => {
            let name = app
                .editor
                .diagram()
                .element(id)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            app.set_status(format!("From '{}': click the target", name));
        }
        PointerResponse::ConnectionRequested(request) => app.request_connection(request),
        PointerResponse::ElementSelected(id) => {
            if let Some(element) = app.editor.diagram().element(id) {
                let status = format!("Selected {} '{}'", element.kind.name(), element.name);
                app.set_status(status);
            }
        }
        PointerResponse::ResizeStarted(_, corner) => {
            app.set_status(format!("Resizing from {} corner", corner.name()));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use archstudio_core::{Diagram, ElementKind};
    use archstudio_geometry::Point;
    use archstudio_session::{Editor, EditorConfig, Interaction};

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app() -> App {
        App::new(
            Editor::new(Diagram::new(), EditorConfig::default()),
            PathBuf::from("diagram.json"),
        )
    }

    #[test]
    fn drag_moves_card() {
        let mut app = app();
        let element = app.editor.add_element(ElementKind::Database, "DB", Point::new(100.0, 100.0));

        // Cell (12, 6) is client (125, 130), inside the card
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 12, 6));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 22, 8));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 22, 8));

        let moved = app.editor.diagram().element(element.id).unwrap();
        assert_eq!(moved.position(), Point::new(200.0, 140.0));
        assert_eq!(*app.editor.interaction(), Interaction::Idle);
    }

    #[test]
    fn two_clicks_in_connection_mode_open_prompt() {
        let mut app = app();
        app.editor.add_element(ElementKind::User, "User", Point::new(0.0, 0.0));
        app.editor.add_element(ElementKind::WebApp, "Web", Point::new(300.0, 0.0));
        app.toggle_connect();

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 2));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 35, 2));

        assert!(matches!(app.mode, Mode::ConnectionDetails { .. }));
        app.commit_connection();
        assert_eq!(app.editor.diagram().connection_count(), 1);
    }

    #[test]
    fn release_under_a_prompt_ends_the_drag() {
        let mut app = app();
        let element = app.editor.add_element(ElementKind::Database, "DB", Point::new(100.0, 100.0));

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 12, 6));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 22, 8));
        app.start_add_element();
        handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 22, 8));
        assert_eq!(*app.editor.interaction(), Interaction::Idle);

        app.cancel_prompt();
        handle_mouse_event(&mut app, mouse(MouseEventKind::Moved, 60, 20));
        let element = app.editor.diagram().element(element.id).unwrap();
        assert_eq!(element.position(), Point::new(200.0, 140.0));
    }

    #[test]
    fn prompt_ignores_other_mouse_events() {
        let mut app = app();
        let element = app.editor.add_element(ElementKind::Queue, "Jobs", Point::new(100.0, 100.0));
        app.start_add_group();
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 12, 6));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 40, 10));
        assert_eq!(*app.editor.interaction(), Interaction::Idle);
        assert_eq!(
            app.editor.diagram().element(element.id).unwrap().position(),
            Point::new(100.0, 100.0)
        );
    }

    #[test]
    fn ctrl_scroll_zooms() {
        let mut app = app();
        let mut event = mouse(MouseEventKind::ScrollUp, 0, 0);
        event.modifiers = KeyModifiers::CONTROL;
        handle_mouse_event(&mut app, event);
        assert_eq!(app.editor.zoom(), 110);
    }
}
