use std::path::PathBuf;

use archstudio_core::{C4Level, ConnectionDetails, ConnectionKind, ElementKind};
use archstudio_export::{ExportFormat, ExportOptions};
use archstudio_geometry::{Point, Size};
use archstudio_session::{ConnectionRequest, Editor, Interaction};

use crate::file_io;
use crate::raster::{Cell, CELL_HEIGHT, CELL_WIDTH};

/// Colors offered for new groups, cycled in order
pub const GROUP_COLORS: [&str; 5] = ["#8b5cf6", "#3b82f6", "#10b981", "#f59e0b", "#ef4444"];

/// Size of a freshly created group
pub const DEFAULT_GROUP_SIZE: Size = Size {
    width: 400.0,
    height: 250.0,
};

pub const DEFAULT_PROTOCOL: &str = "REST";

/// Application mode
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    /// Naming a new element of the palette kind at `at`
    NameInput { kind: ElementKind, at: Point, text: String },
    GroupNameInput { at: Point, text: String },
    /// Collecting protocol, description and type for a requested connection
    ConnectionDetails {
        request: ConnectionRequest,
        protocol: String,
        description: String,
        kind: ConnectionKind,
        field: DetailField,
    },
    ExportPrompt { format: ExportFormat, path: String },
}

/// Text field the connection prompt is editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Protocol,
    Description,
}

/// Main application state
pub struct App {
    /// The editing session - the source of truth
    pub editor: Editor,
    pub mode: Mode,
    /// Element kind placed by `a`
    pub palette: ElementKind,
    pub running: bool,
    pub file_path: PathBuf,
    pub status_message: Option<String>,
    /// Canvas point under the mouse at the last mouse event
    pub last_cursor: Point,
    /// Include groups in JSON exports
    pub include_groups: bool,
    next_group_color: usize,
}

impl App {
    pub fn new(editor: Editor, file_path: PathBuf) -> Self {
        Self {
            editor,
            mode: Mode::Normal,
            palette: ElementKind::Microservice,
            running: true,
            file_path,
            status_message: None,
            last_cursor: Point::new(40.0, 40.0),
            include_groups: false,
            next_group_color: 0,
        }
    }

    /// Set a status message to display
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Clear the status message
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Client-space point at the center of a canvas-area cell
    pub fn cell_to_client(&self, column: u16, row: u16) -> Point {
        Cell::new(i32::from(column), i32::from(row)).to_client()
    }

    /// Scroll the view by whole cells
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let origin = self.editor.viewport().origin;
        self.editor.set_canvas_origin(Point::new(
            origin.x - f64::from(dx) * CELL_WIDTH * 4.0,
            origin.y - f64::from(dy) * CELL_HEIGHT * 2.0,
        ));
    }

    // ---- palette & creation ----

    pub fn cycle_palette(&mut self) {
        self.palette = self.palette.next();
        self.set_status(format!("Palette: {}", self.palette.name()));
    }

    pub fn start_add_element(&mut self) {
        self.mode = Mode::NameInput {
            kind: self.palette,
            at: self.last_cursor,
            text: String::new(),
        };
    }

    pub fn start_add_group(&mut self) {
        self.mode = Mode::GroupNameInput {
            at: self.last_cursor,
            text: String::new(),
        };
    }

    pub fn add_input_char(&mut self, c: char) {
        match &mut self.mode {
            Mode::NameInput { text, .. }
            | Mode::GroupNameInput { text, .. }
            | Mode::ExportPrompt { path: text, .. } => text.push(c),
            Mode::ConnectionDetails {
                protocol,
                description,
                field,
                ..
            } => match field {
                DetailField::Protocol => protocol.push(c),
                DetailField::Description => description.push(c),
            },
            Mode::Normal => {}
        }
    }

    pub fn backspace_input(&mut self) {
        match &mut self.mode {
            Mode::NameInput { text, .. }
            | Mode::GroupNameInput { text, .. }
            | Mode::ExportPrompt { path: text, .. } => {
                text.pop();
            }
            Mode::ConnectionDetails {
                protocol,
                description,
                field,
                ..
            } => {
                match field {
                    DetailField::Protocol => protocol.pop(),
                    DetailField::Description => description.pop(),
                };
            }
            Mode::Normal => {}
        }
    }

    /// Finish whichever name prompt is open
    pub fn commit_name(&mut self) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::NameInput { kind, at, text } => {
                let name = text.trim();
                if name.is_empty() {
                    self.set_status("Name required");
                    return;
                }
                let element = self.editor.add_element(kind, name, at);
                self.set_status(format!("Added {} '{}'", kind.name(), element.name));
            }
            Mode::GroupNameInput { at, text } => {
                let name = text.trim();
                if name.is_empty() {
                    self.set_status("Name required");
                    return;
                }
                let color = GROUP_COLORS[self.next_group_color % GROUP_COLORS.len()];
                self.next_group_color += 1;
                let group = self
                    .editor
                    .add_group(name, color, None, at, DEFAULT_GROUP_SIZE);
                self.set_status(format!("Added group '{}'", group.name));
            }
            other => self.mode = other,
        }
    }

    // ---- connections ----

    pub fn toggle_connect(&mut self) {
        if matches!(self.editor.interaction(), Interaction::DrawingConnection { .. }) {
            self.editor.toggle_connection_mode();
            self.set_status("Connection mode off");
        } else if self.editor.toggle_connection_mode() {
            self.set_status("Connection mode: click source, then target");
        }
    }

    /// Open the detail prompt for a freshly requested connection
    pub fn request_connection(&mut self, request: ConnectionRequest) {
        self.mode = Mode::ConnectionDetails {
            request,
            protocol: DEFAULT_PROTOCOL.to_string(),
            description: String::new(),
            kind: ConnectionKind::Sync,
            field: DetailField::Protocol,
        };
    }

    /// Enter in the connection prompt: move from protocol to description,
    /// then create the connection
    pub fn submit_connection_field(&mut self) {
        match &mut self.mode {
            Mode::ConnectionDetails { field, .. } if *field == DetailField::Protocol => {
                *field = DetailField::Description;
            }
            Mode::ConnectionDetails { .. } => self.commit_connection(),
            _ => {}
        }
    }

    pub fn cycle_connection_kind(&mut self) {
        if let Mode::ConnectionDetails { kind, .. } = &mut self.mode {
            *kind = kind.next();
        }
    }

    pub fn commit_connection(&mut self) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Mode::ConnectionDetails {
            request,
            protocol,
            description,
            kind,
            ..
        } = mode
        else {
            self.mode = mode;
            return;
        };
        let mut details = ConnectionDetails::new(protocol.trim(), kind);
        let description = description.trim();
        if !description.is_empty() {
            details = details.with_description(description);
        }
        match self.editor.complete_connection(request, details) {
            Ok(connection) => self.set_status(format!(
                "Connected {} -> {} ({})",
                connection.from,
                connection.to,
                connection.kind.name()
            )),
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    pub fn cancel_prompt(&mut self) {
        if matches!(self.mode, Mode::ConnectionDetails { .. }) {
            self.editor.cancel_connection_request();
            self.set_status("Connection cancelled");
        }
        self.mode = Mode::Normal;
    }

    // ---- deletion ----

    pub fn delete_selected(&mut self) {
        match self.editor.delete_selected() {
            Ok(true) => self.set_status("Deleted"),
            Ok(false) => self.set_status("Nothing selected"),
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    pub fn delete_hovered_connection(&mut self) {
        let Some(id) = self.editor.hovered_connection() else {
            self.set_status("Hover a connection to delete it");
            return;
        };
        match self.editor.delete_connection(id) {
            Ok(_) => self.set_status("Connection deleted"),
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    // ---- view ----

    pub fn zoom_in(&mut self) {
        let zoom = self.editor.zoom_in();
        self.set_status(format!("Zoom {}%", zoom));
    }

    pub fn zoom_out(&mut self) {
        let zoom = self.editor.zoom_out();
        self.set_status(format!("Zoom {}%", zoom));
    }

    pub fn reset_zoom(&mut self) {
        let zoom = self.editor.reset_zoom();
        self.set_status(format!("Zoom {}%", zoom));
    }

    pub fn set_level(&mut self, index: usize) {
        if let Some(level) = C4Level::ALL.get(index).copied() {
            self.editor.set_level(level);
            self.set_status(format!("C4 level: {}", level.name()));
        }
    }

    pub fn toggle_grid_snap(&mut self) {
        let enabled = !self.editor.snap_to_grid();
        self.editor.set_snap_to_grid(enabled);
        self.set_status(if enabled { "Grid snap on" } else { "Grid snap off" });
    }

    pub fn toggle_connections(&mut self) {
        let shown = self.editor.toggle_connections_visible();
        self.set_status(if shown { "Connections shown" } else { "Connections hidden" });
    }

    pub fn toggle_groups(&mut self) {
        let shown = self.editor.toggle_groups_visible();
        self.set_status(if shown { "Groups shown" } else { "Groups hidden" });
    }

    // ---- files ----

    pub fn start_export(&mut self) {
        let format = ExportFormat::Mermaid;
        self.mode = Mode::ExportPrompt {
            format,
            path: self.export_path(format),
        };
    }

    /// Switch the export prompt to the next format, keeping a default path in step
    pub fn cycle_export_format(&mut self) {
        let Mode::ExportPrompt { format, path } = &self.mode else {
            return;
        };
        let next = format.next();
        let path = if *path == self.export_path(*format) {
            self.export_path(next)
        } else {
            path.clone()
        };
        self.mode = Mode::ExportPrompt { format: next, path };
    }

    fn export_path(&self, format: ExportFormat) -> String {
        self.file_path
            .with_extension(format.extension())
            .to_string_lossy()
            .into_owned()
    }

    pub fn commit_export(&mut self) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Mode::ExportPrompt { format, path } = mode else {
            self.mode = mode;
            return;
        };
        let path = PathBuf::from(path);
        let options = ExportOptions {
            include_groups: self.include_groups,
        };
        match archstudio_export::save(&path, format, self.editor.diagram(), options) {
            Ok(()) => self.set_status(format!("Exported {} to {}", format, path.display())),
            Err(e) => self.set_status(format!("Error: {:#}", e)),
        }
    }

    /// Write the whole snapshot to the current file now
    pub fn save(&mut self) {
        match file_io::save_snapshot(&self.file_path, &self.editor.diagram().snapshot()) {
            Ok(()) => self.set_status(format!("Saved {}", self.file_path.display())),
            Err(e) => self.set_status(format!("Error: {:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::Diagram;
    use archstudio_session::EditorConfig;

    fn app() -> App {
        App::new(
            Editor::new(Diagram::new(), EditorConfig::default()),
            PathBuf::from("/tmp/archstudio-test/diagram.json"),
        )
    }

    #[test]
    fn naming_adds_element_at_cursor() {
        let mut app = app();
        app.last_cursor = Point::new(200.0, 120.0);
        app.start_add_element();
        for c in "Billing".chars() {
            app.add_input_char(c);
        }
        app.commit_name();

        assert_eq!(app.mode, Mode::Normal);
        let element = app.editor.diagram().elements().next().unwrap();
        assert_eq!(element.name, "Billing");
        assert_eq!(element.kind, ElementKind::Microservice);
        assert_eq!(element.position(), Point::new(200.0, 120.0));
    }

    #[test]
    fn empty_name_is_refused() {
        let mut app = app();
        app.start_add_group();
        app.add_input_char(' ');
        app.commit_name();
        assert_eq!(app.editor.diagram().group_count(), 0);
        assert_eq!(app.status_message.as_deref(), Some("Name required"));
    }

    #[test]
    fn connection_prompt_creates_connection() {
        let mut app = app();
        let a = app.editor.add_element(ElementKind::User, "a", Point::ORIGIN);
        let b = app.editor.add_element(ElementKind::WebApp, "b", Point::new(300.0, 0.0));
        app.request_connection(ConnectionRequest { from: a.id, to: b.id });
        app.backspace_input();
        app.backspace_input();
        app.backspace_input();
        app.backspace_input();
        for c in "gRPC".chars() {
            app.add_input_char(c);
        }
        app.cycle_connection_kind();
        app.commit_connection();

        let connection = app.editor.diagram().connections().next().unwrap();
        assert_eq!(connection.protocol, "gRPC");
        assert_eq!(connection.kind, ConnectionKind::Async);
        assert_eq!(connection.description, None);
    }

    #[test]
    fn enter_moves_to_description_then_connects() {
        let mut app = app();
        let a = app.editor.add_element(ElementKind::WebApp, "web", Point::ORIGIN);
        let b = app.editor.add_element(ElementKind::Database, "db", Point::new(300.0, 0.0));
        app.request_connection(ConnectionRequest { from: a.id, to: b.id });

        app.submit_connection_field();
        assert!(matches!(
            app.mode,
            Mode::ConnectionDetails { field: DetailField::Description, .. }
        ));
        assert_eq!(app.editor.diagram().connection_count(), 0);

        for c in "reads orders".chars() {
            app.add_input_char(c);
        }
        app.backspace_input();
        app.submit_connection_field();

        assert_eq!(app.mode, Mode::Normal);
        let connection = app.editor.diagram().connections().next().unwrap();
        assert_eq!(connection.protocol, DEFAULT_PROTOCOL);
        assert_eq!(connection.description.as_deref(), Some("reads order"));
    }

    #[test]
    fn export_format_cycle_updates_default_path() {
        let mut app = app();
        app.start_export();
        app.cycle_export_format();
        assert_eq!(
            app.mode,
            Mode::ExportPrompt {
                format: ExportFormat::PlantUml,
                path: "/tmp/archstudio-test/diagram.puml".into(),
            }
        );
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            Editor::new(Diagram::new(), EditorConfig::default()),
            dir.path().join("diagram.json"),
        );
        app.editor.add_element(ElementKind::Cache, "Redis", Point::ORIGIN);
        app.start_export();
        app.commit_export();
        let text = std::fs::read_to_string(dir.path().join("diagram.mmd")).unwrap();
        assert!(text.starts_with("graph TB"));
    }
}
