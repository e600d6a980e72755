mod app;
mod file_io;
mod persistence;
mod pointer;
mod raster;
mod ui;

use std::fs::OpenOptions;
use std::io::{stdout, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use archstudio_core::{route, Diagram};
use archstudio_export::{ExportFormat, ExportOptions};
use archstudio_session::{Editor, Interaction};

use app::{App, Mode};
use persistence::{PersistEvent, PersistHandle};

/// Terminal editor for C4-style software architecture diagrams
#[derive(Parser, Debug)]
#[command(name = "archstudio")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Diagram file to open (defaults to the diagram in the data directory)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Editor settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a diagram file without opening the editor
    Export {
        /// mermaid, plantuml, json or svg
        #[arg(long, short, default_value = "mermaid")]
        format: ExportFormat,

        /// Include groups in the JSON dump
        #[arg(long)]
        include_groups: bool,

        /// Write here instead of stdout
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the derived line geometry of every connection
    Routes {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::Export {
            format,
            include_groups,
            output,
            file,
        }) => {
            init_stderr_logging();
            run_export(&file, format, ExportOptions { include_groups }, output.as_deref())
        }
        Some(Command::Routes { file }) => {
            init_stderr_logging();
            run_routes(&file)
        }
        None => {
            let file = args.file.unwrap_or_else(file_io::default_storage_path);
            let config = args.config.unwrap_or_else(file_io::default_config_path);
            run_editor(file, &config)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("archstudio=info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The UI owns the terminal, so logs go to a file
fn init_file_logging() -> Result<()> {
    let path = file_io::default_log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_diagram(path: &Path) -> Result<Diagram> {
    let snapshot = file_io::load_snapshot(path)?;
    Ok(Diagram::from_snapshot(snapshot))
}

fn run_export(file: &Path, format: ExportFormat, options: ExportOptions, output: Option<&Path>) -> Result<()> {
    let diagram = load_diagram(file)?;
    match output {
        Some(path) => {
            archstudio_export::save(path, format, &diagram, options)?;
            tracing::info!(path = %path.display(), "export written");
        }
        None => {
            let text = archstudio_export::export(format, &diagram, options)?;
            let mut out = stdout().lock();
            out.write_all(text.as_bytes()).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn run_routes(file: &Path) -> Result<()> {
    let diagram = load_diagram(file)?;
    let mut out = stdout().lock();
    for r in route::route_connections(&diagram) {
        writeln!(
            out,
            "{}\t({:.1}, {:.1}) -> ({:.1}, {:.1})\t{:.1}°\tlen {:.1}\t{}{}",
            r.id,
            r.from.x,
            r.from.y,
            r.to.x,
            r.to.y,
            r.angle,
            r.length(),
            r.style.color,
            if r.style.is_dashed() { " dashed" } else { "" }
        )
        .context("Failed to write to stdout")?;
    }
    Ok(())
}

fn run_editor(file: PathBuf, config_path: &Path) -> Result<()> {
    init_file_logging()?;

    let config = file_io::load_config(config_path)?;
    let snapshot = file_io::load_snapshot(&file)?;
    let diagram = Diagram::from_snapshot(snapshot);
    tracing::info!(
        path = %file.display(),
        elements = diagram.element_count(),
        groups = diagram.group_count(),
        connections = diagram.connection_count(),
        "diagram loaded"
    );

    let (change_tx, persist_handle) = persistence::start_persistence(file.clone(), diagram.snapshot())?;
    let editor = Editor::new(diagram, config).with_change_sink(change_tx);
    let mut app = App::new(editor, file);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &persist_handle);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Dropping the editor closes the change channel so the writer can drain
    drop(app);
    persist_handle.join();

    if let Err(e) = result {
        tracing::error!(error = %e, "editor exited with error");
        eprintln!("Error: {:?}", e);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    persist_handle: &PersistHandle,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for persistence results (non-blocking)
        while let Some(event) = persist_handle.poll_event() {
            match event {
                PersistEvent::Saved { path } => {
                    tracing::debug!(path = %path.display(), "diagram persisted");
                }
                PersistEvent::Error(msg) => app.set_status(format!("Autosave failed: {}", msg)),
            }
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.clear_status();
                    match &app.mode {
                        Mode::Normal => handle_normal_mode(app, key),
                        Mode::NameInput { .. } | Mode::GroupNameInput { .. } => {
                            handle_name_input_mode(app, key)
                        }
                        Mode::ConnectionDetails { .. } => handle_connection_details_mode(app, key),
                        Mode::ExportPrompt { .. } => handle_export_mode(app, key),
                    }
                }
                Event::Mouse(mouse) => pointer::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
        }
        KeyCode::Esc => {
            if matches!(app.editor.interaction(), Interaction::DrawingConnection { .. }) {
                app.toggle_connect();
            } else {
                app.editor.select_element(None);
            }
        }

        // Creation
        KeyCode::Char('a') => app.start_add_element(),
        KeyCode::Char('t') => app.cycle_palette(),
        KeyCode::Char('g') => app.start_add_group(),
        KeyCode::Char('c') => app.toggle_connect(),

        // Deletion
        KeyCode::Delete | KeyCode::Backspace => app.delete_selected(),
        KeyCode::Char('x') => app.delete_hovered_connection(),

        // View
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') => app.zoom_out(),
        KeyCode::Char('0') => app.reset_zoom(),
        KeyCode::Char(c @ '1'..='4') => app.set_level(c as usize - '1' as usize),
        KeyCode::Char('G') => app.toggle_grid_snap(),
        KeyCode::Char('L') => app.toggle_connections(),
        KeyCode::Char('H') => app.toggle_groups(),

        // Files
        KeyCode::Char('E') => app.start_export(),
        KeyCode::Char('I') => {
            app.include_groups = !app.include_groups;
            let status = if app.include_groups {
                "JSON export includes groups"
            } else {
                "JSON export omits groups"
            };
            app.set_status(status);
        }
        KeyCode::Char('w') => app.save(),

        // Viewport panning
        KeyCode::Up => app.pan(0, -1),
        KeyCode::Down => app.pan(0, 1),
        KeyCode::Left => app.pan(-1, 0),
        KeyCode::Right => app.pan(1, 0),

        _ => {}
    }
}

fn handle_name_input_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.commit_name(),
        KeyCode::Backspace => app.backspace_input(),
        KeyCode::Char(c) => app.add_input_char(c),
        _ => {}
    }
}

fn handle_connection_details_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_connection_field(),
        KeyCode::Tab => app.cycle_connection_kind(),
        KeyCode::Backspace => app.backspace_input(),
        KeyCode::Char(c) => app.add_input_char(c),
        _ => {}
    }
}

fn handle_export_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.commit_export(),
        KeyCode::Tab => app.cycle_export_format(),
        KeyCode::Backspace => app.backspace_input(),
        KeyCode::Char(c) => app.add_input_char(c),
        _ => {}
    }
}
