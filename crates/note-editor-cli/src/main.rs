use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use note_editor_config::Config;
use note_editor_engine::MarkType;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

mod app;
mod render;
mod surface;

use app::{App, Flow, Pane};
use render::{DisplayLine, Segment, Tone, caret_cell, layout, row_of};

const PALETTE_WIDTH: u16 = 36;
const PALETTE_MAX_ROWS: u16 = 10;

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    // The terminal belongs to the editor, so log lines go to a file.
    match std::fs::File::create(env::temp_dir().join("note-editor.log")) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Warning: cannot open log file, logging disabled: {e}");
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let document_path = match args.len() {
        2 => PathBuf::from(&args[1]),
        1 => match config.document_path.clone() {
            Some(path) => {
                log::info!("Using document from config: {}", path.display());
                path
            }
            None => {
                eprintln!("Error: No document provided and none configured");
                eprintln!("Usage: {} <document.html>", args[0]);
                eprintln!("Or set document_path in {}", config_path.display());
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [document.html]", args[0]);
            process::exit(1);
        }
    };

    let mut app = match App::open(document_path, config.editor) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.is_dirty() {
        println!("Unsaved changes to {} were discarded", app.path.display());
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Poll so an expiring highlight gets redrawn.
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key)? == Flow::Quit
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
        .split(rows[0]);

    draw_outline(f, app, chunks[0]);
    draw_document(f, app, chunks[1]);
    draw_help(f, app, rows[1]);
}

fn draw_outline(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .outline()
        .into_iter()
        .map(|entry| {
            let indent = "  ".repeat(entry.level.map_or(0, |level| level.saturating_sub(1) as usize));
            ListItem::new(Line::from(vec![Span::raw(format!("{indent}{}", entry.label))]))
        })
        .collect();

    let border = if app.pane == Pane::Outline {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).border_style(border).title("Outline"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(list, area, &mut app.outline_state);
}

fn draw_document(f: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.is_dirty() {
        format!("{} *", app.path.display())
    } else {
        app.path.display().to_string()
    };
    let frame_block = Block::default().borders(Borders::ALL).title(title);
    let inner = frame_block.inner(area);
    f.render_widget(frame_block, area);

    let doc = app.editor.document();
    let lines = layout(doc);
    let caret = doc
        .text_point(app.editor.selection().to())
        .and_then(|point| caret_cell(&lines, point));

    // Honour an explicit scroll request, then keep the caret visible.
    let height = inner.height as usize;
    if let Some(pos) = app.editor.surface_mut().scroll_request.take()
        && let Some(point) = app.editor.document().text_point(app.editor.document().nearest_text_pos(pos, true))
        && let Some(row) = row_of(&lines, point.ordinal)
    {
        app.scroll = row;
    }
    if let Some((row, _)) = caret {
        if row < app.scroll {
            app.scroll = row;
        } else if height > 0 && row >= app.scroll + height {
            app.scroll = row + 1 - height;
        }
    }

    let highlighted = app.editor.surface().highlighted(Instant::now()).cloned();
    let text: Vec<Line> = lines
        .iter()
        .skip(app.scroll)
        .map(|line| styled_line(line, highlighted.as_ref().is_some_and(|id| line.blocks.contains(id))))
        .collect();
    f.render_widget(Paragraph::new(text), inner);

    if app.pane == Pane::Document
        && let Some((row, column)) = caret
        && row >= app.scroll
    {
        f.set_cursor_position((inner.x + column as u16, inner.y + (row - app.scroll) as u16));
    }

    draw_palette(f, app, inner);
}

fn styled_line(line: &DisplayLine, highlighted: bool) -> Line<'static> {
    let spans: Vec<Span> = line.segments.iter().map(styled_segment).collect();
    let line = Line::from(spans);
    if highlighted {
        line.style(Style::default().bg(Color::DarkGray))
    } else {
        line
    }
}

fn styled_segment(segment: &Segment) -> Span<'static> {
    let mut style = match segment.tone {
        Tone::Plain => Style::default(),
        Tone::Heading(_) | Tone::Header => Style::default().add_modifier(Modifier::BOLD),
        Tone::Code => Style::default().fg(Color::Cyan),
        Tone::Muted => Style::default().fg(Color::DarkGray),
    };
    for mark in segment.marks.iter() {
        style = match mark.mark_type() {
            MarkType::Bold => style.add_modifier(Modifier::BOLD),
            MarkType::Italic => style.add_modifier(Modifier::ITALIC),
            MarkType::Strike => style.add_modifier(Modifier::CROSSED_OUT),
            MarkType::FontFamily => style,
        };
    }
    if segment
        .marks
        .font_family()
        .is_some_and(|family| family.contains("monospace"))
    {
        style = style.fg(Color::Cyan);
    }
    Span::styled(segment.text.clone(), style)
}

fn draw_palette(f: &mut Frame, app: &App, inner: Rect) {
    let palette = app.editor.palette();
    let Some(anchor) = palette.anchor() else {
        return;
    };
    let filtered = palette.filtered();
    let items: Vec<ListItem> = if filtered.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "일치하는 명령 없음",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        filtered
            .iter()
            .map(|descriptor| {
                ListItem::new(Line::from(vec![
                    Span::styled(descriptor.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(descriptor.description.clone(), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect()
    };

    let height = (items.len() as u16).min(PALETTE_MAX_ROWS) + 2;
    let top = (inner.y + anchor.top as u16).saturating_sub(app.scroll as u16);
    let area = Rect {
        x: (inner.x + anchor.left as u16).min(inner.right().saturating_sub(PALETTE_WIDTH)),
        y: top.min(inner.bottom().saturating_sub(height)),
        width: PALETTE_WIDTH.min(inner.width),
        height: height.min(inner.height),
    };

    let mut state = ListState::default();
    if !filtered.is_empty() {
        state.select(palette.highlighted());
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("/"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.pane {
        Pane::Document => {
            "^S: Save | ^Q: Quit | ^Z/^Y: Undo/Redo | ^B/^K/^D: Bold/Italic/Strike | /: Commands | F5-F9: Table | Tab: Outline"
        }
        Pane::Outline => "↑/k ↓/j: Move | Enter: Go to block | a: Add block after | Tab: Document",
    };
    let text = vec![
        Line::from(Span::raw(help)),
        Line::from(Span::styled(app.status.clone(), Style::default().fg(Color::Green))),
    ];
    f.render_widget(Paragraph::new(text), area);
}
