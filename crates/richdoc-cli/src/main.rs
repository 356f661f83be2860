use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use richdoc_config::Config;
use richdoc_engine::editing::{Cmd, Editor, Element, ElementKind, Mark, Node, Selection};
use std::{cell::Cell, io::stdout, rc::Rc};

struct App {
    editor: Editor,
    label: String,
    required: bool,
    error: Option<String>,
    status: String,
    changes: Rc<Cell<u64>>,
}

impl App {
    fn new(config: Config) -> Self {
        let changes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&changes);
        let mut editor = Editor::new();
        editor.on_change(move |_doc, _patch| {
            counter.set(counter.get() + 1);
        });

        Self {
            editor,
            label: config.label,
            required: config.required,
            error: None,
            status: String::new(),
            changes,
        }
    }

    fn dispatch(&mut self, cmd: Cmd) {
        match self.editor.dispatch(cmd) {
            Ok(patch) => {
                self.error = None;
                self.status = format!("v{}", patch.version);
            }
            Err(e) => {
                // The engine rejected the intent and changed nothing;
                // surface the message and keep accepting input.
                self.error = Some(e.to_string());
            }
        }
    }

    fn move_cursor(&mut self, forward: bool, extend: bool) {
        let (sel, next) = {
            let doc = self.editor.document();
            let sel = doc.selection().clone();
            let from = if extend {
                sel.focus.clone()
            } else if forward {
                sel.end().clone()
            } else {
                sel.start().clone()
            };
            let next = if forward {
                doc.point_forward(&from)
            } else {
                doc.point_backward(&from)
            };
            (sel, next)
        };

        if let Some(point) = next {
            let new_sel = if extend {
                Selection::range(sel.anchor, point)
            } else {
                Selection::collapsed(point)
            };
            let _ = self.editor.select(new_sel);
        }
    }
}

fn main() -> Result<()> {
    // Presentation settings only; the editing core never sees these
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Warning: falling back to default config: {e}");
            Config::default()
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let extend = key.modifiers.contains(KeyModifiers::SHIFT);
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Left => app.move_cursor(false, extend),
                KeyCode::Right => app.move_cursor(true, extend),
                KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.dispatch(Cmd::ToggleBold);
                }
                // The ampersand key inserts the word instead of the character
                KeyCode::Char('&') => app.dispatch(Cmd::InsertLiteral {
                    text: "and".to_string(),
                }),
                KeyCode::Char('`') => app.dispatch(Cmd::ToggleCodeBlock),
                KeyCode::Char(ch) => app.dispatch(Cmd::InsertLiteral {
                    text: ch.to_string(),
                }),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(1), // label
                Constraint::Min(3),    // editor
                Constraint::Length(1), // error
                Constraint::Length(1), // help
            ]
            .as_ref(),
        )
        .split(f.area());

    // Label with optional required marker
    let mut label_spans = Vec::new();
    if app.required {
        label_spans.push(Span::styled("* ", Style::default().fg(Color::Red)));
    }
    label_spans.push(Span::styled(
        app.label.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(Line::from(label_spans)), chunks[0]);

    // Document blocks
    let doc = app.editor.document();
    let mut lines = Vec::new();
    for block in doc.blocks() {
        if let Node::Element(el) = block {
            lines.extend(render_element(el));
        }
    }
    let title = format!("richdoc — v{} ({} changes)", doc.version(), app.changes.get());
    let editor_panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(editor_panel, chunks[1]);

    // Error display is presentation glue; the engine already rejected the intent
    if let Some(err) = &app.error {
        f.render_widget(
            Paragraph::new(Span::styled(
                err.as_str(),
                Style::default().fg(Color::Red),
            )),
            chunks[2],
        );
    }

    let help = Line::from(vec![
        Span::raw("Esc: Quit | "),
        Span::raw("type to insert (& becomes \"and\") | "),
        Span::raw("`: code block | "),
        Span::raw("Ctrl+B: bold | "),
        Span::raw(format!("{} cursor {:?}", app.status, doc.selection().focus)),
    ]);
    f.render_widget(Paragraph::new(help), chunks[3]);
}

fn render_element(el: &Element) -> Vec<Line<'_>> {
    match el.kind {
        ElementKind::CodeBlock => {
            let fence = Style::default().fg(Color::DarkGray);
            vec![
                Line::from(Span::styled("```", fence)),
                Line::from(runs_to_spans(el, Style::default().fg(Color::Yellow))),
                Line::from(Span::styled("```", fence)),
            ]
        }
        ElementKind::BlockQuote => {
            let mut lines = Vec::new();
            for child in &el.children {
                if let Node::Element(inner) = child {
                    for line in render_element(inner) {
                        let mut spans =
                            vec![Span::styled("> ", Style::default().fg(Color::DarkGray))];
                        spans.extend(line.spans);
                        lines.push(Line::from(spans));
                    }
                }
            }
            lines
        }
        ElementKind::Paragraph => vec![Line::from(runs_to_spans(el, Style::default()))],
    }
}

fn runs_to_spans(el: &Element, base: Style) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    for child in &el.children {
        if let Node::Text(run) = child {
            let mut style = base;
            if run.has_mark(Mark::Bold) {
                style = style.add_modifier(Modifier::BOLD);
            }
            if run.has_mark(Mark::Italic) {
                style = style.add_modifier(Modifier::ITALIC);
            }
            if run.has_mark(Mark::Code) {
                style = style.fg(Color::Yellow);
            }
            spans.push(Span::styled(run.content.as_str(), style));
        }
    }
    spans
}
