use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io;
use std::time::{Duration, Instant};

use crate::highlight::DiffHighlighter;
use crate::pipeline::StepId;
use crate::session::ReviewSession;
use crate::{CheckState, Severity, StepStatus};

/// How long transient status messages stay visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Application state for the walkthrough TUI.
///
/// All review semantics live in the session; this struct only carries
/// presentation state (scroll, overlays, transient messages).
pub struct App {
    session: ReviewSession,
    should_quit: bool,
    show_help: bool,
    scroll_offset: u16,
    highlighter: DiffHighlighter,
    status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(session: ReviewSession) -> Self {
        Self {
            session,
            should_quit: false,
            show_help: false,
            scroll_offset: 0,
            highlighter: DiffHighlighter::new(),
            status_message: None,
        }
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Handle keyboard input.
    fn handle_input(&mut self, key: event::KeyEvent) {
        if self.show_help {
            // Any key closes help
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') => {
                self.session.start_run(Instant::now());
                self.notify("Review pipeline started");
            }
            KeyCode::Char('R') => {
                self.session.reset_run();
                self.notify("Pipeline reset");
            }
            KeyCode::Char('m') => {
                self.session.toggle_memory();
                let state = if self.session.memory_enabled() {
                    "Project memory: ON"
                } else {
                    "Project memory: OFF"
                };
                self.notify(state);
            }
            KeyCode::Char('s') => {
                self.next_scenario();
            }
            KeyCode::Char('a') => {
                self.apply_selected_patch();
            }
            KeyCode::Tab => {
                self.cycle_file(1);
            }
            KeyCode::BackTab => {
                self.cycle_file(-1);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_comment(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_comment(-1);
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(20);
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(20);
            }
            _ => {}
        }
    }

    /// Cycle the selected file through the scenario's diff list.
    fn cycle_file(&mut self, direction: isize) {
        let paths: Vec<String> = self
            .session
            .scenario()
            .diff
            .iter()
            .map(|f| f.path.clone())
            .collect();
        if paths.is_empty() {
            return;
        }
        let current = paths
            .iter()
            .position(|p| p.as_str() == self.session.selected_file())
            .unwrap_or(0);
        let next = if direction >= 0 {
            (current + 1) % paths.len()
        } else {
            (current + paths.len() - 1) % paths.len()
        };
        self.session.select_file(&paths[next]);
        self.scroll_offset = 0;
    }

    /// Move comment selection within the risk-ordered list (clamped).
    fn move_comment(&mut self, direction: isize) {
        let ordered: Vec<String> = self
            .session
            .comments_for_selected_file()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        if ordered.is_empty() {
            return;
        }
        let current = self
            .session
            .effective_selected_comment()
            .and_then(|c| ordered.iter().position(|id| *id == c.id))
            .unwrap_or(0);
        let next = if direction >= 0 {
            (current + 1).min(ordered.len() - 1)
        } else {
            current.saturating_sub(1)
        };
        self.session.select_comment(&ordered[next]);
    }

    /// Cycle to the next scenario in catalog order.
    fn next_scenario(&mut self) {
        let ids: Vec<String> = self
            .session
            .catalog()
            .scenarios()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        let current = ids
            .iter()
            .position(|id| *id == self.session.scenario().id)
            .unwrap_or(0);
        let next = ids[(current + 1) % ids.len()].clone();
        self.session.select_scenario(&next);
        self.scroll_offset = 0;
        let name = self.session.scenario().name.clone();
        self.notify(format!("Scenario: {name}"));
    }

    /// Apply the suggested patch of the effective selected comment.
    fn apply_selected_patch(&mut self) {
        let patch_id = self
            .session
            .effective_selected_comment()
            .and_then(|c| c.suggested_patch.clone());
        match patch_id {
            Some(id) if self.session.is_applied(&id) => {
                self.notify(format!("Patch {id} already applied"));
            }
            Some(id) => {
                self.session.apply_patch(&id, Instant::now());
                self.notify(format!("Applied suggested patch {id}"));
            }
            None => {
                self.notify("Selected comment has no suggested patch");
            }
        }
    }

    /// Render the UI.
    fn render(&mut self, frame: &mut Frame) {
        // Expire old status messages
        let expired = self
            .status_message
            .as_ref()
            .map(|(_, time)| time.elapsed() >= STATUS_MESSAGE_TTL)
            .unwrap_or(false);
        if expired {
            self.status_message = None;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(8),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_pipeline(frame, chunks[1]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(24),
                Constraint::Percentage(44),
                Constraint::Percentage(32),
            ])
            .split(chunks[2]);

        self.render_file_list(frame, columns[0]);
        self.render_diff(frame, columns[1]);
        self.render_comments(frame, columns[2]);
        self.render_status_bar(frame, chunks[3]);

        if self.show_help {
            self.render_help(frame);
        }
    }

    /// Render the PR header: repo, branch, counts, check badge, memory
    /// badge and the synthetic bot commit.
    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let scenario = self.session.scenario();

        let title_line = Line::from(vec![
            Span::styled(
                format!("{} • PR #{}", scenario.repo, scenario.pr_number),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(scenario.name.as_str(), Style::default().fg(Color::Gray)),
        ]);

        let meta_line = Line::from(Span::styled(
            format!(
                "{} • {} • {} files • +{} / -{} • by {}",
                scenario.branch,
                scenario.languages.join(", "),
                scenario.changed_files,
                scenario.additions,
                scenario.deletions,
                scenario.author
            ),
            Style::default().fg(Color::DarkGray),
        ));

        let check = self.session.check_state();
        let check_color = match check {
            CheckState::Passed => Color::Green,
            CheckState::Pending => Color::Yellow,
            CheckState::Failed => Color::Red,
        };
        let memory_badge = if self.session.memory_enabled() {
            Span::styled("Project Memory: ON", Style::default().fg(Color::Magenta))
        } else {
            Span::styled("Project Memory: OFF", Style::default().fg(Color::DarkGray))
        };
        let mut badge_spans = vec![
            Span::styled(check.label(), Style::default().fg(check_color)),
            Span::raw("  |  "),
            memory_badge,
        ];
        if let Some(commit) = self.session.bot_commit() {
            badge_spans.push(Span::raw("  |  "));
            badge_spans.push(Span::styled(
                commit.to_string(),
                Style::default().fg(Color::Magenta),
            ));
        }

        let text = Text::from(vec![title_line, meta_line, Line::from(badge_spans)]);
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Pull Request"));
        frame.render_widget(paragraph, area);
    }

    /// Render the six pipeline steps and, when memory is on, the
    /// retrieved memory hits beside them.
    fn render_pipeline(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(area);

        let step_lines: Vec<Line> = StepId::ALL
            .iter()
            .map(|step| {
                let status = self.session.step_status(*step);
                let (glyph, color, bold) = match status {
                    StepStatus::Idle => ("○", Color::DarkGray, false),
                    StepStatus::Running => ("◐", Color::Magenta, true),
                    StepStatus::Done => ("●", Color::Green, false),
                    StepStatus::Error => ("✗", Color::Red, true),
                };
                let mut label_style = Style::default().fg(color);
                if bold {
                    label_style = label_style.add_modifier(Modifier::BOLD);
                }
                Line::from(vec![
                    Span::styled(format!("{glyph} "), Style::default().fg(color)),
                    Span::styled(step.label().to_string(), label_style),
                    Span::styled(
                        format!("  {}", step.description()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();

        let subtitle = if self.session.memory_enabled() {
            "Review pipeline (with Project Memory)"
        } else {
            "Review pipeline (generic)"
        };
        let steps = Paragraph::new(Text::from(step_lines))
            .block(Block::default().borders(Borders::ALL).title(subtitle));
        frame.render_widget(steps, halves[0]);

        let memory_lines: Vec<Line> = if self.session.memory_enabled() {
            self.session
                .active_memory_hits()
                .iter()
                .flat_map(|hit| {
                    vec![
                        Line::from(vec![
                            Span::styled(
                                format!("[{}] ", hit.source.label()),
                                Style::default().fg(Color::Magenta),
                            ),
                            Span::raw(hit.title.clone()),
                        ]),
                        Line::from(Span::styled(
                            format!("  {}", hit.snippet),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ]
                })
                .collect()
        } else {
            vec![Line::from(Span::styled(
                "Project memory disabled (press m)",
                Style::default().fg(Color::DarkGray),
            ))]
        };
        let memory = Paragraph::new(Text::from(memory_lines))
            .block(Block::default().borders(Borders::ALL).title("Memory Hits"))
            .wrap(Wrap { trim: false });
        frame.render_widget(memory, halves[1]);
    }

    /// Render the changed-file list with per-file comment counts.
    fn render_file_list(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .scenario()
            .diff
            .iter()
            .map(|file| {
                let count = self.session.comment_count_for(&file.path);
                let selected = file.path == self.session.selected_file();
                let color = if count > 0 { Color::Yellow } else { Color::Gray };
                let style = if selected {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                };
                ListItem::new(format!("{} ({})", file.path, count)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Files (Tab/Shift+Tab)"),
        );
        frame.render_widget(list, area);
    }

    /// Render the selected file's hunks plus, when the selected comment
    /// suggests one, the patch pane below.
    fn render_diff(&self, frame: &mut Frame, area: Rect) {
        let patch = self
            .session
            .effective_selected_comment()
            .and_then(|c| c.suggested_patch.as_deref())
            .and_then(|id| self.session.patch(id));

        let (diff_area, patch_area) = if patch.is_some() {
            let halves = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(6), Constraint::Length(12)])
                .split(area);
            (halves[0], Some(halves[1]))
        } else {
            (area, None)
        };

        let selected = self.session.selected_file().to_string();
        let ext = selected.rsplit('.').next().unwrap_or("");

        let mut lines: Vec<Line> = Vec::new();
        match self.session.scenario().file(&selected) {
            Some(file) => {
                for (i, hunk) in file.hunks.iter().enumerate() {
                    if i > 0 {
                        lines.push(Line::from(""));
                    }
                    lines.extend(self.highlighter.hunk_lines(ext, hunk));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "No diff for the selected file",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        let diff = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Diff: {selected}")),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset, 0));
        frame.render_widget(diff, diff_area);

        if let (Some(patch), Some(patch_area)) = (patch, patch_area) {
            let applied = self.session.is_applied(&patch.id);
            let title = if applied {
                format!("Patch {}: {} [APPLIED]", patch.id, patch.title)
            } else {
                format!("Patch {}: {} (a to apply)", patch.id, patch.title)
            };

            let mut patch_lines = vec![Line::from(Span::styled(
                patch.summary.clone(),
                Style::default().fg(Color::Gray),
            ))];
            if patch.touches_business_logic {
                patch_lines.push(Line::from(Span::styled(
                    "touches business logic",
                    Style::default().fg(Color::Yellow),
                )));
            }
            patch_lines.push(Line::from(""));
            patch_lines.extend(self.highlighter.hunk_lines(ext, &patch.unified_diff));

            let border_color = if applied { Color::Green } else { Color::Reset };
            let widget = Paragraph::new(Text::from(patch_lines))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color))
                        .title(title),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(widget, patch_area);
        }
    }

    /// Render the risk-ordered comment list and the detail pane for the
    /// effective selection.
    fn render_comments(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(10)])
            .split(area);

        let effective_id = self
            .session
            .effective_selected_comment()
            .map(|c| c.id.clone());

        let items: Vec<ListItem> = self
            .session
            .comments_for_selected_file()
            .iter()
            .map(|comment| {
                let color = severity_color(comment.severity);
                let selected = Some(&comment.id) == effective_id.as_ref();
                let prefix = if selected { "▌" } else { " " };
                let style = if selected {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                };
                ListItem::new(format!(
                    "{}{:>3} {:<8} {}",
                    prefix,
                    comment.risk_score,
                    comment.severity.label(),
                    comment.title
                ))
                .style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Comments by risk (j/k)"),
        );
        frame.render_widget(list, halves[0]);

        let detail_lines = match self.session.effective_selected_comment() {
            Some(comment) => {
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled(
                            format!("{}:{}", comment.file_path, comment.line),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::styled(
                            format!("  risk {}/100", comment.risk_score),
                            Style::default().fg(severity_color(comment.severity)),
                        ),
                    ]),
                    Line::from(""),
                    Line::from(comment.message.clone()),
                    Line::from(Span::styled(
                        comment.rationale.clone(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                if let Some(patch_id) = &comment.suggested_patch {
                    lines.push(Line::from(""));
                    let hint = if self.session.is_applied(patch_id) {
                        format!("patch {patch_id} applied")
                    } else {
                        format!("press a to apply patch {patch_id}")
                    };
                    lines.push(Line::from(Span::styled(
                        hint,
                        Style::default().fg(Color::Magenta),
                    )));
                }
                lines
            }
            None => vec![Line::from(Span::styled(
                "No comments for this file",
                Style::default().fg(Color::DarkGray),
            ))],
        };

        let detail = Paragraph::new(Text::from(detail_lines))
            .block(Block::default().borders(Borders::ALL).title("Detail"))
            .wrap(Wrap { trim: false });
        frame.render_widget(detail, halves[1]);
    }

    /// Render the status bar.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_text = match &self.status_message {
            Some((msg, _)) => msg.clone(),
            None => {
                let running = if self.session.is_running() {
                    "running… | "
                } else {
                    ""
                };
                format!(
                    "{}Keys: r=run R=reset m=memory s=scenario Tab=file j/k=comment a=apply ?=help q=quit",
                    running
                )
            }
        };

        let paragraph = Paragraph::new(status_text)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    /// Render the help overlay.
    fn render_help(&self, frame: &mut Frame) {
        let help_text = vec![
            "Review Coach - Keyboard Shortcuts",
            "",
            "Pipeline:",
            "  r             - Run the review pipeline",
            "  R (Shift+R)   - Reset the run",
            "  m             - Toggle project memory",
            "",
            "Navigation:",
            "  Tab           - Next file",
            "  Shift+Tab     - Previous file",
            "  j / Down      - Next comment",
            "  k / Up        - Previous comment",
            "  s             - Next scenario",
            "  Ctrl+d/PgDn   - Scroll diff down",
            "  Ctrl+u/PgUp   - Scroll diff up",
            "",
            "Actions:",
            "  a             - Apply the selected comment's patch",
            "",
            "Other:",
            "  ?             - Show this help",
            "  q / Esc       - Quit",
            "",
            "Press any key to close this help",
        ];

        let text = Text::from(help_text.iter().map(|&s| Line::from(s)).collect::<Vec<_>>());
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });

        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Setup the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Launch the interactive walkthrough.
///
/// The loop redraws every ~100ms; simulated pipeline and check-state
/// timers advance through `session.tick` on each iteration.
pub fn run_tui(mut app: App) -> Result<()> {
    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let result = (|| -> Result<()> {
        loop {
            app.session.tick(Instant::now());

            terminal
                .draw(|f| app.render(f))
                .context("Failed to draw frame")?;

            if app.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100)).context("Failed to poll events")?
                && let Event::Key(key) = event::read().context("Failed to read event")?
                && key.kind == event::KeyEventKind::Press
            {
                app.handle_input(key);
            }
        }
        Ok(())
    })();

    restore_terminal(&mut terminal)?;

    result
}
