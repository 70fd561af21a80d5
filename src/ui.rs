use crate::drag::{DropEvent, DropTarget, Reconciliation};
use crate::logging::logging_status;
use crate::model::{Board, BoardError, List, Task};
use crate::storage::{BoardLocation, FileStore};
use crate::workspace::{Workspace, WorkspaceError};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List as ListWidget, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(workspace: Workspace<FileStore>, location: &BoardLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(workspace, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    ws: Workspace<FileStore>,
    selected_list: usize,
    selected_task: usize,
    last_save: Option<Instant>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Prompt(Prompt),
    Grabbing(Grab),
    ConfirmDeleteList { list_id: String },
    Notice(String),
}

enum PromptAction {
    AddTask { list_id: String },
    EditTask { list_id: String, task_id: String },
    AddList,
    RenameList { list_id: String },
}

struct Prompt {
    action: PromptAction,
    field: FieldValue,
}

/// A card picked up by the keyboard. The view moves it around its own copy of
/// the hovered list's order; the model is untouched until the drop.
struct Grab {
    task_id: String,
    source_list: usize,
    hover_list: usize,
    order: Vec<String>,
    pos: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        let end = self.cursor;
        self.move_left();
        self.value.drain(self.cursor..end);
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl Grab {
    /// Carries the card over another list at the same height, clamped to the
    /// end of that list.
    fn carry_to(&mut self, list_idx: usize, list_order: Vec<String>) {
        let mut order: Vec<String> = list_order
            .into_iter()
            .filter(|id| *id != self.task_id)
            .collect();
        let pos = self.pos.min(order.len());
        order.insert(pos, self.task_id.clone());
        self.hover_list = list_idx;
        self.order = order;
        self.pos = pos;
    }

    /// Neighbor under the card, or empty list space when the list holds nothing else.
    fn drop_event(&self, list_id: &str) -> DropEvent {
        let neighbor = self
            .order
            .get(self.pos + 1)
            .or_else(|| self.pos.checked_sub(1).and_then(|p| self.order.get(p)));
        let target = match neighbor {
            Some(task_id) => DropTarget::Task {
                list_id: list_id.to_string(),
                task_id: task_id.clone(),
            },
            None => DropTarget::ListSpace {
                list_id: list_id.to_string(),
            },
        };
        DropEvent {
            target,
            visual_order: self.order.clone(),
        }
    }
}

impl App {
    fn new(ws: Workspace<FileStore>, location: &BoardLocation) -> Self {
        let mut status = format!("Loaded board from {}", location.dir.display());
        if let Some((level, log_dir)) = logging_status() {
            status.push_str(&format!(" (log: {} at {})", level, log_dir.display()));
        }
        App {
            ws,
            selected_list: 0,
            selected_task: 0,
            last_save: None,
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        if self.ws.drag().is_active() {
            self.ws.drag_cancel();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Prompt(prompt) => self.handle_prompt_key(prompt, key),
            Mode::Grabbing(grab) => self.handle_grab_key(grab, key),
            Mode::ConfirmDeleteList { list_id } => self.handle_confirm_key(list_id, key),
            Mode::Notice(_) => {}
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Left | KeyCode::Char('h') => self.prev_list(),
            KeyCode::Right | KeyCode::Char('l') => self.next_list(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_task(),
            KeyCode::Char('a') => {
                if let Some(list) = self.current_list() {
                    let list_id = list.id.clone();
                    self.open_prompt(PromptAction::AddTask { list_id }, "");
                }
            }
            KeyCode::Char('e') => {
                if let Some((list, task)) = self.current_task() {
                    let action = PromptAction::EditTask {
                        list_id: list.id.clone(),
                        task_id: task.id.clone(),
                    };
                    let text = task.text.clone();
                    self.open_prompt(action, &text);
                }
            }
            KeyCode::Char('x') | KeyCode::Char(' ') => {
                if let Some((list_id, task_id)) = self.current_ids() {
                    let result = self.ws.toggle_task(&list_id, &task_id).map(|_| ());
                    self.report(result, "Toggled task");
                }
            }
            KeyCode::Char('d') => {
                if let Some((list_id, task_id)) = self.current_ids() {
                    let result = self.ws.delete_task(&list_id, &task_id).map(|_| ());
                    self.report(result, "Deleted task");
                    self.clamp_selection();
                }
            }
            KeyCode::Char('L') => self.open_prompt(PromptAction::AddList, ""),
            KeyCode::Char('r') => {
                if let Some(list) = self.current_list() {
                    let action = PromptAction::RenameList {
                        list_id: list.id.clone(),
                    };
                    let name = list.name.clone();
                    self.open_prompt(action, &name);
                }
            }
            KeyCode::Char('D') => {
                if let Some(list) = self.current_list() {
                    let (list_id, name) = (list.id.clone(), list.name.clone());
                    self.status = format!("Delete list {} and its tasks? (y/n)", name);
                    self.mode = Mode::ConfirmDeleteList { list_id };
                }
            }
            KeyCode::Char('g') => self.grab_selected(),
            _ => {}
        }
        false
    }

    fn handle_prompt_key(&mut self, mut prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.status = "Canceled".into(),
            KeyCode::Enter => {
                if !self.submit_prompt(&prompt) {
                    self.mode = Mode::Prompt(prompt);
                }
                return;
            }
            KeyCode::Left => prompt.field.move_left(),
            KeyCode::Right => prompt.field.move_right(),
            KeyCode::Backspace => prompt.field.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    prompt.field.insert_char(c);
                }
            }
            _ => {}
        }
        if key.code != KeyCode::Esc {
            self.mode = Mode::Prompt(prompt);
        }
    }

    /// `false` keeps the prompt open so the user can fix the input.
    fn submit_prompt(&mut self, prompt: &Prompt) -> bool {
        let text = prompt.field.value.as_str();
        let result = match &prompt.action {
            PromptAction::AddTask { list_id } => self.ws.add_task(list_id, text).map(|_| ()),
            PromptAction::EditTask { list_id, task_id } => {
                self.ws.edit_task(list_id, task_id, text).map(|_| ())
            }
            PromptAction::AddList => {
                let name = text.trim();
                let result = self
                    .ws
                    .add_list((!name.is_empty()).then_some(name))
                    .map(|_| ());
                self.selected_list = self.ws.board().lists.len() - 1;
                self.selected_task = 0;
                result
            }
            PromptAction::RenameList { list_id } => {
                self.ws.rename_list(list_id, text).map(|_| ())
            }
        };
        if let Err(WorkspaceError::Board(BoardError::EmptyText)) = result {
            self.status = "Task text cannot be empty".into();
            return false;
        }
        self.report(result, "Saved");
        true
    }

    fn handle_confirm_key(&mut self, list_id: String, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.ws.delete_list(&list_id) {
                    Err(WorkspaceError::Board(BoardError::LastList)) => {
                        self.status = "Delete canceled".into();
                        self.mode =
                            Mode::Notice("A board needs at least one list; this one stays.".into());
                    }
                    result => self.report(result.map(|_| ()), "Deleted list"),
                }
                self.clamp_selection();
            }
            _ => self.status = "Delete canceled".into(),
        }
    }

    fn grab_selected(&mut self) {
        let Some((list_id, task_id)) = self.current_ids() else {
            self.status = "No task selected to move".into();
            return;
        };
        let order = self.visual_order(self.selected_list);
        let pos = order.iter().position(|id| *id == task_id).unwrap_or(0);
        self.ws.drag_start(&list_id, &task_id);
        self.status = "Moving task (arrows move, Enter drops, Esc cancels)".into();
        self.mode = Mode::Grabbing(Grab {
            task_id,
            source_list: self.selected_list,
            hover_list: self.selected_list,
            order,
            pos,
        });
    }

    fn handle_grab_key(&mut self, mut grab: Grab, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.ws.drag_cancel();
                self.status = "Move canceled".into();
                return;
            }
            KeyCode::Enter | KeyCode::Char('g') => {
                self.finish_grab(&grab);
                return;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if grab.pos > 0 {
                    grab.order.swap(grab.pos, grab.pos - 1);
                    grab.pos -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if grab.pos + 1 < grab.order.len() {
                    grab.order.swap(grab.pos, grab.pos + 1);
                    grab.pos += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if grab.hover_list > 0 {
                    let target = grab.hover_list - 1;
                    self.hover(&mut grab, target);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let target = grab.hover_list + 1;
                if target < self.ws.board().lists.len() {
                    self.hover(&mut grab, target);
                }
            }
            _ => {}
        }
        self.mode = Mode::Grabbing(grab);
    }

    fn hover(&self, grab: &mut Grab, list_idx: usize) {
        grab.carry_to(list_idx, self.visual_order(list_idx));
    }

    fn finish_grab(&mut self, grab: &Grab) {
        let Some(list_id) = self.ws.board().lists.get(grab.hover_list).map(|l| l.id.clone())
        else {
            self.ws.drag_cancel();
            return;
        };
        let event = grab.drop_event(&list_id);
        match self.ws.drop_on(&event) {
            Ok(outcome) => {
                let changed = outcome.changed();
                info!(
                    "event=tui_drop module=ui changed={} source_list={} target_list={}",
                    changed, grab.source_list, grab.hover_list
                );
                let board = self.ws.board();
                let status = drop_summary(board, &outcome);
                let landed = outcome
                    .affected_lists()
                    .last()
                    .and_then(|id| board.list_index(id));
                let task_pos = board.locate_task(&grab.task_id).map(|(_, t)| t);
                self.status = status;
                self.selected_list = landed.unwrap_or(grab.source_list);
                self.selected_task = task_pos.unwrap_or(0);
                if changed {
                    self.last_save = Some(Instant::now());
                }
            }
            Err(err) => {
                self.status = format!("Moved, but not saved: {}", err);
                self.selected_list = grab.hover_list;
                self.selected_task = grab.pos;
            }
        }
        self.clamp_selection();
    }

    fn open_prompt(&mut self, action: PromptAction, initial: &str) {
        self.status = "Enter to save, Esc to cancel".into();
        self.mode = Mode::Prompt(Prompt {
            action,
            field: FieldValue::new(initial),
        });
    }

    fn report(&mut self, result: Result<(), WorkspaceError>, ok_message: &str) {
        match result {
            Ok(()) => {
                self.status = ok_message.to_string();
                self.last_save = Some(Instant::now());
            }
            Err(WorkspaceError::Persist(err)) => {
                self.status = format!("Changed, but not saved: {}", err);
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    /// Ids of `list_idx` in the order the view shows them, including an
    /// in-flight grab.
    fn visual_order(&self, list_idx: usize) -> Vec<String> {
        if let Mode::Grabbing(grab) = &self.mode {
            if grab.hover_list == list_idx {
                return grab.order.clone();
            }
        }
        let ids = self
            .ws
            .board()
            .lists
            .get(list_idx)
            .map(List::task_ids)
            .unwrap_or_default();
        match &self.mode {
            Mode::Grabbing(grab) => ids.into_iter().filter(|id| *id != grab.task_id).collect(),
            _ => ids,
        }
    }

    fn current_list(&self) -> Option<&List> {
        self.ws.board().lists.get(self.selected_list)
    }

    fn current_task(&self) -> Option<(&List, &Task)> {
        let list = self.current_list()?;
        list.tasks.get(self.selected_task).map(|t| (list, t))
    }

    fn current_ids(&self) -> Option<(String, String)> {
        self.current_task()
            .map(|(list, task)| (list.id.clone(), task.id.clone()))
    }

    fn prev_list(&mut self) {
        if self.selected_list > 0 {
            self.selected_list -= 1;
            self.clamp_selection();
        }
    }

    fn next_list(&mut self) {
        if self.selected_list + 1 < self.ws.board().lists.len() {
            self.selected_list += 1;
            self.clamp_selection();
        }
    }

    fn next_task(&mut self) {
        let len = self.current_list().map(|l| l.tasks.len()).unwrap_or(0);
        if self.selected_task + 1 < len {
            self.selected_task += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let lists = self.ws.board().lists.len();
        self.selected_list = self.selected_list.min(lists.saturating_sub(1));
        let tasks = self.current_list().map(|l| l.tasks.len()).unwrap_or(0);
        self.selected_task = self.selected_task.min(tasks.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(2),
            ])
            .split(f.size());
        self.draw_header(f, layout[0]);
        self.draw_board(f, layout[1]);
        self.draw_footer(f, layout[2]);
        match &self.mode {
            Mode::Prompt(prompt) => self.draw_prompt(f, prompt),
            Mode::Notice(message) => draw_notice(f, message),
            _ => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let board = self.ws.board();
        let saved = self
            .last_save
            .map(format_elapsed)
            .unwrap_or_else(|| "not yet".into());
        let line = Line::from(vec![
            Span::styled(
                " taskboard ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} lists, {} tasks  saved {}",
                board.lists.len(),
                board.task_count(),
                saved
            )),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_board(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let board = self.ws.board();
        let constraints = board
            .lists
            .iter()
            .map(|_| Constraint::Ratio(1, board.lists.len() as u32))
            .collect::<Vec<_>>();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let grab = match &self.mode {
            Mode::Grabbing(grab) => Some(grab),
            _ => None,
        };
        for (idx, list) in board.lists.iter().enumerate() {
            let accent = color_for_index(idx);
            let order = self.visual_order(idx);
            let items: Vec<ListItem> = if order.is_empty() {
                vec![ListItem::new(Span::styled(
                    "No tasks yet",
                    Style::default().fg(Color::DarkGray),
                ))]
            } else {
                order
                    .iter()
                    .filter_map(|id| board.locate_task(id))
                    .map(|(l_idx, t_idx)| {
                        let task = &board.lists[l_idx].tasks[t_idx];
                        task_item(task, grab.is_some_and(|g| g.task_id == task.id))
                    })
                    .collect()
            };

            let focused = match grab {
                Some(g) => g.hover_list == idx,
                None => idx == self.selected_list,
            };
            let mut state = ListState::default();
            if focused && !order.is_empty() {
                state.select(Some(match grab {
                    Some(g) => g.pos,
                    None => self.selected_task,
                }));
            }
            let block = Block::default()
                .title(Span::styled(
                    format!("{} ({})", list.name, list.tasks.len()),
                    Style::default().fg(accent).add_modifier(if focused {
                        Modifier::BOLD | Modifier::UNDERLINED
                    } else {
                        Modifier::BOLD
                    }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent));
            let widget = ListWidget::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            f.render_stateful_widget(widget, chunks[idx], &mut state);
        }
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.mode {
            Mode::Grabbing(_) => "↑↓ reorder  ←→ other list  Enter drop  Esc cancel",
            Mode::Prompt(_) => "Enter save  Esc cancel",
            Mode::ConfirmDeleteList { .. } => "y confirm  any other key cancels",
            Mode::Notice(_) => "any key to dismiss",
            Mode::Normal => {
                "a add  e edit  x toggle  d delete  g move  L new list  r rename  D delete list  q quit"
            }
        };
        let lines = vec![
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(Span::styled(help, Style::default().fg(Color::Gray))),
        ];
        f.render_widget(Paragraph::new(lines), area);
    }

    fn draw_prompt(&self, f: &mut ratatui::Frame<'_>, prompt: &Prompt) {
        let title = match prompt.action {
            PromptAction::AddTask { .. } => "New task",
            PromptAction::EditTask { .. } => "Edit task",
            PromptAction::AddList => "New list",
            PromptAction::RenameList { .. } => "Rename list",
        };
        let area = centered_rect(60, 3, f.size());
        f.render_widget(Clear, area);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(Paragraph::new(prompt.field.with_caret()).block(block), area);
    }
}

fn draw_notice(f: &mut ratatui::Frame<'_>, message: &str) {
    let area = centered_rect(60, 3, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title("Notice")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightRed));
    f.render_widget(Paragraph::new(message.to_string()).block(block), area);
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (u32::from(r.width) * u32::from(percent_x) / 100) as u16;
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + r.height.saturating_sub(height) / 2,
        width,
        height: height.min(r.height),
    }
}

fn color_for_index(idx: usize) -> Color {
    const PALETTE: [Color; 5] = [
        Color::LightCyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightYellow,
        Color::LightBlue,
    ];
    PALETTE[idx % PALETTE.len()]
}

fn task_item(task: &Task, grabbed: bool) -> ListItem<'static> {
    let mark = if task.done { "[x] " } else { "[ ] " };
    let mut style = Style::default().fg(if task.done {
        Color::DarkGray
    } else {
        Color::White
    });
    if task.done {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if grabbed {
        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }
    ListItem::new(Line::from(vec![
        Span::raw(mark),
        Span::styled(task.text.clone(), style),
    ]))
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Status line after a drop, naming each touched list with its task count.
fn drop_summary(board: &Board, outcome: &Reconciliation) -> String {
    let lists: Vec<String> = outcome
        .affected_lists()
        .into_iter()
        .map(|id| match board.list(id) {
            Some(list) => format!("{} ({})", list.name, list.tasks.len()),
            None => id.to_string(),
        })
        .collect();
    match outcome {
        Reconciliation::Moved { .. } => format!("Moved task: {}", lists.join(" -> ")),
        Reconciliation::Reordered { .. } => format!("Reordered task in {}", lists.join(", ")),
        Reconciliation::Unchanged(reason) => format!("Nothing to move ({:?})", reason),
    }
}
