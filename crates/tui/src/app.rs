use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use innkeep_core::{
    desk::{Confirmation, FrontDesk, RestoreOutcome},
    payment::PaymentClerk,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 64;

const MENU_ITEMS: [&str; 5] = [
    "Show Available Rooms",
    "Make Reservation",
    "Cancel Reservation",
    "View Reservations",
    "Quit",
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Rooms,
    Reserve,
    Cancel,
    Reservations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReserveField {
    Customer,
    Category,
}

#[derive(Debug, Clone)]
struct ReserveForm {
    customer: String,
    category: String,
    focus: ReserveField,
}

impl ReserveForm {
    fn new() -> Self {
        Self {
            customer: String::new(),
            category: String::new(),
            focus: ReserveField::Customer,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            ReserveField::Customer => ReserveField::Category,
            ReserveField::Category => ReserveField::Customer,
        };
    }

    fn insert(&mut self, ch: char) {
        let field = match self.focus {
            ReserveField::Customer => &mut self.customer,
            ReserveField::Category => &mut self.category,
        };
        if field.len() >= MAX_INPUT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            field.push(ch);
        }
    }

    fn backspace(&mut self) {
        let field = match self.focus {
            ReserveField::Customer => &mut self.customer,
            ReserveField::Category => &mut self.category,
        };
        field.pop();
    }
}

#[derive(Debug, Clone, Default)]
struct CancelPrompt {
    input: String,
}

impl CancelPrompt {
    fn append_digit(&mut self, ch: char) {
        if ch.is_ascii_digit() && self.input.len() < MAX_INPUT_LEN {
            self.input.push(ch);
        }
    }

    fn backspace(&mut self) {
        self.input.pop();
    }

    fn value(&self) -> Option<u32> {
        self.input.parse::<u32>().ok()
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    PaymentSettled { reservation_id: u32 },
}

/// High-level application state for the terminal UI.
pub struct InnkeepApp {
    desk: FrontDesk,
    clerk: PaymentClerk,
    screen: Screen,
    menu_cursor: usize,
    reserve_form: Option<ReserveForm>,
    cancel_prompt: Option<CancelPrompt>,
    status: String,
    pending_payment: Option<u32>,
    should_quit: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl InnkeepApp {
    pub fn new(desk: FrontDesk, clerk: PaymentClerk, restore: RestoreOutcome) -> Self {
        let status = match restore {
            RestoreOutcome::Fresh => "Ready — starting with an empty ledger".to_string(),
            RestoreOutcome::Restored { reservations } => {
                format!("Restored {reservations} reservation(s) from the saved ledger")
            }
            RestoreOutcome::Failed { reason } => {
                warn!("ledger restore failed: {reason}");
                format!("Saved ledger could not be read ({reason}); starting empty")
            }
        };
        Self {
            desk,
            clerk,
            screen: Screen::Menu,
            menu_cursor: 0,
            reserve_form: None,
            cancel_prompt: None,
            status,
            pending_payment: None,
            should_quit: false,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Event::Key(key) = event {
                    if let Err(err) = self.handle_key(key) {
                        self.status = format!("Error: {err}");
                    }
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::PaymentSettled { reservation_id }) => {
                if self.pending_payment == Some(reservation_id) {
                    self.pending_payment = None;
                }
                info!(reservation = reservation_id, "payment settled");
                self.status = format!("Payment settled for reservation #{reservation_id}");
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Rooms | Screen::Reservations => self.handle_listing_key(key),
            Screen::Reserve => self.handle_reserve_key(key),
            Screen::Cancel => self.handle_cancel_key(key),
        }
        Ok(())
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1).min(MENU_ITEMS.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Char(ch @ '1'..='5') => {
                self.menu_cursor = ch as usize - '1' as usize;
                self.activate_menu_item();
            }
            KeyCode::Enter => self.activate_menu_item(),
            _ => {}
        }
    }

    fn activate_menu_item(&mut self) {
        match self.menu_cursor {
            0 => {
                self.screen = Screen::Rooms;
                self.status = format!("{} room(s) available", self.desk.available_rooms().len());
            }
            1 => {
                self.screen = Screen::Reserve;
                self.reserve_form = Some(ReserveForm::new());
                self.status = "Enter customer name and room category".to_string();
            }
            2 => {
                self.screen = Screen::Cancel;
                self.cancel_prompt = Some(CancelPrompt::default());
                self.status = "Enter the reservation id to cancel".to_string();
            }
            3 => {
                self.screen = Screen::Reservations;
                self.status = format!("{} reservation(s) on the ledger", self.desk.reservations().len());
            }
            4 => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_listing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
                self.status = "Ready".to_string();
            }
            _ => {}
        }
    }

    fn handle_reserve_key(&mut self, key: KeyEvent) {
        let Some(form) = self.reserve_form.as_mut() else {
            self.screen = Screen::Menu;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.reserve_form = None;
                self.screen = Screen::Menu;
                self.status = "Reservation cancelled before booking".to_string();
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Down => form.focus = ReserveField::Category,
            KeyCode::Up => form.focus = ReserveField::Customer,
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_reservation(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    form.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_cancel_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.cancel_prompt.as_mut() else {
            self.screen = Screen::Menu;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.cancel_prompt = None;
                self.screen = Screen::Menu;
                self.status = "Cancellation aborted".to_string();
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Enter => self.submit_cancellation(),
            KeyCode::Char(ch) => prompt.append_digit(ch),
            _ => {}
        }
    }

    fn submit_reservation(&mut self) {
        let Some(form) = self.reserve_form.clone() else {
            return;
        };
        let customer = form.customer.trim().to_string();
        let category = form.category.trim().to_string();
        if customer.is_empty() {
            self.status = "Customer name is required".to_string();
            return;
        }
        if category.is_empty() {
            self.status = "Room category is required".to_string();
            return;
        }

        match self.desk.reserve(&customer, &category) {
            Ok(confirmation) => {
                info!(
                    reservation = confirmation.reservation.id,
                    room = confirmation.reservation.room_id,
                    customer = %confirmation.reservation.customer,
                    "reservation created"
                );
                self.status = booking_message(&confirmation);
                self.begin_settlement(confirmation.reservation.id);
                self.reserve_form = None;
                self.screen = Screen::Menu;
            }
            Err(err) => {
                // Leave the form up so the user can try another category.
                self.status = err.to_string();
            }
        }
    }

    fn submit_cancellation(&mut self) {
        let Some(prompt) = self.cancel_prompt.clone() else {
            return;
        };
        let Some(id) = prompt.value() else {
            self.status = "Enter a numeric reservation id".to_string();
            return;
        };

        match self.desk.cancel(id) {
            Ok(confirmation) => {
                info!(
                    reservation = confirmation.reservation.id,
                    room = confirmation.reservation.room_id,
                    "reservation cancelled"
                );
                let mut message = format!(
                    "Reservation #{} cancelled — room {} is available again",
                    confirmation.reservation.id, confirmation.reservation.room_id
                );
                if let Some(reason) = &confirmation.persist_error {
                    message.push_str(&format!(" (not saved: {reason})"));
                }
                self.status = message;
                self.cancel_prompt = None;
                self.screen = Screen::Menu;
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    fn begin_settlement(&mut self, reservation_id: u32) {
        let Some(sender) = self.event_tx.clone() else {
            warn!("event channel unavailable; skipping payment simulation");
            return;
        };
        self.pending_payment = Some(reservation_id);
        let clerk = self.clerk.clone();
        spawn(async move {
            clerk.settle(reservation_id).await;
            let _ = sender.send(AppEvent::PaymentSettled { reservation_id }).await;
        });
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Rooms => self.draw_rooms(frame),
            Screen::Reservations => self.draw_reservations(frame),
            Screen::Reserve => self.draw_reserve(frame),
            Screen::Cancel => self.draw_cancel(frame),
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let banner = Paragraph::new(vec![
            Line::from(Span::styled(
                "INNKEEP",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Room Booking Ledger",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(banner, chunks[0]);

        let menu_height = (MENU_ITEMS.len() as u16).saturating_add(2).min(chunks[1].height);
        let menu_width = 34.min(chunks[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, chunks[1]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {}. {item}", idx + 1),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {}. {item}", idx + 1),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Left);
        frame.render_widget(menu, menu_area);

        self.render_status(frame, chunks[2]);
    }

    fn draw_rooms(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let available = self.desk.available_rooms();
        let items: Vec<ListItem> = if available.is_empty() {
            vec![ListItem::new(Line::from("  No rooms available"))]
        } else {
            available
                .iter()
                .map(|room| {
                    ListItem::new(Line::from(vec![
                        Span::styled("● ", Style::default().fg(self.theme.success)),
                        Span::raw(room.display_name()),
                    ]))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Available Rooms (Esc to return)"),
        );
        frame.render_widget(list, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn draw_reservations(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let items: Vec<ListItem> = if self.desk.reservations().is_empty() {
            vec![ListItem::new(Line::from("  No reservations on the ledger"))]
        } else {
            self.desk
                .reservations()
                .iter()
                .map(|reservation| {
                    let room_label = self
                        .desk
                        .room(reservation.room_id)
                        .map(|room| room.display_name())
                        .unwrap_or_else(|| format!("Room {}", reservation.room_id));
                    let timestamp = reservation.reserved_at.format("%Y-%m-%d %H:%M");
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("#{:<4}", reservation.id),
                            Style::default().fg(self.theme.accent),
                        ),
                        Span::raw(format!(
                            "{}  —  {}  [{}]",
                            reservation.customer, room_label, timestamp
                        )),
                    ]))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("All Reservations (Esc to return)"),
        );
        frame.render_widget(list, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn draw_reserve(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        self.render_status(frame, chunks[1]);

        let Some(form) = self.reserve_form.as_ref() else {
            return;
        };

        let modal = centered_rect(50.min(area.width), 9.min(area.height), chunks[0]);
        frame.render_widget(Clear, modal);

        let field_line = |label: &str, value: &str, focused: bool| {
            let style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            let cursor = if focused { "█" } else { "" };
            Line::from(Span::styled(format!("{label}: {value}{cursor}"), style))
        };

        let lines = vec![
            field_line(
                "Customer",
                &form.customer,
                form.focus == ReserveField::Customer,
            ),
            field_line(
                "Category",
                &form.category,
                form.focus == ReserveField::Category,
            ),
            Line::from(""),
            Line::from(Span::styled(
                self.availability_summary(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(Span::styled(
                "Tab switches fields • Enter books • Esc cancels",
                Style::default().fg(self.theme.muted),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Make Reservation"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, modal);
    }

    fn draw_cancel(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        self.render_status(frame, chunks[1]);

        let Some(prompt) = self.cancel_prompt.as_ref() else {
            return;
        };

        let modal = centered_rect(46.min(area.width), 6.min(area.height), chunks[0]);
        frame.render_widget(Clear, modal);

        let lines = vec![
            Line::from(Span::styled(
                format!("Reservation ID: {}█", prompt.input),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter confirms • Esc aborts",
                Style::default().fg(self.theme.muted),
            )),
        ];

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Cancel Reservation"),
        );
        frame.render_widget(paragraph, modal);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.status.starts_with("Error")
            || self.status.contains("not found")
            || self.status.contains("no available")
        {
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(self.theme.danger),
            ))
        } else {
            Line::from(self.status.clone())
        };
        let mut secondary = format!(
            "Reservations: {} • Free rooms: {}",
            self.desk.reservations().len(),
            self.desk.available_rooms().len()
        );
        if let Some(id) = self.pending_payment {
            secondary.push_str(&format!(" • processing payment for #{id}…"));
        }
        let paragraph = Paragraph::new(vec![
            primary,
            Line::from(Span::styled(
                secondary,
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn availability_summary(&self) -> String {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for room in self.desk.available_rooms() {
            match counts
                .iter_mut()
                .find(|(category, _)| category.eq_ignore_ascii_case(&room.category))
            {
                Some((_, count)) => *count += 1,
                None => counts.push((room.category.clone(), 1)),
            }
        }
        if counts.is_empty() {
            return "No rooms available".to_string();
        }
        let parts: Vec<String> = counts
            .iter()
            .map(|(category, count)| format!("{category} ×{count}"))
            .collect();
        format!("Available: {}", parts.join(" • "))
    }
}

fn booking_message(confirmation: &Confirmation) -> String {
    let mut message = format!(
        "Reservation #{} confirmed: {} in {} (room {})",
        confirmation.reservation.id,
        confirmation.reservation.customer,
        confirmation.category,
        confirmation.reservation.room_id
    );
    if let Some(reason) = &confirmation.persist_error {
        message.push_str(&format!(" (not saved: {reason})"));
    }
    message.push_str(" • processing payment…");
    message
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
