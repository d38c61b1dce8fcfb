use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use charsheet_terminal::character::{Ability, format_modifier};
use charsheet_terminal::config::Config;
use charsheet_terminal::dice::OverlayPhase;
use charsheet_terminal::http_client;
use charsheet_terminal::provider;
use charsheet_terminal::state::{
    self, AppState, CombatAction, LoadStatus, ProviderCommand, StatBox, Tab, apply_delta,
    load_status_label,
};

/// Screen areas from the last draw, used to route mouse clicks.
#[derive(Debug, Default)]
struct HitRegions {
    tabs: Vec<(Rect, Tab)>,
    stat_boxes: Vec<(Rect, Ability)>,
    actions: Vec<(Rect, usize)>,
}

struct App {
    state: AppState,
    config: Config,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    regions: HitRegions,
}

impl App {
    fn new(config: Config, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            config,
            should_quit: false,
            cmd_tx,
            regions: HitRegions::default(),
        }
    }

    fn startup(&mut self) {
        self.send_command(ProviderCommand::CheckHealth);
        match self.config.character_id {
            Some(id) => self.request_character(id),
            None => self
                .state
                .push_log("[INFO] No character id given; showing blank sheet"),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('1') => self.state.switch_tab(Tab::Abilities),
            KeyCode::Char('2') => self.state.switch_tab(Tab::Combat),
            KeyCode::Char('3') => self.state.switch_tab(Tab::Console),
            KeyCode::Tab => self.state.next_tab(),
            KeyCode::BackTab => self.state.prev_tab(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            _ => match self.state.active_tab {
                Tab::Abilities => self.on_abilities_key(key, now),
                Tab::Combat => self.on_combat_key(key, now),
                Tab::Console => self.on_console_key(key),
            },
        }
    }

    fn on_abilities_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('l') | KeyCode::Right => self.state.select_next_ability(),
            KeyCode::Char('h') | KeyCode::Left => self.state.select_prev_ability(),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('k') | KeyCode::Up => {
                // Two rows of three: vertical moves jump a whole row.
                for _ in 0..3 {
                    self.state.select_next_ability();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let ability = self.state.selected_ability;
                self.state.roll_ability(ability, now);
            }
            _ => {}
        }
    }

    fn on_combat_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next_action(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_action(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.state.roll_selected_action(now);
            }
            _ => {}
        }
    }

    fn on_console_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.console_scroll = self.state.console_scroll.saturating_add(1)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.console_scroll = self.state.console_scroll.saturating_sub(1)
            }
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (col, row) = (mouse.column, mouse.row);
        let now = Instant::now();

        if let Some(tab) = hit(&self.regions.tabs, col, row) {
            self.state.switch_tab(tab);
            return;
        }
        if let Some(ability) = hit(&self.regions.stat_boxes, col, row) {
            self.state.selected_ability = ability;
            self.state.roll_ability(ability, now);
            return;
        }
        if let Some(idx) = hit(&self.regions.actions, col, row) {
            self.state.selected_action = idx;
            self.state.roll_selected_action(now);
        }
    }

    fn reload(&mut self) {
        match self.state.character_id {
            Some(id) => self.request_character(id),
            None => self.state.push_log("[INFO] Nothing to reload"),
        }
    }

    fn request_character(&mut self, id: u32) {
        self.state.begin_load(id);
        if !self.send_command(ProviderCommand::FetchCharacter { id }) {
            self.state.load_status = LoadStatus::Failed {
                id,
                error: "fetch unavailable".to_string(),
            };
        }
    }

    fn send_command(&mut self, cmd: ProviderCommand) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Provider unavailable");
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider request failed");
            return false;
        }
        true
    }
}

fn hit<T: Copy>(regions: &[(Rect, T)], col: u16, row: u16) -> Option<T> {
    regions
        .iter()
        .find(|(r, _)| col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height)
        .map(|(_, value)| *value)
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = Config::from_env_and_args();
    http_client::init_http_client(config.http_timeout)
        .map_err(|err| io::Error::other(format!("{err:#}")))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _ = provider::spawn_character_provider(config.api_base.clone(), tx, cmd_rx);

    let mut app = App::new(config, Some(cmd_tx));
    app.startup();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.tick_overlay(Instant::now());

        let mut regions = HitRegions::default();
        terminal.draw(|f| regions = ui(f, &app.state))?;
        app.regions = regions;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) -> HitRegions {
    let mut regions = HitRegions::default();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_lines(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_tab_bar(frame, chunks[1], state, &mut regions);

    match state.active_tab {
        Tab::Abilities => render_abilities(frame, chunks[2], state, &mut regions),
        Tab::Combat => render_combat(frame, chunks[2], state, &mut regions),
        Tab::Console => render_console(frame, chunks[2], state),
    }

    let footer = Paragraph::new(footer_text(state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if state.overlay.is_some() {
        render_dice_overlay(frame, chunks[2], state);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    regions
}

fn header_lines(state: &AppState) -> Vec<Line<'static>> {
    let sheet = &state.sheet;
    let title = Line::from(vec![
        Span::styled(
            sheet.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  Level {}  Class {}",
            sheet.level, sheet.class_name
        )),
    ]);
    let status_style = match state.load_status {
        LoadStatus::Failed { .. } => Style::default().fg(Color::Red),
        LoadStatus::Loading { .. } => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    };
    let status = Line::from(Span::styled(
        load_status_label(&state.load_status),
        status_style,
    ));
    vec![title, status]
}

fn render_tab_bar(frame: &mut Frame, area: Rect, state: &AppState, regions: &mut HitRegions) {
    let panels = state.tab_panels();
    let widths: Vec<Constraint> = panels
        .iter()
        .map(|p| Constraint::Length(p.tab.title().len() as u16 + 6))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);

    for (i, panel) in panels.iter().enumerate() {
        let style = if panel.trigger_active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let text = format!(" {} {} ", panel.tab.index() + 1, panel.tab.title());
        frame.render_widget(
            Paragraph::new(text).style(style).alignment(Alignment::Center),
            cols[i],
        );
        regions.tabs.push((cols[i], panel.tab));
    }
}

fn render_abilities(frame: &mut Frame, area: Rect, state: &AppState, regions: &mut HitRegions) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    for (row_idx, row_area) in rows.iter().take(2).enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(*row_area);
        for (col_idx, cell) in cols.iter().enumerate() {
            let ability = Ability::ALL[row_idx * 3 + col_idx];
            let stat = state.sheet.stat_box(ability);
            render_stat_box(frame, *cell, stat, ability == state.selected_ability);
            regions.stat_boxes.push((*cell, ability));
        }
    }

    let hint = Paragraph::new("Click a box or press Enter to roll d20 + modifier")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, rows[2]);
}

fn render_stat_box(frame: &mut Frame, area: Rect, stat: &StatBox, selected: bool) {
    let border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(format!(" {} ", stat.ability.short_code()))
        .borders(Borders::ALL)
        .border_style(border_style);
    let lines = vec![
        Line::from(Span::styled(
            stat.score_text(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(stat.modifier_text()),
        Line::from(Span::styled(
            stat.label.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_combat(frame: &mut Frame, area: Rect, state: &AppState, regions: &mut HitRegions) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[0]);

    let sheet = &state.sheet;
    let ratio = hp_ratio(state);
    let hp_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.25 {
        Color::Yellow
    } else {
        Color::Red
    };
    let gauge = Gauge::default()
        .block(Block::default().title("Hit Points").borders(Borders::ALL))
        .gauge_style(Style::default().fg(hp_color))
        .ratio(ratio)
        .label(format!("{} / {}", sheet.current_hp, sheet.max_hp));
    frame.render_widget(gauge, left[0]);

    let defenses = [
        format!("Armor Class   {}", sheet.armor_class),
        format!("Initiative    {}", sheet.initiative),
        format!("Proficiency   {}", sheet.proficiency),
    ]
    .join("\n");
    let defenses = Paragraph::new(defenses)
        .block(Block::default().title("Defense").borders(Borders::ALL));
    frame.render_widget(defenses, left[1]);

    let block = Block::default().title("Actions").borders(Borders::ALL);
    let inner = block.inner(columns[1]);
    frame.render_widget(block, columns[1]);

    for (i, action) in state.combat_actions().into_iter().enumerate() {
        if i as u16 >= inner.height {
            break;
        }
        let row = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        let selected = i == state.selected_action;
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let prefix = if selected { "> " } else { "  " };
        let text = format!("{prefix}{}  {}", action.label(), action_dice_text(state, action));
        frame.render_widget(Paragraph::new(text).style(style), row);
        regions.actions.push((row, i));
    }
}

fn action_dice_text(state: &AppState, action: CombatAction) -> String {
    match action {
        CombatAction::Initiative => format!(
            "d20{}",
            format_modifier(state.current_modifier(Ability::Dexterity))
        ),
        CombatAction::HitDie => {
            let die = state
                .class_info
                .as_ref()
                .and_then(|c| c.hit_die)
                .unwrap_or(1);
            format!(
                "d{die}{}",
                format_modifier(state.current_modifier(Ability::Constitution))
            )
        }
        CombatAction::DeathSave => "d20".to_string(),
    }
}

fn hp_ratio(state: &AppState) -> f64 {
    let Some(record) = &state.character else {
        return 0.0;
    };
    if record.max_hp <= 0 {
        return 0.0;
    }
    (record.current_hp as f64 / record.max_hp as f64).clamp(0.0, 1.0)
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = if state.logs.is_empty() {
        "No messages yet".to_string()
    } else {
        state.logs.iter().cloned().collect::<Vec<_>>().join("\n")
    };
    let console = Paragraph::new(text)
        .block(Block::default().title("Console").borders(Borders::ALL))
        .scroll((state.console_scroll, 0));
    frame.render_widget(console, area);
}

fn render_dice_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(overlay) = &state.overlay else {
        return;
    };
    let width = area.width.min(44);
    let height = area.height.min(3);
    if width == 0 || height == 0 {
        return;
    }
    let popup = Rect {
        x: area.x + area.width - width,
        y: area.y + area.height - height,
        width,
        height,
    };

    let result = &overlay.result;
    let mut style = if result.is_natural_max() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if result.is_natural_one() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    if overlay.phase == OverlayPhase::Hiding {
        style = style.add_modifier(Modifier::DIM);
    }

    frame.render_widget(Clear, popup);
    let line = Line::from(vec![
        Span::styled(
            format!("{}: ", result.label),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(result.total.to_string(), style),
        Span::styled(
            format!(" ({})", result.breakdown()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line)
        .block(
            Block::default()
                .title(format!(" d{} ", result.die))
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, popup);
}

fn footer_text(state: &AppState) -> String {
    match state.active_tab {
        Tab::Abilities => {
            "1/2/3 Tabs | h/l/←/→ Select | j/k/↑/↓ Row | Enter Roll | r Reload | ? Help | q Quit"
                .to_string()
        }
        Tab::Combat => "1/2/3 Tabs | j/k/↑/↓ Select | Enter Roll | r Reload | ? Help | q Quit".to_string(),
        Tab::Console => "1/2/3 Tabs | j/k/↑/↓ Scroll | r Reload | ? Help | q Quit".to_string(),
    }
}

const HELP_LINES: &[&str] = &[
    "Character Sheet - Help",
    "",
    "Global:",
    "  1 / 2 / 3    Abilities / Combat / Console",
    "  Tab          Next tab",
    "  Shift-Tab    Previous tab",
    "  r            Reload character",
    "  ?            Toggle help",
    "  Esc          Close help",
    "  q            Quit",
    "",
    "Abilities:",
    "  h/l or ←/→   Select stat box",
    "  j/k or ↑/↓   Jump to the other row",
    "  Enter/Space  Roll d20 + modifier",
    "",
    "Combat:",
    "  j/k or ↑/↓   Select action",
    "  Enter/Space  Roll action",
    "",
    "Console:",
    "  j/k or ↑/↓   Scroll",
    "",
    "Mouse: click tabs, stat boxes and actions",
];

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let help = Paragraph::new(HELP_LINES.join("\n"))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
