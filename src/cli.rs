use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Text,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io::stdout, sync::Arc};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use sc_voting::Candidate;

use crate::CliError;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Wallet private key; signs in immediately when provided
    #[arg(short = 'K', long)]
    pub private_key: Option<String>,
}

/// Everything the app pushes at the terminal task.
pub enum Msg {
    Input(Message),
    Refresh(String),
    Session(Option<String>),
    Candidates(Vec<Candidate>),
    NominatePending(bool),
    VotePending(bool),
    Alert(String),
    Exit,
}

#[derive(Clone)]
pub enum Message {
    System(String),
    Error(String),
}

#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Commands {
    /// Sign in with a wallet private key
    Login { private_key: String },
    /// Close the wallet session
    Logout,
    /// Nominate a new candidate
    Nominate {
        candidate_id: String,
        /// Optional candidate metadata as a JSON object of strings
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Cast a vote for a candidate
    Vote { candidate_id: String },
    /// Re-query the candidate list
    Refresh,
    Exit,
}

pub async fn event_handler(
    messages_tx: Sender<Msg>,
    cli_tx: Sender<Commands>,
    token: CancellationToken,
) -> Result<(), CliError> {
    let mut input = String::new();
    loop {
        if let Event::Key(key) = tokio::task::spawn_blocking(event::read).await?? {
            match key.code {
                KeyCode::Char(c) => {
                    input.push(c);
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => {
                    let line: String = std::mem::take(&mut input);
                    let args = shlex::split(&line).ok_or(CliError::SplitLineError)?;
                    let cli = Cli::try_parse_from(args);
                    if cli.is_err() {
                        messages_tx
                            .send(Msg::Input(Message::System("Unknown command".to_string())))
                            .await
                            .map_err(|err| CliError::SenderError(err.to_string()))?;
                        continue;
                    }
                    cli_tx
                        .send(cli.unwrap().command)
                        .await
                        .map_err(|err| CliError::SenderError(err.to_string()))?;
                }
                KeyCode::Esc => {
                    messages_tx
                        .send(Msg::Exit)
                        .await
                        .map_err(|err| CliError::SenderError(err.to_string()))?;
                    token.cancel();
                    break;
                }
                _ => {}
            }
            messages_tx
                .send(Msg::Refresh(input.clone()))
                .await
                .map_err(|err| CliError::SenderError(err.to_string()))?;
        }
    }
    Ok::<_, CliError>(())
}

/// Everything the renderer needs for one frame.
#[derive(Default)]
pub struct ViewState {
    pub messages: Vec<(DateTime<Local>, Message)>,
    pub input: String,
    pub session: Option<String>,
    pub candidates: Vec<Candidate>,
    pub nominate_pending: bool,
    pub vote_pending: bool,
    pub alert: Option<String>,
}

pub fn ui(f: &mut Frame, view: &ViewState) {
    match &view.session {
        None => ui_signed_out(f, view),
        Some(account_id) => ui_signed_in(f, view, account_id),
    }
    if let Some(alert) = &view.alert {
        ui_alert(f, alert);
    }
}

fn ui_signed_out(f: &mut Frame, view: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(8), Constraint::Length(3)].as_ref())
        .split(f.size());

    let welcome = Paragraph::new(Text::raw(
        "\nWelcome, it is time to vote!\n\n\
         Sign in with your wallet to see the candidates:\n\n\
         $ login <private-key>\n\n\
         Press Esc to quit.",
    ))
    .block(Block::default().borders(Borders::ALL).title("de-vote"))
    .wrap(Wrap { trim: false });

    f.render_widget(welcome, chunks[0]);
    f.render_widget(messages_list(view), chunks[1]);
    f.render_widget(input_line(view), chunks[2]);
}

fn ui_signed_in(f: &mut Frame, view: &ViewState, account_id: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(8),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let candidate_items: Vec<ListItem> = view
        .candidates
        .iter()
        .map(|candidate| {
            let mut content = format!(
                "{}  {} votes",
                candidate.candidate_id, candidate.votes
            );
            if let Some(metadata) = &candidate.metadata {
                if let Ok(json) = serde_json::to_string(metadata) {
                    content.push_str(&format!("  {json}"));
                }
            }
            ListItem::new(content).style(Style::default().fg(Color::LightGreen))
        })
        .collect();

    let candidate_list = List::new(candidate_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("candidates ({account_id})")),
    );

    let status = Paragraph::new(Text::raw(format!(
        " nominate: {} | vote: {} | commands: nominate <id>, vote <id>, refresh, logout, exit",
        pending_label(view.nominate_pending),
        pending_label(view.vote_pending),
    )))
    .style(Style::default().fg(Color::DarkGray));

    f.render_widget(candidate_list, chunks[0]);
    f.render_widget(messages_list(view), chunks[1]);
    f.render_widget(status, chunks[2]);
    f.render_widget(input_line(view), chunks[3]);
}

fn pending_label(pending: bool) -> &'static str {
    if pending {
        "in flight"
    } else {
        "idle"
    }
}

fn messages_list<'a>(view: &'a ViewState) -> List<'a> {
    let message_items: Vec<ListItem> = view
        .messages
        .iter()
        .map(|(stamp, message)| {
            let (content, style) = match message {
                Message::System(msg) => (
                    format!("{} [System]: {}", stamp.format("%H:%M:%S"), msg),
                    Style::default(),
                ),
                Message::Error(msg) => (
                    format!("{} [Error]: {}", stamp.format("%H:%M:%S"), msg),
                    Style::default().fg(Color::LightRed),
                ),
            };
            ListItem::new(content).style(style)
        })
        .collect();

    List::new(message_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("messages history"),
    )
}

fn input_line<'a>(view: &'a ViewState) -> Paragraph<'a> {
    Paragraph::new(Text::raw(&view.input))
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title("input line"))
        .wrap(Wrap { trim: false })
}

fn ui_alert(f: &mut Frame, alert: &str) {
    let area = centered_rect(60, 20, f.size());
    let popup = Paragraph::new(Text::raw(format!("{alert}\n\nPress any key to dismiss")))
        .style(Style::default().fg(Color::LightRed))
        .block(Block::default().borders(Borders::ALL).title("error"))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

pub async fn terminal_handler(
    mut messages_rx: Receiver<Msg>,
    token: CancellationToken,
) -> Result<(), CliError> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Arc::new(Mutex::new(Terminal::new(backend)?));

    let view = Arc::new(Mutex::new(ViewState::default()));

    let view_clone = Arc::clone(&view);
    while let Some(msg) = messages_rx.recv().await {
        match msg {
            Msg::Input(m) => {
                let mut view = view_clone.lock().await;
                view.messages.push((Local::now(), m));
                if view.messages.len() == 100 {
                    view.messages.remove(0);
                }
            }
            Msg::Refresh(i) => {
                let mut view = view_clone.lock().await;
                view.input = i;
                // any key press dismisses the alert popup
                view.alert = None;
            }
            Msg::Session(session) => {
                let mut view = view_clone.lock().await;
                if session.is_none() {
                    view.candidates.clear();
                    view.nominate_pending = false;
                    view.vote_pending = false;
                }
                view.session = session;
            }
            Msg::Candidates(candidates) => {
                view_clone.lock().await.candidates = candidates;
            }
            Msg::NominatePending(pending) => {
                view_clone.lock().await.nominate_pending = pending;
            }
            Msg::VotePending(pending) => {
                view_clone.lock().await.vote_pending = pending;
            }
            Msg::Alert(text) => {
                view_clone.lock().await.alert = Some(text);
            }
            Msg::Exit => {
                token.cancel();
                break;
            }
        };

        let view = Arc::clone(&view_clone);
        let terminal = Arc::clone(&terminal);
        tokio::task::spawn_blocking(move || {
            let view = view.blocking_lock();
            terminal
                .blocking_lock()
                .draw(|f| ui(f, &view))
                .unwrap();
        })
        .await?;
    }

    // Restore terminal
    disable_raw_mode()?;
    let mut terminal_lock = terminal.lock().await;
    execute!(terminal_lock.backend_mut(), LeaveAlternateScreen)?;
    terminal_lock.show_cursor()?;
    Ok(())
}
