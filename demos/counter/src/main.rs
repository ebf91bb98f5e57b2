//! Counter - Minimal tui-lifecycle demo
//!
//! Three components share one store:
//! - counter: rebuilt whenever the store publishes a new state
//! - parity: reads a typed slice (even/odd) and only rebuilds when it flips
//! - help: never rebuilds
//!
//! Rebuild requests arrive over a channel; the loop redraws only then.
//!
//! Keys: j/Down = decrement, k/Up = increment, q = quit

use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::{
    event::{self, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tui_lifecycle::prelude::*;

// ============================================================================
// State - What the app knows
// ============================================================================

#[derive(Clone, Default)]
struct AppState {
    count: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Parity {
    Even,
    Odd,
}

impl Parity {
    fn of(count: i32) -> Self {
        if count % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

// ============================================================================
// Actions - What can happen
// ============================================================================

#[derive(Clone, Debug, Action)]
enum AppAction {
    #[action(category = "count")]
    Increment,
    #[action(category = "count")]
    Decrement,
    Quit,
}

fn reducer(state: &mut AppState, action: AppAction) -> bool {
    match action {
        AppAction::Increment => {
            state.count += 1;
            true
        }
        AppAction::Decrement => {
            state.count -= 1;
            true
        }
        AppAction::Quit => false,
    }
}

// ============================================================================
// Components - Views over the store
// ============================================================================

type Panel = Paragraph<'static>;

fn counter_view(state: &AppState, _: &dyn Fn(AppAction), _: &Context<AppState, AppAction>) -> Panel {
    let block = Block::default()
        .title(" Counter ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    Paragraph::new(state.count.to_string())
        .alignment(Alignment::Center)
        .block(block)
}

fn parity_view(parity: &Parity, _: &dyn Fn(AppAction), _: &Context<Parity, AppAction>) -> Panel {
    let (label, color) = match parity {
        Parity::Even => ("even", Color::Green),
        Parity::Odd => ("odd", Color::Yellow),
    };
    Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color))
}

fn help_view(_: &AppState, _: &dyn Fn(AppAction), _: &Context<AppState, AppAction>) -> Panel {
    Paragraph::new("k/Up: +1  j/Down: -1  q: quit")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
}

/// Context that exposes only the parity of the count
fn parity_context(store: &Store<AppState, AppAction>) -> LogicContext<Parity, AppAction> {
    let read = store.clone();
    let send = store.clone();
    let watch = store.clone();
    LogicContext::new(
        "parity",
        move || Rc::new(Parity::of(read.state().count)),
        move |action: AppAction| {
            send.dispatch(action);
        },
        move |listener| watch.subscribe(listener),
    )
}

fn log_lifecycle<S>(event: Lifecycle, ctx: &LogicContext<S, AppAction>) {
    debug!(component = %ctx.name(), lifecycle = %event, "lifecycle");
}

// ============================================================================
// Main - Setup terminal, run event loop, cleanup
// ============================================================================

#[tokio::main]
async fn main() -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>) -> io::Result<()> {
    let store = Store::with_middleware(AppState::default(), reducer, LoggingMiddleware::new());
    let (scheduler, mut rebuild_rx) = ChannelScheduler::new();
    let scheduler: Rc<dyn RebuildScheduler> = Rc::new(scheduler);

    let counter = Component::new("counter", view_builder(counter_view))
        .on_lifecycle(log_lifecycle)
        .mount(&store, Rc::clone(&scheduler));
    let parity = Component::new("parity", view_builder(parity_view))
        .should_update(UpdatePolicy::by_value())
        .on_lifecycle(log_lifecycle)
        .mount_with(parity_context(&store), Rc::clone(&scheduler));
    let help = Component::new("help", view_builder(help_view))
        .should_update(UpdatePolicy::Never)
        .mount(&store, Rc::clone(&scheduler));

    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<KeyCode>();
    let cancel_token = CancellationToken::new();
    let _poller = spawn_key_poller(key_tx, Duration::from_millis(10), cancel_token.clone());

    let mut should_render = true;

    loop {
        if should_render {
            terminal.draw(|frame| {
                let area = frame.area();
                let [_, center, _, help_area] = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(6),
                    Constraint::Fill(1),
                    Constraint::Length(1),
                ])
                .areas(area);
                let [_, center, _] = Layout::horizontal([
                    Constraint::Fill(1),
                    Constraint::Length(30),
                    Constraint::Fill(1),
                ])
                .flex(Flex::Center)
                .areas(center);
                let [counter_area, parity_area] =
                    Layout::vertical([Constraint::Length(5), Constraint::Length(1)]).areas(center);

                frame.render_widget(counter.build(), counter_area);
                frame.render_widget(parity.build(), parity_area);
                frame.render_widget(help.build(), help_area);
            })?;
            should_render = false;
        }

        tokio::select! {
            Some(code) = key_rx.recv() => {
                let action = match code {
                    KeyCode::Char('k') | KeyCode::Up => Some(AppAction::Increment),
                    KeyCode::Char('j') | KeyCode::Down => Some(AppAction::Decrement),
                    KeyCode::Char('q') | KeyCode::Esc => Some(AppAction::Quit),
                    _ => None,
                };
                match action {
                    Some(AppAction::Quit) => break,
                    Some(action) => {
                        store.dispatch(action);
                    }
                    None => {}
                }
            }

            Some(request) = rebuild_rx.recv() => {
                debug!(host = %request.host, "rebuild requested");
                // one redraw covers every request already queued
                while rebuild_rx.try_recv().is_ok() {}
                should_render = true;
            }
        }
    }

    cancel_token.cancel();
    info!(count = store.state().count, "counter exiting");
    help.dispose();
    parity.dispose();
    counter.dispose();
    Ok(())
}

/// Forward key presses from crossterm until cancelled
fn spawn_key_poller(
    tx: mpsc::UnboundedSender<KeyCode>,
    poll_timeout: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    while event::poll(Duration::ZERO).unwrap_or(false) {
                        let _ = event::read();
                    }
                    break;
                }
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    while event::poll(poll_timeout).unwrap_or(false) {
                        if let Ok(event::Event::Key(key)) = event::read() {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            if tx.send(key.code).is_err() {
                                debug!("key channel closed, stopping poller");
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}
