//! Interactive console: reads lines from stdin, runs slash commands, sends
//! everything else as a message.
//!
//! Network work (classification requests and `/health`) runs in a
//! [`JoinSet`]; results are applied to the [`App`] on this task only, so the
//! loop never blocks on the service. Runs until `shutdown` is cancelled
//! (Ctrl-C), input closes, or `/quit`.

use std::io::Write as _;
use std::path::PathBuf;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::backend::BackendError;
use crate::compose::SUGGESTIONS;
use crate::dispatch::Completion;
use crate::error::AppError;
use crate::payload::HealthResponse;
use crate::render::{message_view, welcome_view};

const HELP: &str = "\
Type a message and press Enter to send it. An empty line sends the prefilled
input or pending attachments.

  /new              start a new consultation
  /list             show consultations
  /open <n>         switch to consultation n
  /delete <n>       delete consultation n
  /attach <path>    attach a file to the next message
  /detach <n>       remove pending attachment n
  /suggest [n]      show suggestions, or prefill suggestion n
  /details          raw payload of the latest analysis
  /theme            toggle light/dark
  /sidebar          toggle the consultation list
  /health           check the classification service
  /help             this text
  /quit             exit";

/// One parsed input line. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Help,
    New,
    List,
    Open(usize),
    Delete(usize),
    Theme,
    Sidebar,
    Attach(PathBuf),
    Detach(usize),
    Suggest(Option<usize>),
    Details,
    Health,
    Quit,
}

/// Parse one input line. Lines not starting with `/` are messages; an
/// `Err` carries a usage hint for the user.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "help" | "?" => Ok(Command::Help),
        "new" => Ok(Command::New),
        "list" | "ls" => Ok(Command::List),
        "open" => index_arg(arg, "/open <n>").map(Command::Open),
        "delete" | "rm" => index_arg(arg, "/delete <n>").map(Command::Delete),
        "theme" => Ok(Command::Theme),
        "sidebar" => Ok(Command::Sidebar),
        "attach" if !arg.is_empty() => Ok(Command::Attach(PathBuf::from(arg))),
        "attach" => Err("usage: /attach <path>".to_string()),
        "detach" => index_arg(arg, "/detach <n>").map(Command::Detach),
        "suggest" if arg.is_empty() => Ok(Command::Suggest(None)),
        "suggest" => index_arg(arg, "/suggest [n]").map(|i| Command::Suggest(Some(i))),
        "details" => Ok(Command::Details),
        "health" => Ok(Command::Health),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command /{other} (try /help)")),
    }
}

/// 1-based user index to 0-based.
fn index_arg(arg: &str, usage: &str) -> Result<usize, String> {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| format!("usage: {usage}"))
}

enum Flow {
    Continue,
    Quit,
}

/// Result of a background task.
enum Outcome {
    Reply(Completion),
    Health(Result<HealthResponse, BackendError>),
}

/// Run on stdin.
pub async fn run(app: App, shutdown: CancellationToken) -> Result<(), AppError> {
    run_with(app, BufReader::new(tokio::io::stdin()), shutdown).await?;
    Ok(())
}

/// Run on any line source. Returns the app for inspection once the loop ends.
pub async fn run_with<R>(mut app: App, input: R, shutdown: CancellationToken) -> Result<App, AppError>
where
    R: AsyncBufRead + Unpin,
{
    info!("console started");
    println!("{}", "─────────────────────────────────".dimmed());
    println!(" {}  (/help for commands, Ctrl-C to quit)", app.assistant_name().bold());
    println!("{}", "─────────────────────────────────".dimmed());
    if app.sidebar_open() {
        print_list(&app);
    }
    print_active(&app);

    let mut lines = input.lines();
    let mut tasks: JoinSet<Outcome> = JoinSet::new();

    loop {
        prompt(&app);

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!("console shutting down");
                break;
            }

            Some(joined) = tasks.join_next() => match joined {
                Ok(Outcome::Reply(completion)) => on_completion(&mut app, completion),
                Ok(Outcome::Health(result)) => print_health(result),
                Err(e) => warn!(error = %e, "background task failed"),
            },

            line = lines.next_line() => match line {
                Err(e) => {
                    warn!("input read error: {e}");
                    break;
                }
                Ok(None) => {
                    info!("input closed");
                    break;
                }
                Ok(Some(input)) => {
                    debug!(len = input.len(), "console line");
                    match parse_command(&input) {
                        Ok(command) => {
                            if let Flow::Quit = handle(&mut app, &mut tasks, command) {
                                break;
                            }
                        }
                        Err(usage) => println!("{}", usage.yellow()),
                    }
                }
            },
        }
    }

    if !tasks.is_empty() {
        info!(pending = tasks.len(), "abandoning in-flight tasks");
        tasks.abort_all();
    }
    Ok(app)
}

fn handle(app: &mut App, tasks: &mut JoinSet<Outcome>, command: Command) -> Flow {
    match command {
        Command::Send(text) => {
            if !text.is_empty() {
                app.composer_mut().set_input(text);
            }
            send(app, tasks);
        }
        Command::Help => println!("{HELP}"),
        Command::New => {
            app.new_consultation();
            if app.sidebar_open() {
                print_list(app);
            }
            print_active(app);
        }
        Command::List => print_list(app),
        Command::Open(index) => match app.open(index).map(|_| ()) {
            Ok(()) => print_active(app),
            Err(e) => println!("{}", e.to_string().yellow()),
        },
        Command::Delete(index) => match app.delete(index) {
            Ok(title) => {
                println!("deleted \"{title}\"");
                if app.sidebar_open() {
                    print_list(app);
                }
            }
            Err(e) => println!("{}", e.to_string().yellow()),
        },
        Command::Theme => println!("theme: {}", app.store_mut().toggle_theme()),
        Command::Sidebar => {
            if app.toggle_sidebar() {
                print_list(app);
            } else {
                println!("sidebar hidden");
            }
        }
        Command::Attach(path) => match app.composer_mut().attach(&path) {
            Ok(att) => println!("📎 {} ({}, {} bytes)", att.name, att.mime_type, att.size),
            Err(e) => println!("{}", e.to_string().yellow()),
        },
        Command::Detach(index) => match app.composer_mut().remove_attachment(index) {
            Some(att) => println!("removed {}", att.name),
            None => println!("{}", format!("no pending attachment #{}", index + 1).yellow()),
        },
        Command::Suggest(None) => {
            for (i, s) in SUGGESTIONS.iter().enumerate() {
                println!("  {}. {} {}: {}", i + 1, s.icon, s.title.bold(), s.description);
            }
        }
        Command::Suggest(Some(index)) => match app.composer_mut().apply_suggestion(index) {
            Some(prompt) => println!("input: {prompt}\n{}", "(press Enter to send)".dimmed()),
            None => println!("{}", format!("no suggestion #{}", index + 1).yellow()),
        },
        Command::Details => match app.latest_details() {
            Some(data) => match serde_json::to_string_pretty(data) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!(error = %e, "cannot serialise payload"),
            },
            None => println!("{}", "no analysis details in this consultation".dimmed()),
        },
        Command::Health => {
            let backend = app.dispatcher().backend().clone();
            tasks.spawn(async move { Outcome::Health(backend.health().await) });
            println!("{}", "checking service…".dimmed());
        }
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn print_health(result: Result<HealthResponse, BackendError>) {
    match result {
        Ok(h) => {
            let threshold = h
                .confidence_threshold
                .map(|t| format!(", threshold {t}"))
                .unwrap_or_default();
            println!("\nservice: {} (model loaded: {}{threshold})", h.status, h.model_loaded);
        }
        Err(e) => println!("\n{}", format!("service unreachable: {e}").red()),
    }
}

fn send(app: &mut App, tasks: &mut JoinSet<Outcome>) {
    let pending = match app.submit() {
        Ok(Some(pending)) => pending,
        Ok(None) => return,
        Err(e) => {
            println!("{}", e.to_string().red());
            return;
        }
    };

    let theme = app.store().theme();
    if let Some(message) = app
        .store()
        .get(&pending.consultation_id)
        .and_then(|c| c.messages.iter().find(|m| m.id == pending.request_id))
    {
        println!("{}", message_view(message, theme, app.assistant_name()));
    }
    println!("{}", format!("{} is typing…", app.assistant_name()).dimmed().italic());

    let dispatcher = app.dispatcher().clone();
    tasks.spawn(async move { Outcome::Reply(dispatcher.fetch(pending).await) });
}

fn on_completion(app: &mut App, completion: Completion) {
    let consultation_id = completion.pending.consultation_id.clone();
    let reply_id = match app.finish(completion) {
        Ok(id) => id,
        Err(e) => {
            warn!(consultation = %consultation_id, error = %e, "reply dropped");
            return;
        }
    };

    let store = app.store();
    let Some(consultation) = store.get(&consultation_id) else {
        return;
    };
    if store.active_id() != Some(consultation_id.as_str()) {
        println!("\n{}", format!("↳ reply saved to \"{}\"", consultation.title).dimmed());
        return;
    }
    if let Some(reply) = consultation.messages.iter().find(|m| m.id == reply_id) {
        println!("\n{}", message_view(reply, store.theme(), app.assistant_name()));
    }
}

fn print_active(app: &App) {
    let theme = app.store().theme();
    match app.store().active() {
        Some(c) if !c.is_empty() => {
            println!("{}", format!("── {} ──", c.title).bold());
            for message in &c.messages {
                println!("{}\n", message_view(message, theme, app.assistant_name()));
            }
            if app.is_typing(&c.id) {
                println!("{}", format!("{} is typing…", app.assistant_name()).dimmed().italic());
            }
        }
        _ => println!("{}", welcome_view(theme)),
    }
}

fn print_list(app: &App) {
    let store = app.store();
    if store.consultations().is_empty() {
        println!("{}", "no consultations yet".dimmed());
        return;
    }
    println!("{}", "Recent Consultations".bold());
    for (i, c) in store.consultations().iter().enumerate() {
        let marker = if store.active_id() == Some(c.id.as_str()) { "▸" } else { " " };
        let typing = if app.is_typing(&c.id) { " …" } else { "" };
        println!("{marker} {}. {}{typing}", i + 1, c.title);
    }
}

fn prompt(app: &App) {
    match app.composer().attachments().len() {
        0 => print!("> "),
        n => print!("[📎{n}] > "),
    }
    let _ = std::io::stdout().flush();
}
