//! Chat with the Vugasu Kennels assistant in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;
use vugasu_chat::core::SubmitOutcome;
use vugasu_chat::core::conversation::{Message, Sender};
use vugasu_chat::core::store::{ConversationStore, FileBackend};
use vugasu_chat::{CONTACT_EMAIL, CONTACT_PHONE, Widget, WidgetBuilder};
use vugasu_chat_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

const BAR_CHAR: &str = "▎";

const HELP: &str = "\
/quick [N]   show the suggestions, or put suggestion N into the input
/clear       start the conversation over
/export      save the conversation to a text file
/share       print the conversation for sharing
/mute        mute or unmute reply notifications
/minimize    collapse or restore the chat window
/close       close the chat window
/open        open the chat window
/history     print the whole conversation
/help        show this help
/quit        leave";

enum Command<'a> {
    Quick(Option<&'a str>),
    Clear,
    Export,
    Share,
    Mute,
    Minimize,
    Close,
    Open,
    History,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let rest = line.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (rest, None),
        };
        Some(match name {
            "quick" => Self::Quick(arg.filter(|arg| !arg.is_empty())),
            "clear" => Self::Clear,
            "export" => Self::Export,
            "share" => Self::Share,
            "mute" => Self::Mute,
            "minimize" => Self::Minimize,
            "close" => Self::Close,
            "open" => Self::Open,
            "history" => Self::History,
            "help" => Self::Help,
            "quit" => Self::Quit,
            _ => Self::Unknown(name),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };

    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config = config.with_model(model);
    }
    let provider = OpenAIProvider::new(config.build());

    let Some(data_dir) = data_dir() else {
        eprintln!("cannot find a data directory, set VUGASU_CHAT_DIR");
        return;
    };
    if let Err(err) = std::fs::create_dir_all(&data_dir) {
        eprintln!("cannot create {}: {err}", data_dir.display());
        return;
    }
    debug!("storing history in {}", data_dir.display());

    let store = ConversationStore::new(FileBackend::new(data_dir));
    let mut widget = WidgetBuilder::with_chat_provider(provider)
        .with_store(store)
        .on_error(|err| warn!("assistant failed ({}): {}", err.kind(), err.cause()))
        .build();
    widget.toggle_open();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    print_history(&widget);
    print_quick_replies(&widget);

    loop {
        prompt(&widget);

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();

        if let Some(command) = Command::parse(line) {
            match command {
                Command::Quit => break,
                command => run_command(&mut widget, command).await,
            }
            continue;
        }

        if !widget.view().open {
            println!("The chat is closed, type /open to open it.");
            continue;
        }

        // An empty line sends what a quick reply put into the input.
        let text = if line.is_empty() {
            widget.controller().draft()
        } else {
            line.to_owned()
        };

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("Assistant is typing...");

        let outcome = {
            let send = widget.send(&text);
            tokio::pin!(send);
            loop {
                select! {
                    outcome = &mut send => break outcome,
                    _ = sleep(Duration::from_millis(100)) => progress_bar.inc(1),
                }
            }
        };
        progress_bar.finish_and_clear();

        let notify = widget.should_notify(&outcome);
        match outcome {
            SubmitOutcome::Replied(reply) => {
                if notify {
                    print!("\x07");
                }
                if widget.view().minimized {
                    println!("New message from the assistant, /minimize to read it.");
                } else {
                    print_message(&reply);
                }
            }
            SubmitOutcome::Failed(error) => {
                println!("{}{}", BAR_CHAR.bright_red(), error.bright_red());
            }
            SubmitOutcome::Discarded => {
                debug!("reply discarded");
            }
            SubmitOutcome::Ignored => {}
        }
    }
}

async fn run_command(widget: &mut Widget, command: Command<'_>) {
    match command {
        Command::Quick(None) => {
            widget.toggle_quick_replies();
            if widget.view().show_quick_replies {
                print_quick_replies(widget);
            }
        }
        Command::Quick(Some(arg)) => {
            let chosen = arg
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| widget.choose_quick_reply(index));
            match chosen {
                Some(reply) => {
                    println!("{}", reply.prompt.bright_white());
                    println!("Press Enter to send it.");
                }
                None => println!("No such suggestion: {arg}"),
            }
        }
        Command::Clear => {
            print!("Are you sure you want to clear the chat history? [y/N]: ");
            std::io::stdout().flush().ok();
            let Some(answer) = read_line().await else {
                return;
            };
            if answer.trim().eq_ignore_ascii_case("y") {
                widget.clear_history();
                print_history(widget);
                print_quick_replies(widget);
            }
        }
        Command::Export => {
            let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            match widget.export_to(&dir, Local::now().date_naive()) {
                Ok(path) => println!("Saved to {}", path.display()),
                Err(err) => {
                    error!("failed to export history: {err}");
                    println!("Could not save the conversation: {err}");
                }
            }
        }
        Command::Share => {
            println!("{}", widget.share_text());
        }
        Command::Mute => {
            widget.toggle_muted();
            let state = if widget.view().muted { "off" } else { "on" };
            println!("Notifications are {state}.");
        }
        Command::Minimize => {
            widget.toggle_minimized();
            if !widget.view().minimized {
                print_history(widget);
            }
        }
        Command::Close => {
            if widget.view().open {
                widget.toggle_open();
            }
        }
        Command::Open => {
            if !widget.view().open {
                widget.toggle_open();
                print_history(widget);
            }
        }
        Command::History => print_history(widget),
        Command::Help => {
            println!("{HELP}");
            println!();
            println!("Call us at {CONTACT_PHONE} or write to {CONTACT_EMAIL}.");
        }
        Command::Unknown(name) => {
            println!("Unknown command /{name}, type /help for the list.");
        }
        Command::Quit => {}
    }
}

fn prompt(widget: &Widget) {
    let view = widget.view();
    if !view.open {
        print!("(closed) ");
    } else if view.minimized {
        print!("(minimized) ");
    }
    print!("> ");
    std::io::stdout().flush().ok();
}

fn print_message(msg: &Message) {
    let time = msg.timestamp().with_timezone(&Local).format("%-I:%M %p");
    match msg.sender() {
        Sender::Assistant => println!(
            "{}{} {}",
            BAR_CHAR.bright_cyan(),
            msg.content().bright_white(),
            time.dimmed()
        ),
        Sender::User => println!(
            "{}{} {}",
            BAR_CHAR.bright_green(),
            msg.content(),
            time.dimmed()
        ),
    }
}

fn print_history(widget: &Widget) {
    for msg in widget.controller().messages() {
        print_message(&msg);
    }
    if let Some(error) = widget.controller().error() {
        println!("{}{}", BAR_CHAR.bright_red(), error.bright_red());
    }
}

fn print_quick_replies(widget: &Widget) {
    if !widget.view().show_quick_replies {
        return;
    }
    let labels = widget
        .quick_replies()
        .iter()
        .enumerate()
        .map(|(index, reply)| format!("[{}] {}", index + 1, reply.label))
        .collect::<Vec<_>>();
    println!("{}", labels.join("  ").dimmed());
}

fn data_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os("VUGASU_CHAT_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::data_local_dir().map(|dir| dir.join("vugasu-chat"))
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
