//! Chat with the squad in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use devsquad::command::{self, Command, HELP, Input};
use devsquad::core::artifact::latest_previewable;
use devsquad::core::catalog::{PERSONAS, TEMPLATES, TOOLS};
use devsquad::core::{
    CONNECTION_ERROR_MESSAGE, Controller, ControllerBuilder, ControllerUpdate,
    PREVIEW_SANDBOX, SendError,
};
use devsquad::render::{self, BAR_CHAR};
use devsquad_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

enum Flow {
    Continue,
    Send(String),
    Quit,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) =
        env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY"))
    else {
        eprintln!("GEMINI_API_KEY environment variable is not set");
        return;
    };

    let mut config = GeminiConfigBuilder::with_api_key(api_key);
    if let Ok(model) = env::var("GEMINI_MODEL") {
        config = config.with_model(model);
    }
    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let model_provider = GeminiProvider::new(config.build());
    let mut controller =
        ControllerBuilder::with_model_provider(model_provider).build();

    let preview_dir = env::var_os("DEVSQUAD_PREVIEW_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!(
        "{}{} Tell the squad what to build, or type /help.",
        BAR_CHAR.bright_blue(),
        "DevSquad".bold()
    );

    loop {
        match controller.selected_persona() {
            Some(persona) => print!("@{} > ", persona.name),
            None => print!("> "),
        }
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let input = match command::parse_input(&line) {
            Ok(input) => input,
            Err(err) => {
                println!("{}", err.to_string().bright_red());
                continue;
            }
        };

        let message = match input {
            Input::Message(message) => message,
            Input::Command(command) => {
                match handle_command(&mut controller, command, &preview_dir) {
                    Flow::Continue => continue,
                    Flow::Send(message) => message,
                    Flow::Quit => break,
                }
            }
        };

        match controller.send(&message) {
            Ok(()) => {}
            Err(SendError::EmptyInput) => continue,
            Err(err) => {
                println!("{}", err.to_string().bright_red());
                continue;
            }
        }

        run_exchange(&mut controller, &progress_style).await;
    }
}

async fn run_exchange(controller: &mut Controller, style: &ProgressStyle) {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style.clone());
    progress_bar.set_message("🤔 Thinking...");

    loop {
        progress_bar.inc(1);

        let sleep = sleep(Duration::from_millis(100));
        let update = select! {
            update = controller.next_update() => update,
            _ = sleep => {
                continue;
            }
        };

        match update {
            Some(ControllerUpdate::Streaming) => {
                if let Some(reply) = controller.messages().last() {
                    let segments = controller.segments(reply);
                    progress_bar.set_message(render::activity_label(
                        controller.status(),
                        &segments,
                    ));
                }
            }
            Some(ControllerUpdate::Completed { new_artifacts }) => {
                progress_bar.finish_and_clear();
                if let Some(reply) = controller.messages().last() {
                    let segments = controller.segments(reply);
                    print!("{}", render::render_reply(&segments));
                }
                if new_artifacts > 0 {
                    println!(
                        "{}",
                        format!(
                            "📦 {new_artifacts} new artifact(s), see /artifacts"
                        )
                        .dimmed()
                    );
                }
                println!();
                break;
            }
            Some(ControllerUpdate::Failed(kind)) => {
                progress_bar.finish_and_clear();
                println!("{}", CONNECTION_ERROR_MESSAGE.bright_red());
                println!("{}", format!("({kind})").dimmed());
                println!();
                break;
            }
            None => {
                progress_bar.finish_and_clear();
                break;
            }
        }
    }
}

fn handle_command(
    controller: &mut Controller,
    command: Command,
    preview_dir: &Path,
) -> Flow {
    match command {
        Command::Reset => {
            controller.reset_project();
            println!("{}", "Started a new project.".dimmed());
        }
        Command::DirectMessage(persona) => {
            if controller.select_persona(persona) {
                println!(
                    "Next message goes to {}.",
                    format!("@{}", persona.name).bold()
                );
            } else {
                println!("{}", "Direct message cancelled.".dimmed());
            }
        }
        Command::Tool(tool) => {
            let state = if controller.toggle_tool(tool) {
                "enabled".bright_green().to_string()
            } else {
                "disabled".dimmed().to_string()
            };
            println!("{} {state}.", tool.name.bold());
        }
        Command::Tools => {
            let enabled = controller.active_tools();
            print!("{}", render::render_tools(&TOOLS, enabled));
        }
        Command::Template(template) => {
            println!(
                "{}",
                format!("Starting from template: {}", template.name).dimmed()
            );
            return Flow::Send(template.prompt.to_owned());
        }
        Command::Templates => {
            print!("{}", render::render_templates(&TEMPLATES));
        }
        Command::Team => {
            print!("{}", render::render_team(&PERSONAS));
        }
        Command::Artifacts => {
            println!("{}", render::render_artifacts(controller.artifacts()));
        }
        Command::Preview(index) => {
            let artifacts = controller.artifacts();
            let artifact = match index {
                Some(n) => artifacts.get(n - 1),
                None => latest_previewable(artifacts),
            };
            let Some(artifact) = artifact else {
                println!("{}", "No artifact to preview.".bright_red());
                return Flow::Continue;
            };
            match devsquad::write_preview(artifact, preview_dir) {
                Ok(path) => {
                    println!("🖥️  Preview written to {}", path.display().bold());
                    println!(
                        "{}",
                        format!(
                            "Open it in a sandboxed frame ({PREVIEW_SANDBOX})."
                        )
                        .dimmed()
                    );
                }
                Err(err) => {
                    error!("failed to write preview: {err}");
                    println!("{}", err.to_string().bright_red());
                }
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
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
