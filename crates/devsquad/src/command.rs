use std::error::Error as StdError;
use std::fmt::{self, Display};

use devsquad_core::catalog::{
    Persona, Template, Tool, find_persona, find_template, find_tool,
};

/// A line typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// A message for the squad, trimmed.
    Message(String),
    /// A slash command.
    Command(Command),
}

/// A slash command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/reset`: starts a new project.
    Reset,
    /// `/dm <persona>`: addresses the next message to a persona.
    DirectMessage(&'static Persona),
    /// `/tool <id>`: enables or disables an integration.
    Tool(&'static Tool),
    /// `/tools`: lists integrations.
    Tools,
    /// `/template <id>`: sends a starter project prompt.
    Template(&'static Template),
    /// `/templates`: lists starter projects.
    Templates,
    /// `/artifacts`: lists extracted artifacts.
    Artifacts,
    /// `/preview [n]`: writes the preview document of the n-th artifact,
    /// or of the latest previewable one.
    Preview(Option<usize>),
    /// `/team`: lists the personas.
    Team,
    /// `/help`: shows the commands.
    Help,
    /// `/quit`: leaves.
    Quit,
}

/// The error returned when a command line cannot be understood.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// No such command.
    UnknownCommand(String),
    /// The command needs an argument.
    MissingArgument(&'static str),
    /// No persona has this id, name or role.
    UnknownPersona(String),
    /// No integration has this id or name.
    UnknownTool(String),
    /// No template has this id.
    UnknownTemplate(String),
    /// The artifact number is not a positive integer.
    InvalidIndex(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(cmd) => {
                write!(f, "Unknown command `/{cmd}`, try /help")
            }
            CommandError::MissingArgument(usage) => {
                write!(f, "Missing argument, usage: {usage}")
            }
            CommandError::UnknownPersona(name) => {
                write!(f, "No one in the squad is called `{name}`")
            }
            CommandError::UnknownTool(name) => {
                write!(f, "Unknown integration `{name}`, try /tools")
            }
            CommandError::UnknownTemplate(id) => {
                write!(f, "Unknown template `{id}`, try /templates")
            }
            CommandError::InvalidIndex(arg) => {
                write!(f, "`{arg}` is not an artifact number")
            }
        }
    }
}

impl StdError for CommandError {}

/// Help text for all commands.
pub const HELP: &str = "\
/dm <persona>     address the next message to a persona (again to cancel)
/tool <id>        enable or disable an integration
/tools            list integrations
/template <id>    start from a template
/templates        list templates
/team             list the squad
/artifacts        list extracted artifacts
/preview [n]      write a preview document for an artifact
/reset            start a new project
/help             show this help
/quit             leave";

/// Parses a line typed by the user.
pub fn parse_input(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    let Some(command_line) = line.strip_prefix('/') else {
        return Ok(Input::Message(line.to_owned()));
    };

    let (name, arg) = match command_line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command_line, ""),
    };
    let arg = (!arg.is_empty()).then_some(arg);

    let command = match name.to_ascii_lowercase().as_str() {
        "reset" | "new" => Command::Reset,
        "dm" => {
            let name =
                arg.ok_or(CommandError::MissingArgument("/dm <persona>"))?;
            let name = name.trim_start_matches('@');
            find_persona(name)
                .map(Command::DirectMessage)
                .ok_or_else(|| CommandError::UnknownPersona(name.to_owned()))?
        }
        "tool" => {
            let id = arg.ok_or(CommandError::MissingArgument("/tool <id>"))?;
            find_tool(id)
                .map(Command::Tool)
                .ok_or_else(|| CommandError::UnknownTool(id.to_owned()))?
        }
        "tools" => Command::Tools,
        "template" => {
            let id =
                arg.ok_or(CommandError::MissingArgument("/template <id>"))?;
            find_template(id)
                .map(Command::Template)
                .ok_or_else(|| CommandError::UnknownTemplate(id.to_owned()))?
        }
        "templates" => Command::Templates,
        "team" => Command::Team,
        "artifacts" => Command::Artifacts,
        "preview" => match arg {
            None => Command::Preview(None),
            Some(arg) => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Preview(Some(n)),
                _ => return Err(CommandError::InvalidIndex(arg.to_owned())),
            },
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::UnknownCommand(name.to_owned())),
    };
    Ok(Input::Command(command))
}
