//! Command-line flags and the interactive command grammar.

use std::path::PathBuf;

use bananagen_core::{EntryId, Msg};
use clap::{Parser, Subcommand, ValueEnum};

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "bananagen",
    version,
    about = "Draft image-generation prompts from a chat transcript"
)]
pub struct Args {
    /// Settings file (JSON). Created with defaults if missing.
    #[arg(long, default_value = "bananagen.json")]
    pub settings: PathBuf,

    /// Chat transcript (JSON) used as context.
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Where posted images and their chat records are written.
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// Character avatar image attached on request.
    #[arg(long)]
    pub avatar: Option<PathBuf>,

    /// Persona avatar image attached on request.
    #[arg(long)]
    pub persona_avatar: Option<PathBuf>,

    /// Background image attached on request.
    #[arg(long)]
    pub background: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ReplCommand {
    /// Suggest new prompts (empty: use the selected prompt preset)
    Gen {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Let the model keep writing a prompt
    Continue { id: EntryId },
    /// Rewrite a prompt following instructions
    Revise {
        id: EntryId,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        instructions: Vec<String>,
    },
    /// Render a prompt as an image
    Image {
        id: EntryId,
        /// Attach character, persona and background pictures
        #[arg(long)]
        avatars: bool,
    },
    /// Refine a generated image
    Refine {
        id: EntryId,
        #[arg(required = true)]
        instructions: Vec<String>,
        #[arg(long)]
        avatars: bool,
    },
    /// Remove an entry
    Dismiss { id: EntryId },
    /// Post a generated image to the chat output
    Post { id: EntryId },
    /// Show all entries
    List,
    /// Remove all entries
    Reset,
    /// List or edit the stored prompt templates
    Prompt {
        #[command(subcommand)]
        command: PromptCommand,
    },
    /// Leave
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum PromptCommand {
    /// Show every prompt key with its label
    List,
    /// Add a prompt; its key is derived from the label
    Add {
        label: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        content: Vec<String>,
    },
    /// Replace the content of a prompt
    Set {
        key: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        content: Vec<String>,
    },
    /// Restore a built-in prompt to its default
    Reset { key: String },
}

/// Splits a typed line shell-style and parses it. Errors come back rendered,
/// ready to print (this includes `help`).
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let words = shell_words::split(line).map_err(|err| err.to_string())?;
    ReplLine::try_parse_from(words)
        .map(|parsed| parsed.command)
        .map_err(|err| err.render().to_string())
}

/// What a command asks of the session, given the preset used for an empty
/// `gen`.
pub enum Action {
    Dispatch(Msg),
    List,
    Prompt(PromptCommand),
    Quit,
}

impl ReplCommand {
    pub fn into_action(self, preset_prompt: &str) -> Action {
        match self {
            ReplCommand::Gen { prompt } => {
                let prompt = prompt.join(" ");
                let prompt = if prompt.trim().is_empty() {
                    preset_prompt.to_string()
                } else {
                    prompt
                };
                Action::Dispatch(Msg::PromptSubmitted { prompt })
            }
            ReplCommand::Continue { id } => Action::Dispatch(Msg::ContinueClicked { id }),
            ReplCommand::Revise { id, instructions } => Action::Dispatch(Msg::ReviseSubmitted {
                id,
                instructions: instructions.join(" "),
            }),
            ReplCommand::Image { id, avatars } => Action::Dispatch(Msg::GenerateImageClicked {
                id,
                include_avatars: avatars,
            }),
            ReplCommand::Refine {
                id,
                instructions,
                avatars,
            } => Action::Dispatch(Msg::RefineImageSubmitted {
                id,
                instructions: instructions.join(" "),
                include_avatars: avatars,
            }),
            ReplCommand::Dismiss { id } => Action::Dispatch(Msg::DismissClicked { id }),
            ReplCommand::Post { id } => Action::Dispatch(Msg::PostToChatClicked { id }),
            ReplCommand::List => Action::List,
            ReplCommand::Reset => Action::Dispatch(Msg::ResetClicked),
            ReplCommand::Prompt { command } => Action::Prompt(command),
            ReplCommand::Quit => Action::Quit,
        }
    }
}
