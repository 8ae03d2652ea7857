use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bananagen_core::{update, AppState, Msg, Notice};
use bananagen_engine::{
    AtomicFileWriter, ChatContext, Collaborators, ExtensionSettings, FileAvatarSource,
    HandlebarsRenderer, RequestSettings, ReqwestModelClient, TranscriptContext,
    XmlPromptExtractor,
};
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};

use super::cli::{parse_line, Action, Args, PromptCommand};
use super::effects::EffectRunner;
use super::{logging, persistence, prompts, ui};

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    let dotenv = dotenvy::dotenv();
    logging::initialize(args.log.into(), args.verbose);
    match dotenv {
        Ok(path) => engine_info!("Loaded environment from {:?}", path),
        Err(err) if err.not_found() => {}
        Err(err) => engine_warn!("Ignoring .env: {}", err),
    }

    let settings = persistence::load_settings(&args.settings);
    let chat: Arc<dyn ChatContext> = match &args.transcript {
        Some(path) => Arc::new(
            TranscriptContext::load(path)
                .with_context(|| format!("loading transcript {}", path.display()))?,
        ),
        None => Arc::new(TranscriptContext::empty()),
    };

    let state = AppState::new();
    let deps = Collaborators {
        client: Arc::new(ReqwestModelClient::new(RequestSettings::default())?),
        renderer: Arc::new(HandlebarsRenderer::new()),
        chat,
        avatars: Arc::new(FileAvatarSource {
            character: args.avatar.clone(),
            persona: args.persona_avatar.clone(),
            background: args.background.clone(),
        }),
        extractor: Arc::new(XmlPromptExtractor),
        ids: state.id_allocator(),
    };
    let runner = EffectRunner::new(deps, AtomicFileWriter::new(args.output.clone()));
    engine_info!(
        "Session started; settings {:?}, output {:?}",
        args.settings,
        args.output
    );

    let mut session = Session {
        state,
        runner,
        settings,
        settings_path: args.settings,
        last_notice: None,
    };
    session.repl()
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    settings: ExtensionSettings,
    settings_path: PathBuf,
    last_notice: Option<Notice>,
}

impl Session {
    fn repl(&mut self) -> anyhow::Result<()> {
        println!("BananaGen. Type `help` for commands.");
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{}", message.trim_end());
                    continue;
                }
            };
            match command.into_action(self.settings.active_preset_content()) {
                Action::Dispatch(msg) => {
                    self.dispatch(msg);
                    self.settle();
                }
                Action::List => print!("{}", ui::render::render(&self.state.view())),
                Action::Prompt(command) => self.edit_prompts(command),
                Action::Quit => break,
            }
        }
        engine_info!("Session ended with {} entries", self.state.entries().len());
        Ok(())
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let reports = self.runner.run(effects, &self.settings);

        if state.consume_dirty() {
            let view = state.view();
            if view.notice.is_some() && view.notice != self.last_notice {
                if let Some(notice) = &view.notice {
                    println!("{}", ui::render::render_notice(notice));
                }
            }
            self.last_notice = view.notice.clone();
            print!("{}", ui::render::render(&view));
        }
        self.state = state;

        for report in reports {
            println!("{report}");
        }
    }

    /// Prompt edits apply to the next generation and are saved right away.
    fn edit_prompts(&mut self, command: PromptCommand) {
        match prompts::apply(&mut self.settings, command) {
            Ok(edit) => {
                if edit.changed {
                    persistence::save_settings(&self.settings_path, &self.settings);
                }
                println!("{}", edit.message);
            }
            Err(err) => {
                engine_error!("Prompt edit failed: {}", err);
                println!("[error] {err}");
            }
        }
    }

    /// Waits out the running generation, if any.
    fn settle(&mut self) {
        while self.state.is_generating() {
            match self.runner.wait_msg() {
                Some(msg) => self.dispatch(msg),
                None => {
                    engine_warn!("Engine stopped while a generation was running");
                    println!("[error] The generation engine stopped.");
                    break;
                }
            }
        }
    }
}
