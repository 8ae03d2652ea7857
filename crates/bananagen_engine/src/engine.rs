use std::sync::mpsc;
use std::thread;

use bananagen_core::{Entry, GenerationFailure, ImageResult, RequestId};

use crate::generate::{
    run_image_generation, run_text_generation, Collaborators, ImageGeneration, TextGeneration,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TextCompleted {
        request_id: RequestId,
        result: Result<Vec<Entry>, GenerationFailure>,
    },
    ImageCompleted {
        request_id: RequestId,
        result: Result<ImageResult, GenerationFailure>,
    },
}

enum EngineCommand {
    Text(Box<TextGeneration>),
    Image(Box<ImageGeneration>),
}

impl EngineCommand {
    fn request_id(&self) -> RequestId {
        match self {
            Self::Text(job) => job.request.request_id,
            Self::Image(job) => job.request.request_id,
        }
    }
}

/// Runs generations on a background thread; results come back through
/// `try_recv`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(deps: Collaborators) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            // Current-thread runtime keeps the attempt tag valid across awaits.
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_logging::engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let event = engine_logging::with_attempt(command.request_id(), || {
                    runtime.block_on(handle_command(&deps, command))
                });
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit_text(&self, job: TextGeneration) {
        let _ = self.cmd_tx.send(EngineCommand::Text(Box::new(job)));
    }

    pub fn submit_image(&self, job: ImageGeneration) {
        let _ = self.cmd_tx.send(EngineCommand::Image(Box::new(job)));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event arrives or the worker is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

async fn handle_command(deps: &Collaborators, command: EngineCommand) -> EngineEvent {
    match command {
        EngineCommand::Text(job) => {
            let request_id = job.request.request_id;
            let result = run_text_generation(&job, deps).await.map_err(|err| {
                engine_logging::engine_error!("text generation failed: {}", err);
                err.to_failure()
            });
            EngineEvent::TextCompleted { request_id, result }
        }
        EngineCommand::Image(job) => {
            let request_id = job.request.request_id;
            let result = run_image_generation(&job, deps)
                .await
                .map(ImageResult::from)
                .map_err(|err| {
                    engine_logging::engine_error!("image generation failed: {}", err);
                    err.to_failure()
                });
            EngineEvent::ImageCompleted { request_id, result }
        }
    }
}
