use bananagen_core::{Effect, Msg};
use bananagen_engine::{
    export_image_entry, AtomicFileWriter, Collaborators, EngineEvent, EngineHandle,
    ExtensionSettings, ImageGeneration, TextGeneration,
};
use chrono::Utc;
use engine_logging::{engine_error, engine_info};

/// Carries out the side effects `update` asks for.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: AtomicFileWriter,
}

impl EffectRunner {
    pub fn new(deps: Collaborators, writer: AtomicFileWriter) -> Self {
        Self {
            engine: EngineHandle::new(deps),
            writer,
        }
    }

    /// Starts generations in the background; posts run immediately and report
    /// back as text for the user.
    pub fn run(&self, effects: Vec<Effect>, settings: &ExtensionSettings) -> Vec<String> {
        let mut reports = Vec::new();
        for effect in effects {
            match effect {
                Effect::GenerateText(request) => {
                    engine_info!(
                        "GenerateText request_id={} continue={}",
                        request.request_id,
                        request.continue_from.is_some()
                    );
                    self.engine.submit_text(TextGeneration {
                        request,
                        settings: settings.clone(),
                    });
                }
                Effect::GenerateImage(request) => {
                    engine_info!(
                        "GenerateImage request_id={} refine={}",
                        request.request_id,
                        request.is_refinement()
                    );
                    self.engine.submit_image(ImageGeneration {
                        request,
                        settings: settings.clone(),
                    });
                }
                Effect::PostToChat { entry } => {
                    match export_image_entry(&entry, &self.writer, Utc::now().timestamp_millis())
                    {
                        Ok(summary) => reports.push(format!(
                            "Posted to chat! ({})",
                            summary.record_path.display()
                        )),
                        Err(err) => {
                            engine_error!("Post of entry {} failed: {}", entry.id, err);
                            reports.push(format!("Post failed: {err}"));
                        }
                    }
                }
            }
        }
        reports
    }

    /// Blocks until the engine reports back; `None` if it has stopped.
    pub fn wait_msg(&self) -> Option<Msg> {
        self.engine.recv().map(|event| match event {
            EngineEvent::TextCompleted { request_id, result } => {
                Msg::TextGenerationDone { request_id, result }
            }
            EngineEvent::ImageCompleted { request_id, result } => {
                Msg::ImageGenerationDone { request_id, result }
            }
        })
    }
}
