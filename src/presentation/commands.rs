// Chart commands - Closed set of operations the UI can issue
use crate::domain::error::IngestError;
use crate::presentation::chart_controller::ChartController;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartCommand {
    LoadRecording(PathBuf),
    Play,
    Stop,
    ToggleAxisVisibility { axis: String, visible: bool },
    ResetWindow,
    ResetBuffer,
    Listen,
}

/// What a dispatched command produced, for callers that care.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    /// The axis named by a visibility toggle is not in the manifest.
    UnknownAxis(String),
    Listening(SocketAddr),
}

impl ChartController {
    pub async fn dispatch(&mut self, command: ChartCommand) -> Result<CommandOutcome, IngestError> {
        tracing::debug!("Dispatching {:?}", command);

        match command {
            ChartCommand::LoadRecording(path) => {
                self.load_manifest(path).await?;
            }
            ChartCommand::Play => self.play().await?,
            ChartCommand::Stop => self.stop(),
            ChartCommand::ToggleAxisVisibility { axis, visible } => {
                if !self.set_axis_visibility(&axis, visible) {
                    return Ok(CommandOutcome::UnknownAxis(axis));
                }
            }
            ChartCommand::ResetWindow => self.reset_window(),
            ChartCommand::ResetBuffer => self.reset_buffer(),
            ChartCommand::Listen => {
                let addr = self.listen().await?;
                return Ok(CommandOutcome::Listening(addr));
            }
        }

        Ok(CommandOutcome::Done)
    }
}
