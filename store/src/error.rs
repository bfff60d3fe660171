use thiserror::Error;

/// Failure to schedule a checkpoint.
///
/// Never surfaced to action callers: the engine logs it and leaves the change pending, so the next
/// forced flush still delivers it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("no async runtime is available on this thread to run the checkpoint")]
    NoRuntime,
    #[error("checkpoint queue is closed")]
    Closed,
    #[error("checkpoints are disabled for this container")]
    Disabled,
}
