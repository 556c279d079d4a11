use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The worker task is gone, so the operation will never complete.
    #[error("controller worker has stopped")]
    Closed,
}
