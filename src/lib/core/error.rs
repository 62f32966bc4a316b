use thiserror::Error;

/// A business rule rejected the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    BlankTitle,
    #[error("Expiry date cannot be in the past")]
    ExpiryNotInFuture,
    #[error("The start date cannot be later than the end date.")]
    InvertedRange,
}

#[derive(Error, Debug)]
pub enum ToDoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
