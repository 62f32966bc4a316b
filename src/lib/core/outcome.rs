/// Result of a conditional mutation of an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NotFound,
    /// The record exists but every field rule declined to change it.
    Unchanged,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotFound,
    Deleted,
}

impl UpdateOutcome {
    pub fn from_changed(changed: bool) -> Self {
        if changed { Self::Updated } else { Self::Unchanged }
    }
}
