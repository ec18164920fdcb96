use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find a sheet named '{role}' (case-insensitive). Please check your Excel file.")]
    MissingSheet { role: String },

    #[error("No pending edit at position {position} (ledger holds {len})")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("Error saving Excel file: {0}")]
    SerializationFailure(String),

    #[error("Volunteer '{identity}' not found in category {category}")]
    UnknownVolunteer { category: String, identity: String },

    #[error("Course '{label}' not found in category {category}")]
    UnknownCourse { category: String, label: String },

    #[error("Unknown category: {0} (expected HONORARIOS or ACTIVOS)")]
    UnknownCategory(String),

    #[error("Error loading Excel file: {0}")]
    Import(String),

    #[error("Invalid date: {0}")]
    Date(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// True for errors that end the session (the upload has to be redone).
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistryError::MissingSheet { .. } | RegistryError::Import(_))
    }
}
