//! Error types for cruise-model

/// Result type for cruise-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Construction and lookup errors of the domain model.
///
/// Messages are stable: callers assert on them verbatim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A name collides within a single owned collection, e.g. two variables of one job.
    #[error("{label} name '{name}' is not unique for {scope}.")]
    NotUnique {
        label: String,
        name: String,
        scope: String,
    },

    /// Two stages, jobs or pipelines of one parent share a name.
    #[error("You have defined multiple {plural} called '{name}'. {title} names are case-insensitive and must be unique.")]
    MultipleDefined {
        plural: String,
        title: String,
        name: String,
    },

    #[error("Cannot add stage '{stage}' to pipeline '{pipeline}', which already references template '{template}'.")]
    StageOnTemplatedPipeline {
        stage: String,
        pipeline: String,
        template: String,
    },

    #[error("Cannot set template '{template}' on pipeline '{pipeline}' because it already has stages defined.")]
    TemplateOnPipelineWithStages { pipeline: String, template: String },

    #[error("Cannot nest 'oncancel' within a cancel task")]
    NestedOnCancel,

    #[error("Stage '{stage}' must have at least one job.")]
    EmptyJobs { stage: String },

    #[error("User '{user}' already exists in '{role}'.")]
    DuplicateUser { user: String, role: String },

    #[error("Duplicate key '{key}' found in configuration.")]
    DuplicateProperty { key: String },

    #[error("{kind} '{name}' not found.")]
    NotFound { kind: String, name: String },

    #[error("Circular dependency: {chain}")]
    CircularDependency { chain: String },

    #[error(transparent)]
    Secure(#[from] cruise_secure::Error),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn not_unique(label: impl Into<String>, name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::NotUnique {
            label: label.into(),
            name: name.into(),
            scope: scope.into(),
        }
    }

    pub(crate) fn multiple(plural: &str, title: &str, name: impl Into<String>) -> Self {
        Self::MultipleDefined {
            plural: plural.into(),
            title: title.into(),
            name: name.into(),
        }
    }
}
