use thiserror::Error;

#[derive(Debug, Error)]
pub enum KolynError {
    #[error("Agent.md not found in {0}: run 'kolyn init'")]
    AgentFileMissing(String),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("skill already exists: {0} (use --force to overwrite)")]
    SkillExists(String),

    #[error("invalid skill name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSkillName(String),

    #[error("invalid frontmatter in {path}: {reason}")]
    InvalidFrontmatter { path: String, reason: String },

    #[error("no skill directories found: run 'kolyn sync' or 'kolyn skills new'")]
    NoSkillRoots,

    #[error("operation cancelled")]
    Cancelled,

    #[error("repository access error for {url}: {output}")]
    RepoAccess { url: String, output: String },

    #[error("git {op} failed for {url}: {output}")]
    GitFailed {
        op: String,
        url: String,
        output: String,
    },

    #[error("failed to run '{program}': {reason}")]
    ToolSpawnFailed { program: String, reason: String },

    #[error("'{program}' exited with status {status}")]
    ToolFailed { program: String, status: i32 },

    #[error("'{program}' exited with status {status}: {output}")]
    ToolOutputFailed {
        program: String,
        status: i32,
        output: String,
    },

    #[error("service not found: {0} (no compose file or template)")]
    ServiceNotFound(String),

    #[error("ssh key already exists: {0}")]
    KeyExists(String),

    #[error("home directory not found: set HOME or KOLYN_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KolynError>;
