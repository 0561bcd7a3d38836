use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowgateError {
    #[error("filter name is required")]
    MissingFilterName,

    #[error("can't use {0} (built-in) for filter name")]
    ReservedFilterName(String),

    #[error("duplicate filter name {0}")]
    DuplicateFilterName(String),

    #[error("filter {0}: kind is required")]
    MissingKind(String),

    #[error("kind {kind} of filter {name} not found")]
    UnknownKind { name: String, kind: String },

    #[error("filter {name}: invalid {kind} spec: {message}")]
    InvalidFilterBody {
        name: String,
        kind: String,
        message: String,
    },

    #[error("flow: filter {0} not found")]
    UnknownFlowFilter(String),

    #[error("filter {filter}: result {result} is not in {results:?}")]
    UnknownResult {
        filter: String,
        result: String,
        results: &'static [&'static str],
    },

    #[error("filter {filter}: target filter {target} not found")]
    UnknownJumpTarget { filter: String, target: String },

    #[error("filter {filter}: desired request {request} not found")]
    UnknownRequest { filter: String, request: String },

    #[error("malformed pipeline spec: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FlowgateError>;
