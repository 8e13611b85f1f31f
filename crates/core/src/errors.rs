use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("product `{product}` not found in base catalogue")]
    NotFound { product: String },
    #[error("minimum order quantity `{value}` for `{record}` is not an integer")]
    InvalidQuantity { record: String, value: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("catalogue failure: {0}")]
    Catalog(String),
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unconfigured: {message}")]
    Unconfigured { message: String, correlation_id: String },
    #[error("misconfigured: {message}")]
    Misconfigured { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Product not found in base data.",
            Self::BadRequest { .. } => {
                "The catalogue could not be used. Check the catalogue data and try again."
            }
            Self::Unconfigured { .. } => {
                "A required credential is not configured; continuing without that data."
            }
            Self::Misconfigured { .. } => {
                "The configuration is invalid. Check the config file, environment and flags."
            }
            Self::ServiceUnavailable { .. } => {
                "The insights service is temporarily unavailable. Please retry shortly."
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::BadRequest { message, .. }
            | Self::Unconfigured { message, .. }
            | Self::Misconfigured { message, .. }
            | Self::ServiceUnavailable { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::NotFound { correlation_id, .. }
            | Self::BadRequest { correlation_id, .. }
            | Self::Unconfigured { correlation_id, .. }
            | Self::Misconfigured { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unconfigured { correlation_id: id, .. }
            | InterfaceError::Misconfigured { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Resolve(ResolveError::NotFound { .. }) => {
                Self::NotFound { message, correlation_id }
            }
            ApplicationError::Resolve(ResolveError::InvalidQuantity { .. })
            | ApplicationError::Catalog(_) => Self::BadRequest { message, correlation_id },
            ApplicationError::MissingCredential(_) => {
                Self::Unconfigured { message, correlation_id }
            }
            ApplicationError::Upstream(_) => Self::ServiceUnavailable { message, correlation_id },
            ApplicationError::Configuration(_) => Self::Misconfigured { message, correlation_id },
        }
    }
}
