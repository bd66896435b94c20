/// A collaborator that is either usable or missing its credentials.
#[derive(Clone, Debug)]
pub enum Service<C> {
    Configured(C),
    Unconfigured { reason: String },
}

impl<C> Service<C> {
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self::Unconfigured { reason: reason.into() }
    }

    pub fn from_option(client: Option<C>, reason: impl Into<String>) -> Self {
        match client {
            Some(client) => Self::Configured(client),
            None => Self::unconfigured(reason),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    pub fn as_configured(&self) -> Option<&C> {
        match self {
            Self::Configured(client) => Some(client),
            Self::Unconfigured { .. } => None,
        }
    }
}
