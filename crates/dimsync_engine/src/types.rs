use std::fmt;

/// Catalog entity type exposed by the shop REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Categories,
    Producers,
    Attributes,
    AttributeGroups,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Products,
        Resource::Categories,
        Resource::Producers,
        Resource::Attributes,
        Resource::AttributeGroups,
    ];

    /// Path segment under `webapi/rest/`.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Categories => "categories",
            Resource::Producers => "producers",
            Resource::Attributes => "attributes",
            Resource::AttributeGroups => "attribute-groups",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Pagination state for one resource. Lives only for one `fetch_all` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCursor {
    pub resource: Resource,
    pub page: u32,
    /// Page count reported by the last response; informational only.
    pub total_pages: u64,
}

impl FetchCursor {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            page: 1,
            total_pages: 0,
        }
    }

    pub fn advance(&mut self) {
        self.page += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {resource}: {kind}: {message}")]
pub struct FetchError {
    pub resource: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(
        resource: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Auth(u16),
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Auth(code) => write!(f, "authentication failed with status {code}"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "invalid response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
