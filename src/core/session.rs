use serde::Serialize;

/// Identifies one call and the local participant in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    session_id: String,
    local_user_id: String,
}

impl Session {
    #[must_use]
    pub fn new(session_id: impl Into<String>, local_user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            local_user_id: local_user_id.into(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }
}
