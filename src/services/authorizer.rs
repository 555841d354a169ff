use crate::entities::file_records;

/// Decides whether a supplied credential opens a record.
pub trait Authorizer: Send + Sync {
    fn can_access(&self, record: &file_records::Model, credential: &str) -> bool;
}

/// Grants access when the credential matches the record's own secret code,
/// or the single override code when one is configured.
#[derive(Debug, Clone, Default)]
pub struct SecretCodeAuthorizer {
    override_code: Option<String>,
}

impl SecretCodeAuthorizer {
    pub fn new(override_code: Option<String>) -> Self {
        Self {
            override_code: override_code.filter(|c| !c.is_empty()),
        }
    }
}

impl Authorizer for SecretCodeAuthorizer {
    fn can_access(&self, record: &file_records::Model, credential: &str) -> bool {
        if credential.is_empty() {
            return false;
        }
        if credential == record.secret_code {
            return true;
        }
        self.override_code
            .as_deref()
            .is_some_and(|master| credential == master)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(code: &str) -> file_records::Model {
        file_records::Model {
            id: "r1".to_string(),
            title: "notes".to_string(),
            filename: "notes.txt".to_string(),
            file_path: "files/r1/notes.txt".to_string(),
            secret_code: code.to_string(),
            content_type: Some("text/plain".to_string()),
            size: 4,
            is_folder: false,
            file_count: None,
            is_verified: Some(false),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_own_code_opens_record() {
        let auth = SecretCodeAuthorizer::new(None);
        assert!(auth.can_access(&record("1234"), "1234"));
        assert!(!auth.can_access(&record("1234"), "4321"));
    }

    #[test]
    fn test_override_code_opens_any_record() {
        let auth = SecretCodeAuthorizer::new(Some("master".to_string()));
        assert!(auth.can_access(&record("1234"), "master"));
        assert!(auth.can_access(&record("other"), "master"));
        assert!(!auth.can_access(&record("1234"), "nope"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let auth = SecretCodeAuthorizer::new(Some(String::new()));
        assert!(!auth.can_access(&record("1234"), ""));
    }
}
