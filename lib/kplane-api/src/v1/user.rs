use serde::{Deserialize, Serialize};

/// The authenticated caller of catalog and service account operations
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl ApiUser {
    /// Lowercased part of the email after the last `@`
    pub fn email_domain(&self) -> Option<String> {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain() {
        let user = ApiUser {
            email: "John@Example.COM".to_string(),
            ..Default::default()
        };
        assert_eq!(user.email_domain().as_deref(), Some("example.com"));

        let anonymous = ApiUser::default();
        assert_eq!(anonymous.email_domain(), None);
    }
}
