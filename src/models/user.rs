use serde::{Deserialize, Serialize};

/// A user's profile record in the `users` collection.
///
/// Keyed by the identity provider's UID, which is also stored in the
/// `userUID` field so records are self-describing when listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(rename = "userUID")]
    pub user_uid: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    /// Keys of the categories this user owns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl UserProfile {
    pub fn new(user_uid: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_uid: user_uid.into(),
            user_name: user_name.into(),
            categories: Some(Vec::new()),
        }
    }
}
