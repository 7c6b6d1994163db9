//! User Entity

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{UserId, email::Email};

/// A person who has signed in at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Generated by the store; never changes
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<Email>,
    /// When the email was verified, if ever
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

/// Fields for [`create_user`](crate::domain::repository::UserRepository::create_user)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            email_verified: self.email_verified,
            image: self.image,
        }
    }
}

/// Partial user update
///
/// `id` is required by the adapter even though the type allows leaving it out;
/// an update without it is rejected. For the other fields, `None` leaves the
/// stored value alone and `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub id: Option<UserId>,
    pub name: Option<Option<String>>,
    pub email: Option<Option<Email>>,
    pub email_verified: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
}

impl UserPatch {
    pub fn for_user(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn email(mut self, email: Option<Email>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn email_verified(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.email_verified = Some(at);
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }

    /// Write the present fields onto `user`
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(email_verified) = self.email_verified {
            user.email_verified = email_verified;
        }
        if let Some(image) = &self.image {
            user.image = image.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        NewUser {
            name: Some("Ada".into()),
            email: Some(Email::new("ada@example.com").unwrap()),
            email_verified: None,
            image: Some("https://cdn.example.com/ada.png".into()),
        }
        .into_user(UserId::new())
    }

    #[test]
    fn test_patch_touches_only_present_fields() {
        let mut user = sample_user();
        let before = user.clone();

        UserPatch::for_user(user.id)
            .name(Some("Ada L.".into()))
            .apply_to(&mut user);

        assert_eq!(user.name.as_deref(), Some("Ada L."));
        assert_eq!(user.email, before.email);
        assert_eq!(user.image, before.image);
        assert_eq!(user.id, before.id);
    }

    #[test]
    fn test_patch_can_clear_fields() {
        let mut user = sample_user();
        UserPatch::for_user(user.id).image(None).apply_to(&mut user);
        assert!(user.image.is_none());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("emailVerified").is_some());
        assert_eq!(json["email"], "ada@example.com");
    }
}
