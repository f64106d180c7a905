//! Mapping verified claims to the platform's user info.
//!
//! Downstream account linking treats `email` and `phone` in [`UserInfo`] as
//! provider-attested, so unverified values are dropped and become
//! indistinguishable from absent ones.

use crate::validator::IdentityClaims;
use serde::{Deserialize, Serialize};

/// Normalized user information produced by a successful callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Provider subject identifier.
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Provider-verified email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Provider-verified phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Builder that only accepts present, non-empty values.
#[derive(Debug, Clone)]
pub struct UserInfoBuilder {
    info: UserInfo,
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

/// A value the provider attests to only when its verified flag is set.
#[must_use]
pub fn attested(value: Option<&str>, verified: bool) -> Option<String> {
    if verified { present(value) } else { None }
}

impl UserInfoBuilder {
    /// Start from the subject identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            info: UserInfo {
                id: id.into(),
                name: None,
                avatar: None,
                email: None,
                phone: None,
            },
        }
    }

    /// Set the name if present and non-empty.
    #[must_use]
    pub fn name(mut self, name: Option<&str>) -> Self {
        self.info.name = present(name);
        self
    }

    /// Set the avatar if present and non-empty.
    #[must_use]
    pub fn avatar(mut self, avatar: Option<&str>) -> Self {
        self.info.avatar = present(avatar);
        self
    }

    /// Set the email only if the provider verified it.
    #[must_use]
    pub fn verified_email(mut self, email: Option<&str>, verified: bool) -> Self {
        self.info.email = attested(email, verified);
        self
    }

    /// Set the phone only if the provider verified it.
    #[must_use]
    pub fn verified_phone(mut self, phone: Option<&str>, verified: bool) -> Self {
        self.info.phone = attested(phone, verified);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> UserInfo {
        self.info
    }
}

/// Convert verified claims into [`UserInfo`].
#[must_use]
pub fn map_claims(claims: &IdentityClaims) -> UserInfo {
    UserInfoBuilder::new(claims.sub.clone())
        .name(claims.name.as_deref())
        .avatar(claims.picture.as_deref())
        .verified_email(claims.email.as_deref(), claims.email_verified)
        .verified_phone(claims.phone_number.as_deref(), claims.phone_number_verified)
        .build()
}
