//! Society model - the subject of the onboarding workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::services::secret_key::SecretKey;

/// Onboarding state of a society.
///
/// Stored as a first-class field; every change goes through
/// [`OnboardingState::next`] so a society can never skip a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingState {
    Registered,
    EmailVerified,
    AdminVerified,
    PasswordSet,
    Configured,
}

/// Actions that move a society through onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    VerifyEmail,
    AdminApprove,
    SetPassword,
    Configure,
}

impl OnboardingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingState::Registered => "REGISTERED",
            OnboardingState::EmailVerified => "EMAIL_VERIFIED",
            OnboardingState::AdminVerified => "ADMIN_VERIFIED",
            OnboardingState::PasswordSet => "PASSWORD_SET",
            OnboardingState::Configured => "CONFIGURED",
        }
    }

    /// Transition table. `None` means the transition is illegal from this
    /// state; `Some(self)` means it is allowed but changes nothing.
    pub fn next(self, transition: Transition) -> Option<OnboardingState> {
        use OnboardingState::*;

        match (self, transition) {
            (Registered, Transition::VerifyEmail) => Some(EmailVerified),
            (_, Transition::VerifyEmail) => Some(self),

            (EmailVerified, Transition::AdminApprove) => Some(AdminVerified),
            (AdminVerified | PasswordSet | Configured, Transition::AdminApprove) => Some(self),

            (AdminVerified, Transition::SetPassword) => Some(PasswordSet),
            (PasswordSet | Configured, Transition::SetPassword) => Some(self),

            (PasswordSet | Configured, Transition::Configure) => Some(Configured),

            _ => None,
        }
    }

    /// The step a society in this state is waiting on.
    pub fn next_step(self) -> Option<Transition> {
        match self {
            OnboardingState::Registered => Some(Transition::VerifyEmail),
            OnboardingState::EmailVerified => Some(Transition::AdminApprove),
            OnboardingState::AdminVerified => Some(Transition::SetPassword),
            OnboardingState::PasswordSet => Some(Transition::Configure),
            OnboardingState::Configured => None,
        }
    }
}

impl fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::VerifyEmail => "verify_email",
            Transition::AdminApprove => "admin_approve",
            Transition::SetPassword => "set_password",
            Transition::Configure => "configure",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected attempt to apply a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: OnboardingState,
    pub transition: Transition,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while society is {}", self.transition, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

/// Registration details supplied by the society.
#[derive(Debug, Clone, Validate)]
pub struct SocietyDetails {
    #[validate(length(min = 1, max = 100))]
    pub society_name: String,
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 20))]
    pub contact_number: String,
}

impl SocietyDetails {
    /// Trim every field and lower-case the email.
    pub fn normalized(self) -> Self {
        Self {
            society_name: self.society_name.trim().to_string(),
            city: self.city.trim().to_string(),
            address: self.address.trim().to_string(),
            email: normalize_email(&self.email),
            contact_number: self.contact_number.trim().to_string(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Society {
    #[serde(rename = "_id")]
    pub society_id: String,
    pub society_name: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub contact_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub admin_secret_key: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub admin_secret_key_expires: DateTime<Utc>,
    #[serde(default)]
    pub verification_files: Vec<String>,
    pub email_verified: bool,
    pub is_verified: bool,
    pub state: OnboardingState,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Society {
    pub fn new(details: SocietyDetails, key: SecretKey, verification_files: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            society_id: Uuid::new_v4().to_string(),
            society_name: details.society_name,
            city: details.city,
            address: details.address,
            email: details.email,
            contact_number: details.contact_number,
            password: None,
            admin_secret_key: key.value,
            admin_secret_key_expires: key.expires_at,
            verification_files,
            email_verified: false,
            is_verified: false,
            state: OnboardingState::Registered,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition. Returns whether the state changed.
    ///
    /// Flags only ever move from false to true.
    pub fn advance(&mut self, transition: Transition) -> Result<bool, InvalidTransition> {
        let next = self.state.next(transition).ok_or(InvalidTransition {
            from: self.state,
            transition,
        })?;

        if next == self.state {
            return Ok(false);
        }

        self.state = next;
        match next {
            OnboardingState::EmailVerified => self.email_verified = true,
            OnboardingState::AdminVerified => self.is_verified = true,
            _ => {}
        }
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Replace the admin secret key and its expiry.
    pub fn rotate_key(&mut self, key: SecretKey) {
        self.admin_secret_key = key.value;
        self.admin_secret_key_expires = key.expires_at;
        self.updated_at = Utc::now();
    }

    pub fn key_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.admin_secret_key_expires
    }

    pub fn needs_password_setup(&self) -> bool {
        self.password.is_none()
    }
}
