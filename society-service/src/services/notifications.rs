//! Transactional emails sent as a society moves through onboarding.

use std::sync::Arc;

use super::metrics::record_notification;
use super::providers::{EmailMessage, EmailProvider};
use crate::models::Society;
use crate::utils::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Link to the verify-email endpoint, sent after registration.
    EmailVerification,
    /// Registration details for the operator, sent after email verification.
    AdminReview,
    /// Setup link and secret key, sent after admin approval.
    SocietySetup,
    /// New secret key, sent after regeneration.
    SecretKeyRegenerated,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::EmailVerification => "email_verification",
            EmailTemplate::AdminReview => "admin_review",
            EmailTemplate::SocietySetup => "society_setup",
            EmailTemplate::SecretKeyRegenerated => "secret_key_regenerated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub public_base_url: String,
    pub admin_email: String,
    pub operator_secret: String,
    pub key_ttl_days: i64,
}

pub struct NotificationGateway {
    provider: Arc<dyn EmailProvider>,
    settings: NotificationSettings,
}

impl NotificationGateway {
    pub fn new(provider: Arc<dyn EmailProvider>, settings: NotificationSettings) -> Self {
        Self { provider, settings }
    }

    /// Send `template` for `society`. Failures are logged and counted, never
    /// propagated; the return value reports whether the provider accepted it.
    pub async fn send(&self, template: EmailTemplate, society: &Society) -> bool {
        let message = self.render(template, society);

        match self.provider.send(&message).await {
            Ok(provider_id) => {
                tracing::info!(
                    society_id = %society.society_id,
                    template = template.as_str(),
                    provider_id = ?provider_id,
                    "Notification sent"
                );
                record_notification(template.as_str(), "sent");
                true
            }
            Err(e) => {
                tracing::error!(
                    society_id = %society.society_id,
                    template = template.as_str(),
                    error = %e,
                    "Notification failed"
                );
                record_notification(template.as_str(), "failed");
                false
            }
        }
    }

    pub fn render(&self, template: EmailTemplate, society: &Society) -> EmailMessage {
        match template {
            EmailTemplate::EmailVerification => self.render_email_verification(society),
            EmailTemplate::AdminReview => self.render_admin_review(society),
            EmailTemplate::SocietySetup => self.render_society_setup(society),
            EmailTemplate::SecretKeyRegenerated => self.render_key_regenerated(society),
        }
    }

    fn base(&self) -> &str {
        &self.settings.public_base_url
    }

    fn setup_url(&self, society: &Society) -> String {
        format!(
            "{}/society/setup/{}?key={}",
            self.base(),
            society.society_id,
            society.admin_secret_key
        )
    }

    fn render_email_verification(&self, society: &Society) -> EmailMessage {
        let verify_url = format!("{}/api/society/verify/{}", self.base(), society.society_id);
        let name = escape_html(&society.society_name);

        EmailMessage {
            to: society.email.clone(),
            subject: "Verify Your NeighbourNet Society Registration".to_string(),
            body_text: format!(
                "Thank you for registering {}.\n\nVerify your email: {}\n\n\
                 After email verification an administrator will review your documents \
                 and approve your registration.\n",
                society.society_name, verify_url
            ),
            body_html: format!(
                "<h1>Welcome to NeighbourNet!</h1>\
                 <p>Thank you for registering <strong>{name}</strong>. \
                 Please verify your email by clicking the link below:</p>\
                 <p><a href=\"{url}\">Verify Your Society Email</a></p>\
                 <p>After email verification, an administrator will review your documents \
                 and approve your registration.</p>",
                name = name,
                url = escape_html(&verify_url),
            ),
        }
    }

    fn render_admin_review(&self, society: &Society) -> EmailMessage {
        let approve_url = format!(
            "{}/api/society/admin-verify/{}?key={}",
            self.base(),
            society.society_id,
            self.settings.operator_secret
        );
        let document_urls: Vec<String> = society
            .verification_files
            .iter()
            .map(|file| format!("{}/uploads/{}", self.base(), file))
            .collect();

        let fields = [
            ("Society ID", society.society_id.as_str()),
            ("Society Name", society.society_name.as_str()),
            ("City", society.city.as_str()),
            ("Address", society.address.as_str()),
            ("Email", society.email.as_str()),
            ("Contact Number", society.contact_number.as_str()),
            ("Admin Secret Key", society.admin_secret_key.as_str()),
        ];

        let mut text = String::from("A new society has registered and needs verification.\n\n");
        let mut rows = String::new();
        for (label, value) in fields {
            text.push_str(&format!("{}: {}\n", label, value));
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                label,
                escape_html(value)
            ));
        }

        let documents_html = if document_urls.is_empty() {
            text.push_str("\nNo verification documents were uploaded.\n");
            "<p>No verification documents were uploaded.</p>".to_string()
        } else {
            text.push_str("\nDocuments:\n");
            let mut items = String::new();
            for url in &document_urls {
                text.push_str(&format!("  {}\n", url));
                items.push_str(&format!(
                    "<li><a href=\"{0}\">{0}</a></li>",
                    escape_html(url)
                ));
            }
            format!("<p>Verification documents:</p><ul>{}</ul>", items)
        };
        text.push_str(&format!("\nApprove this society: {}\n", approve_url));

        EmailMessage {
            to: self.settings.admin_email.clone(),
            subject: format!(
                "[VERIFICATION NEEDED] New Society Registration: {}",
                society.society_name
            ),
            body_text: text,
            body_html: format!(
                "<h1>New Society Registration Needs Verification</h1>\
                 <p>A new society has registered and needs your verification:</p>\
                 <table border=\"1\" cellpadding=\"5\" style=\"border-collapse: collapse;\">\
                 <tr><th>Field</th><th>Value</th></tr>{rows}</table>\
                 {documents}\
                 <p>To verify this society, click the link below:</p>\
                 <p><a href=\"{url}\">Verify Society</a></p>",
                rows = rows,
                documents = documents_html,
                url = escape_html(&approve_url),
            ),
        }
    }

    fn render_society_setup(&self, society: &Society) -> EmailMessage {
        let setup_url = self.setup_url(society);
        let days = self.settings.key_ttl_days;

        EmailMessage {
            to: society.email.clone(),
            subject: "Your NeighbourNet Society Registration is Verified".to_string(),
            body_text: format!(
                "Your society {} has been verified.\n\nSet up your society: {}\n\n\
                 This link is valid for {} days. Your admin secret key is: {}\n",
                society.society_name, setup_url, days, society.admin_secret_key
            ),
            body_html: format!(
                "<h1>Welcome to NeighbourNet!</h1>\
                 <p>Congratulations! Your society <strong>{name}</strong> has been verified.</p>\
                 <p>You can now set up your society workspace by clicking the link below:</p>\
                 <p><a href=\"{url}\">Set Up Your Society</a></p>\
                 <p>This link is valid for {days} days. \
                 Your admin secret key is: <strong>{key}</strong></p>\
                 <p>Please keep this key secure.</p>",
                name = escape_html(&society.society_name),
                url = escape_html(&setup_url),
                days = days,
                key = escape_html(&society.admin_secret_key),
            ),
        }
    }

    fn render_key_regenerated(&self, society: &Society) -> EmailMessage {
        let setup_url = self.setup_url(society);
        let days = self.settings.key_ttl_days;

        EmailMessage {
            to: society.email.clone(),
            subject: "Your NeighbourNet Admin Secret Key Has Been Regenerated".to_string(),
            body_text: format!(
                "The admin secret key for {} has been regenerated.\n\n\
                 New key: {}\nSetup page: {}\n\nThis key will expire in {} days.\n\
                 If you did not request this, contact support immediately.\n",
                society.society_name, society.admin_secret_key, setup_url, days
            ),
            body_html: format!(
                "<h1>Admin Secret Key Regenerated</h1>\
                 <p>Your admin secret key for society <strong>{name}</strong> has been regenerated.</p>\
                 <p>Your new admin secret key is: <strong>{key}</strong></p>\
                 <p><a href=\"{url}\">Go to Society Setup</a></p>\
                 <p>This key will expire in {days} days.</p>\
                 <p>If you did not request this key regeneration, please contact support immediately.</p>",
                name = escape_html(&society.society_name),
                key = escape_html(&society.admin_secret_key),
                url = escape_html(&setup_url),
                days = days,
            ),
        }
    }
}
