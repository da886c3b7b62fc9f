//! Email Service
//!
//! Templates for account emails and the SMTP delivery gateway.

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{error, info};
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::models::{RESET_TOKEN_TTL_HOURS, VERIFICATION_TOKEN_TTL_HOURS};
use crate::service::notification::{NotificationGateway, OutboundEmail};
use crate::utils::error::{AppError, AppResult};

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

const APP_NAME: &str = "Student Financial Aid";

const VERIFICATION_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Verify your email address</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Verify your email address</h1>
    <p>Thank you for registering with {{ app_name }}. Please confirm your email address by following the link below:</p>
    <p><a href="{{ action_url | safe }}">{{ action_url | safe }}</a></p>
    <p>This link will expire in {{ expires_in_hours }} hours.</p>
    <p>If you didn't create an account, you can safely ignore this email.</p>
    <p style="font-size: 12px; color: #666;">&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>
"#;

const PASSWORD_RESET_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Reset your password</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Reset your password</h1>
    <p>We received a request to reset the password for your {{ app_name }} account. Follow the link below to choose a new password:</p>
    <p><a href="{{ action_url | safe }}">{{ action_url | safe }}</a></p>
    <p>This link will expire in {{ expires_in_hours }} hour{% if expires_in_hours != 1 %}s{% endif %}.</p>
    <p>If you didn't request a password reset, you can safely ignore this email.</p>
    <p style="font-size: 12px; color: #666;">&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>
"#;

/// Renders account emails with links rooted at the public base URL
pub struct EmailTemplates {
    tera: Tera,
    public_base_url: String,
}

impl EmailTemplates {
    pub fn new(public_base_url: &str) -> AppResult<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template("verification_email.html", VERIFICATION_TEMPLATE)
            .map_err(|e| AppError::Configuration(format!("Failed to add HTML template: {}", e)))?;
        tera.add_raw_template("password_reset_email.html", PASSWORD_RESET_TEMPLATE)
            .map_err(|e| AppError::Configuration(format!("Failed to add HTML template: {}", e)))?;

        Ok(Self {
            tera,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/auth/verify-email/{}", self.public_base_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/auth/reset-password/{}", self.public_base_url, token)
    }

    pub fn verification_email(&self, to: &str, token: &str) -> AppResult<OutboundEmail> {
        let html_body = self.render(
            "verification_email.html",
            &self.verification_link(token),
            VERIFICATION_TOKEN_TTL_HOURS,
        )?;

        Ok(OutboundEmail {
            to: to.to_string(),
            subject: VERIFICATION_SUBJECT.to_string(),
            html_body,
        })
    }

    pub fn password_reset_email(&self, to: &str, token: &str) -> AppResult<OutboundEmail> {
        let html_body = self.render(
            "password_reset_email.html",
            &self.reset_link(token),
            RESET_TOKEN_TTL_HOURS,
        )?;

        Ok(OutboundEmail {
            to: to.to_string(),
            subject: PASSWORD_RESET_SUBJECT.to_string(),
            html_body,
        })
    }

    fn render(&self, template: &str, action_url: &str, expires_in_hours: i64) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("action_url", action_url);
        context.insert("expires_in_hours", &expires_in_hours);
        context.insert("app_name", APP_NAME);
        context.insert("current_year", &chrono::Utc::now().year());

        self.tera
            .render(template, &context)
            .map_err(|e| AppError::Internal(format!("Failed to render {}: {}", template, e)))
    }
}

/// SMTP delivery through lettre
pub struct SmtpGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpGateway {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?;

        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        // Port 465 speaks implicit TLS; anything else negotiates STARTTLS
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| AppError::Configuration(format!("Failed to configure SMTP relay: {}", e)))?;

        let transport = builder.port(config.smtp_port).credentials(creds).build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl NotificationGateway for SmtpGateway {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient email: {}", e)))?)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email {:?} sent successfully to: {}", subject, to);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email {:?} to {}: {}", subject, to, e);
                Err(AppError::Internal(format!("Failed to send email: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_base_url_without_double_slash() {
        let templates = EmailTemplates::new("https://aid.example.edu/").unwrap();
        assert_eq!(
            templates.verification_link("abc"),
            "https://aid.example.edu/auth/verify-email/abc"
        );
        assert_eq!(
            templates.reset_link("xyz"),
            "https://aid.example.edu/auth/reset-password/xyz"
        );
    }

    #[test]
    fn test_verification_email_content() {
        let templates = EmailTemplates::new("http://localhost:8000").unwrap();
        let email = templates
            .verification_email("s@example.com", "tok_123-ABC")
            .unwrap();

        assert_eq!(email.to, "s@example.com");
        assert_eq!(email.subject, VERIFICATION_SUBJECT);
        assert!(email
            .html_body
            .contains("http://localhost:8000/auth/verify-email/tok_123-ABC"));
        assert!(email.html_body.contains("24 hours"));
    }

    #[test]
    fn test_password_reset_email_content() {
        let templates = EmailTemplates::new("http://localhost:8000").unwrap();
        let email = templates
            .password_reset_email("s@example.com", "reset-token")
            .unwrap();

        assert_eq!(email.subject, PASSWORD_RESET_SUBJECT);
        assert!(email
            .html_body
            .contains("http://localhost:8000/auth/reset-password/reset-token"));
        assert!(email.html_body.contains("1 hour."));
    }

    // lettre's connection pool needs a reactor once the transport is built
    #[tokio::test]
    async fn test_smtp_gateway_rejects_bad_sender() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: "secret".to_string(),
            from_name: "Aid Office".to_string(),
            from_email: "not an address".to_string(),
        };
        assert!(matches!(
            SmtpGateway::new(&config),
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_smtp_gateway_builds_with_valid_sender() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: "secret".to_string(),
            from_name: "Aid Office".to_string(),
            from_email: "aid@example.com".to_string(),
        };
        assert!(SmtpGateway::new(&config).is_ok());
    }
}
