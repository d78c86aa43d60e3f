// src/services/notifier.rs

//! New-strip notification mails.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{ComicSource, Identifier, MailConfig};
use crate::services::TemplateService;

/// A single outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub sender: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html: String,
}

/// Mail delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Delivers through a Mailgun-style `messages` endpoint.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_user: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        api_user: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_user: api_user.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let form = [
            ("from", message.sender.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.body.as_str()),
            ("html", message.html.as_str()),
        ];

        let mut request = self.client.post(&self.api_url).form(&form);
        if let Some(key) = &self.api_key {
            request = request.basic_auth(&self.api_user, Some(key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::mail(format!(
                "{} answered {}: {}",
                self.api_url,
                status,
                detail.trim()
            )));
        }
        Ok(())
    }
}

/// Logs mails instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        log::info!(
            "Mail delivery not configured; would send \"{}\" to {} ({} bytes of html)",
            message.subject,
            message.to,
            message.html.len()
        );
        Ok(())
    }
}

/// Renders and sends the "new strip" mail for a source.
pub struct Notifier {
    templates: Arc<TemplateService>,
    mailer: Arc<dyn Mailer>,
    sender: String,
    recipient: String,
    display_names: HashMap<String, String>,
}

impl Notifier {
    pub fn new(
        templates: Arc<TemplateService>,
        mailer: Arc<dyn Mailer>,
        config: &MailConfig,
    ) -> Self {
        Self {
            templates,
            mailer,
            sender: config.sender.clone(),
            recipient: config.recipient.clone(),
            display_names: config.display_names.clone(),
        }
    }

    /// Pick the mailer `config` asks for.
    pub fn mailer_from_config(config: &MailConfig, client: Client) -> Arc<dyn Mailer> {
        match &config.api_url {
            Some(url) => Arc::new(HttpMailer::new(
                client,
                url,
                &config.api_user,
                config.api_key.clone(),
            )),
            None => Arc::new(LogMailer),
        }
    }

    /// Friendly name of a source, or its raw name.
    pub fn display_name(&self, source: ComicSource) -> &str {
        self.display_names
            .get(source.as_str())
            .map(String::as_str)
            .unwrap_or(source.as_str())
    }

    /// Build the mail for `identifier` without sending it.
    pub fn compose(&self, source: ComicSource, identifier: &Identifier) -> Result<EmailMessage> {
        let html = self.templates.render_comic(source, Some(identifier))?;
        let subject = format!("A new {} is here!", self.display_name(source));
        Ok(EmailMessage {
            sender: self.sender.clone(),
            to: self.recipient.clone(),
            body: subject.clone(),
            subject,
            html,
        })
    }

    pub async fn notify(&self, source: ComicSource, identifier: &Identifier) -> Result<()> {
        let message = self.compose(source, identifier)?;
        self.mailer.send(&message).await?;
        log::info!("Sent {} email.", source);
        Ok(())
    }
}
