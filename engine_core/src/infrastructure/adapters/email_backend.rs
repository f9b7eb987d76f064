//! `email` send backend (§4.5). SMTP delivery mechanics are explicitly
//! out-of-scope for the core (external collaborator, §1); this adapter is
//! the thin seam where that collaborator is actually wired in, constructed
//! once at bootstrap with the relay's connection details rather than
//! threading them through every call.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pipeline_flow_domain::entities::FolderConfiguration;
use pipeline_flow_domain::services::{SendBackend, SendResult};
use pipeline_flow_domain::PipelineError;

pub struct EmailBackend {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailBackend {
    pub fn new(relay_host: &str, username: String, password: String, from_address: String) -> Result<Self, PipelineError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay_host)
            .map_err(|e| PipelineError::invalid_config(format!("smtp relay \"{relay_host}\" rejected: {e}")))?
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self { transport, from_address })
    }
}

#[async_trait]
impl SendBackend for EmailBackend {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, folder: &FolderConfiguration, file_path: &str) -> SendResult {
        let Some(destination) = &folder.email_destination else {
            return SendResult::failed("email", "", "email_destination not configured");
        };
        if destination.recipients.is_empty() {
            return SendResult::failed("email", "", "email_destination has no recipients");
        }

        let file_name = file_path.rsplit('/').next().unwrap_or(file_path).to_string();
        let bytes = match std::fs::read(file_path) {
            Ok(bytes) => bytes,
            Err(error) => return SendResult::failed("email", destination.recipients.join(","), format!("could not read {file_path}: {error}")),
        };

        let mut builder = Message::builder().from(match self.from_address.parse() {
            Ok(mailbox) => mailbox,
            Err(error) => return SendResult::failed("email", "", format!("invalid from address: {error}")),
        });
        for recipient in &destination.recipients {
            builder = match recipient.parse() {
                Ok(mailbox) => builder.to(mailbox),
                Err(error) => return SendResult::failed("email", recipient, format!("invalid recipient: {error}")),
            };
        }

        let message = builder.subject(&destination.subject).multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(format!("Attached: {file_name}")))
                .singlepart(Attachment::new(file_name).body(bytes, ContentType::parse("application/octet-stream").unwrap())),
        );
        let message = match message {
            Ok(message) => message,
            Err(error) => return SendResult::failed("email", destination.recipients.join(","), error.to_string()),
        };

        match self.transport.send(message).await {
            Ok(_) => SendResult::ok("email", destination.recipients.join(",")),
            Err(error) => SendResult::failed("email", destination.recipients.join(","), error.to_string()),
        }
    }

    fn validate(&self, folder: &FolderConfiguration) -> Result<(), PipelineError> {
        match &folder.email_destination {
            Some(dest) if !dest.recipients.is_empty() => Ok(()),
            _ => Err(PipelineError::missing_backend_field("email backend enabled without recipients")),
        }
    }
}
