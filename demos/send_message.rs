use std::io;

use tracing_subscriber::EnvFilter;
use vonage::{Channel, MessageContent, MessageRequest, VonageClientBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let to = std::env::var("VONAGE_TO").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "VONAGE_TO environment variable is required",
        )
    })?;
    let from = std::env::var("VONAGE_FROM").unwrap_or_else(|_| "Vonage".to_owned());
    let text = std::env::var("VONAGE_TEXT")
        .unwrap_or_else(|_| "Hello from the vonage demo.".to_owned());
    let sandbox = std::env::var("VONAGE_SANDBOX").is_ok_and(|v| v == "1");

    let client = VonageClientBuilder::from_env()?
        .messages_sandbox(sandbox)
        .build()?;
    let request = MessageRequest::builder(Channel::Sms, MessageContent::text(text))
        .to(to)
        .from(from)
        .build()?;

    let response = client.messages().send(&request).await?;
    println!("message_uuid: {}", response.message_uuid);

    Ok(())
}
