use std::io;

use tracing_subscriber::EnvFilter;
use vonage::VonageClientBuilder;
use vonage::domain::{ContactsList, ListAttribute};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let name = std::env::var("VONAGE_LIST_NAME").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "VONAGE_LIST_NAME environment variable is required",
        )
    })?;

    let client = VonageClientBuilder::from_env()?.build()?;
    let list = ContactsList::builder(name)
        .description("created by the vonage demo")
        .attribute(ListAttribute::new("phone")?.key(true))
        .attribute(ListAttribute::new("first_name")?)
        .build()?;

    let created = client.proactive_connect().create_list(&list).await?;
    println!(
        "list id: {:?}, created_at: {:?}",
        created.id(),
        created.created_at()
    );

    Ok(())
}
