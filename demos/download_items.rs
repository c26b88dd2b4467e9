use std::io;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use vonage::{DownloadTarget, Downloaded, ListId, VonageClientBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let list_id = std::env::var("VONAGE_LIST_ID").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "VONAGE_LIST_ID environment variable is required",
        )
    })?;
    let target = match std::env::var("VONAGE_OUTPUT") {
        Ok(path) => DownloadTarget::File(PathBuf::from(path)),
        Err(_) => DownloadTarget::Memory,
    };

    let client = VonageClientBuilder::from_env()?.build()?;
    let downloaded = client
        .proactive_connect()
        .download_items(&ListId::new(list_id)?, target)
        .await?;

    match downloaded {
        Downloaded::Bytes(bytes) => print!("{}", String::from_utf8_lossy(&bytes)),
        Downloaded::File {
            path,
            bytes_written,
        } => println!("wrote {bytes_written} bytes to {}", path.display()),
    }

    Ok(())
}
