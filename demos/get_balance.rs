use tracing_subscriber::EnvFilter;
use vonage::VonageClientBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = VonageClientBuilder::from_env()?.build()?;
    let balance = client.account().get_balance().await?;
    println!(
        "balance: {:.2}, auto_reload: {}",
        balance.value, balance.auto_reload
    );

    let secrets = client.account().list_secrets(None).await?;
    for secret in secrets.secrets() {
        println!("secret {} created at {:?}", secret.id, secret.created_at);
    }

    Ok(())
}
