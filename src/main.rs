#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = madrasa_api::run().await {
        eprintln!("madrasa-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
