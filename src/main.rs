use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    soulbrowser_recorder::cli::app::run().await
}
