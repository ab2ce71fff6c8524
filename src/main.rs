use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    healthplan::run().await
}
