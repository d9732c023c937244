#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wordcards_backend::run().await
}
