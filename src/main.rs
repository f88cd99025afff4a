/*
 * Responsibility
 * - tokio runtime
 * - call app::run() (no logic here)
 */
use anyhow::Result;

use edge_auth::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
