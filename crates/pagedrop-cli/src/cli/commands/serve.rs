//! `pagedrop serve`: dispatch JSON bridge messages read from stdin, one per line.

use crate::cli::session::Session;
use anyhow::{Context, Result};
use pagedrop_core::config::PagedropConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_serve(cfg: PagedropConfig) -> Result<()> {
    let session = Session::start(cfg)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0usize;
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        session.channel().dispatch_json(line);
        count += 1;
    }
    tracing::info!(messages = count, "stdin closed");
    session.finish().await
}
