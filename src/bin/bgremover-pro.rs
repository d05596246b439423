//! Background Remover Pro command-line tool
//!
//! Select images, tune the settings and write cut-outs, the same flow as the
//! desktop app.

#[cfg(feature = "cli")]
use bgremover_pro::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
