//! Folder batch: every image in `input_images/` is written to
//! `output_images/` as PNG and WEBP.

#[cfg(feature = "cli")]
use bgremover_pro::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::batch::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
