use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = koma_cli::Args::parse();
	koma_cli::run(args).await
}
