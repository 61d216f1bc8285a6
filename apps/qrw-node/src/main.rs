use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = qrw_node::Args::parse();

	qrw_node::run(args).await
}
