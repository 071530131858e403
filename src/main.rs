use clap::Parser;

use device_stats::app;
use device_stats::cli::Args;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let output = app::run(&args)?;
    print!("{output}");
    Ok(())
}
