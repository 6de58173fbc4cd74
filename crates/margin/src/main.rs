mod app;
mod command;
mod host;

use app::{Args, RunCmd};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "margin", version)]
pub struct Margin {
    #[clap(flatten)]
    pub args: Args,

    #[clap(subcommand)]
    pub cmd: RunCmd,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let margin = Margin::parse();
    margin.cmd.run(margin.args).await
}
