mod diff;
mod init;
mod list;
mod review;
mod run;
mod validate;

use super::args::{Cli, Command};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Diff(args) => diff::run(args),
        Command::Review(args) => review::run(args),
        Command::List(args) => list::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Init(args) => init::run(args),
    }
}
