use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => super::run::run(args).await,
        Command::Exec(args) => super::exec::run(args).await,
        Command::Policies(args) => super::policies::run(args).await,
        Command::Sql => Ok(super::sql::run()),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
