use clap::{ArgMatches, Command};

pub trait Cmd {
    const NAME: &'static str;

    fn cmd() -> Command;

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()>;
}

mod serve;
pub use serve::AuthorityCmd;

mod sign;
pub use sign::SignCmd;

mod verify;
pub use verify::VerifyCmd;

mod status;
pub use status::StatusCmd;
