use crate::cmd::Cmd;
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use link::{KeyTableService, TcpLink};

pub struct StatusCmd;

impl Cmd for StatusCmd {
    const NAME: &'static str = "status";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("show the authority's parameters and key state")
            .arg(
                Arg::new("connect")
                    .long("connect")
                    .short('c')
                    .action(ArgAction::Set)
                    .default_value("127.0.0.1:4460")
                    .help("authority address"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let addr = m.get_one::<String>("connect").unwrap();
        let service = TcpLink::connect(addr.as_str())
            .with_context(|| format!("connecting to `{addr}` failed"))?;

        let params = service.parameters()?;
        println!("rsa bits: {}", params.rsa_bits);
        println!("hash bits: {}", params.hash_bits);
        println!("max queries: {}", params.max_queries);
        println!("initialized: {}", service.is_initialized()?);

        Ok(())
    }
}
