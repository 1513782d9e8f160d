use crate::cmd::Cmd;
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use combiner::Combiner;
use link::{KeyTableService, TcpLink};

pub struct SignCmd;

impl Cmd for SignCmd {
    const NAME: &'static str = "sign";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("hash a message and fold it into a signature")
            .arg(
                Arg::new("connect")
                    .long("connect")
                    .short('c')
                    .action(ArgAction::Set)
                    .default_value("127.0.0.1:4460")
                    .help("authority address"),
            )
            .arg(
                Arg::new("message")
                    .long("message")
                    .short('m')
                    .action(ArgAction::Set)
                    .required(true)
                    .help("utf-8 text to sign"),
            )
            .arg(
                Arg::new("prefix")
                    .long("prefix")
                    .required(false)
                    .action(ArgAction::SetTrue)
                    .help("display prefix with `0x`"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let addr = m.get_one::<String>("connect").unwrap();
        let message = m.get_one::<String>("message").unwrap();

        let service = TcpLink::connect(addr.as_str())
            .with_context(|| format!("connecting to `{addr}` failed"))?;

        if !service.is_initialized()? {
            log::info!("no key epoch is live, generating one");
            service.generate_new_key()?;
        }

        let combiner = Combiner::connect(service)?;
        let signature = combiner.sign(message)?;

        if m.get_flag("prefix") {
            println!("{:#02x}", signature);
        } else {
            println!("{:02x}", signature);
        }

        Ok(())
    }
}
