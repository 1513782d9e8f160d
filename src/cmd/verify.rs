use crate::cmd::Cmd;
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use combiner::{Combiner, Verdict};
use link::TcpLink;
use num_bigint::BigUint;
use num_traits::Num;

pub struct VerifyCmd;

impl Cmd for VerifyCmd {
    const NAME: &'static str = "verify";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("check a signature against a message")
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
                    .help("utf-8 text the signature claims to cover"),
            )
            .arg(
                Arg::new("signature")
                    .long("signature")
                    .short('s')
                    .action(ArgAction::Set)
                    .required(true)
                    .help("signature as a hex integer"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let addr = m.get_one::<String>("connect").unwrap();
        let message = m.get_one::<String>("message").unwrap();
        let signature = m.get_one::<String>("signature").unwrap();

        let signature = BigUint::from_str_radix(signature.trim_start_matches("0x"), 16)
            .context("the signature is not a hex integer")?;

        let service = TcpLink::connect(addr.as_str())
            .with_context(|| format!("connecting to `{addr}` failed"))?;
        let combiner = Combiner::connect(service)?;

        match combiner.verify(message, &signature)? {
            Verdict::Valid => {
                println!("signature successfully verified");
                Ok(())
            }
            Verdict::Invalid => {
                eprintln!("signature is invalid");
                std::process::exit(1);
            }
        }
    }
}
