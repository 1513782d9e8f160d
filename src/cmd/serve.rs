use crate::cmd::Cmd;
use anyhow::Context;
use authority::Authority;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::net::TcpListener;

pub struct AuthorityCmd;

impl Cmd for AuthorityCmd {
    const NAME: &'static str = "authority";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("run the key-table authority")
            .arg(
                Arg::new("rsa-bits")
                    .long("rsa-bits")
                    .action(ArgAction::Set)
                    .value_parser(value_parser!(usize))
                    .default_value("2048")
                    .help("modulus width in bits"),
            )
            .arg(
                Arg::new("hash-bits")
                    .long("hash-bits")
                    .action(ArgAction::Set)
                    .value_parser(value_parser!(usize))
                    .default_value("256")
                    .help("hash width in bits, one table row per bit; must be a multiple of 8"),
            )
            .arg(
                Arg::new("max-queries")
                    .long("max-queries")
                    .action(ArgAction::Set)
                    .value_parser(value_parser!(usize))
                    .default_value("16")
                    .help("private-table queries answered per key epoch"),
            )
            .arg(
                Arg::new("listen")
                    .long("listen")
                    .short('l')
                    .action(ArgAction::Set)
                    .default_value("127.0.0.1:4460")
                    .help("listen address"),
            )
            .arg(
                Arg::new("debug-key")
                    .long("debug-key")
                    .action(ArgAction::SetTrue)
                    .required(false)
                    .help("start with the tiny fixed demo key instead of an empty epoch"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let (rsa_bits, hash_bits, max_queries) = (
            *m.get_one::<usize>("rsa-bits").unwrap(),
            *m.get_one::<usize>("hash-bits").unwrap(),
            *m.get_one::<usize>("max-queries").unwrap(),
        );
        let listen = m.get_one::<String>("listen").unwrap();

        log::info!("authority parameters:");
        log::info!("    rsa bits: {rsa_bits}");
        log::info!("    hash bits: {hash_bits}");
        log::info!("    max queries: {max_queries}");

        let service = Authority::new(rsa_bits, hash_bits, max_queries);
        if m.get_flag("debug-key") {
            service.install_debug_key();
            log::warn!("running with the fixed insecure demo key");
        }

        let listener = TcpListener::bind(listen.as_str())
            .with_context(|| format!("binding `{listen}` failed"))?;
        log::info!("authority is listening on {listen}");

        link::serve(listener, &service)?;
        Ok(())
    }
}
