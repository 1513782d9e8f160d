use clap::Command;
use log::LevelFilter;
use splitsig::cmd::{AuthorityCmd, Cmd, SignCmd, StatusCmd, VerifyCmd};

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let version = env!("SPLITSIG_VERSION_INFO");
    let app = Command::new("splitsig")
        .version(version)
        .about("split-key rsa signing against a query-bounded key-table authority")
        .subcommand(AuthorityCmd::cmd())
        .subcommand(SignCmd::cmd())
        .subcommand(VerifyCmd::cmd())
        .subcommand(StatusCmd::cmd())
        .get_matches();

    let result = match app.subcommand() {
        Some((AuthorityCmd::NAME, m)) => AuthorityCmd.run(m),
        Some((SignCmd::NAME, m)) => SignCmd.run(m),
        Some((VerifyCmd::NAME, m)) => VerifyCmd.run(m),
        Some((StatusCmd::NAME, m)) => StatusCmd.run(m),
        Some((name, _)) => {
            panic!("unsupport for {}", name)
        }
        None => {
            println!("{} {}", env!("CARGO_PKG_NAME"), version);
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{e:#}");
        std::process::exit(2);
    }
}
