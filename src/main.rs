mod cli;
mod commands;
mod env_loader;
mod error;
mod remote;
mod rollup;

use crate::error::RollupError;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        match err.downcast_ref::<RollupError>() {
            Some(typed) => {
                eprintln!("error[{}]: {err:#}", typed.code().as_str());
                if typed.is_precondition() {
                    eprintln!("hint: run `rollup verify` to check tools, config and manifest");
                }
            }
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
