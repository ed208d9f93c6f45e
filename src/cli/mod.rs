pub mod args;
pub mod runner;

pub use args::{
    get_log_level_from_verbose, parse_cli, BuilderArg, Cli, Commands, GenerateArgs, GitArg,
    ListArgs, PrepareArgs,
};
pub use runner::{run_generate, run_list, run_prepare};
