use stencil::{
    cli::{get_log_level_from_verbose, parse_cli, run_generate, run_list, run_prepare, Commands},
    error::default_error_handler,
};

fn main() {
    let cli = parse_cli();
    // Determine verbosity from the respective command args.
    let dispatch_result = match cli.command {
        Commands::Prepare(args) => {
            let lvl = get_log_level_from_verbose(args.verbose);
            env_logger::Builder::new().filter_level(lvl).init();
            run_prepare(args)
        }
        Commands::Generate(args) => {
            let lvl = get_log_level_from_verbose(args.verbose);
            env_logger::Builder::new().filter_level(lvl).init();
            run_generate(args)
        }
        Commands::List(args) => {
            let lvl = get_log_level_from_verbose(args.verbose);
            env_logger::Builder::new().filter_level(lvl).init();
            run_list(args)
        }
    };

    if let Err(err) = dispatch_result {
        default_error_handler(err);
    }
}
