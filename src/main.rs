use clap::Parser;
use spwd::cli::{init_logging, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => spwd::cli::commands::init::execute(&cli),
        Commands::Generate { ref mode, length } => {
            spwd::cli::commands::generate::execute(&cli, mode.as_deref(), length)
        }
        Commands::List => spwd::cli::commands::list::execute(&cli),
        Commands::Show { id } => spwd::cli::commands::show::execute(&cli, id),
        Commands::Delete { id, force } => spwd::cli::commands::delete::execute(&cli, id, force),
        Commands::Note { id, ref text } => spwd::cli::commands::note::execute(&cli, id, text),
        Commands::Completions { shell } => spwd::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        spwd::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
