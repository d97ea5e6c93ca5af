use clap::Parser;
use form_autofill::cli::commands::{
    ModelArgs, cmd_autofill, cmd_fill, cmd_map, cmd_scan, init_logging,
};
use form_autofill::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    // Endpoint/model resolution: CLI > config > env > defaults
    let model_args = ModelArgs {
        endpoint: cli.endpoint.as_deref(),
        model: cli.model.as_deref(),
    };

    match cli.command {
        Commands::Scan { input } => {
            cmd_scan(&input)?;
        }
        Commands::Map {
            input,
            dataset,
            backend,
            output,
        } => {
            cmd_map(&input, &dataset, &backend, output.as_deref(), model_args, &config)?;
        }
        Commands::Fill {
            input,
            commands,
            output,
        } => {
            cmd_fill(&input, &commands, output.as_deref(), &config)?;
        }
        Commands::Autofill {
            input,
            dataset,
            backend,
            script,
            output,
        } => {
            cmd_autofill(
                &input,
                &dataset,
                &backend,
                script.as_deref(),
                output.as_deref(),
                model_args,
                &config,
            )?;
        }
    }

    Ok(())
}
