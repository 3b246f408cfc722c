mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ContractArgs, DeleteArgs, GetArgs, ListArgs, ProposalArgs, PurgeArgs, TokensArgs, ValorArgs,
    WordsArgs,
};
use proposta::Settings;

/// Proposta - rental proposal and contract generator
#[derive(Parser, Debug)]
#[command(name = "proposta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a proposal PDF
    Proposal(ProposalArgs),

    /// Generate a contract PDF
    Contract(ContractArgs),

    /// List stored documents, newest first
    List(ListArgs),

    /// Write a stored PDF to a file
    Get(GetArgs),

    /// Remove a stored document
    Delete(DeleteArgs),

    /// Remove stored documents older than a number of days
    Purge(PurgeArgs),

    /// List the tokens a template uses
    Tokens(TokensArgs),

    /// Write a number out in Portuguese
    Words(WordsArgs),

    /// Format an amount in reais, with words
    Valor(ValorArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = || -> anyhow::Result<Settings> {
        let settings = Settings::load()?;
        log::debug!("{settings:?}");
        Ok(settings)
    };

    match cli.command {
        Command::Proposal(args) => commands::proposal(args, &settings()?),
        Command::Contract(args) => commands::contract(args, &settings()?),
        Command::List(args) => commands::list(args, &settings()?),
        Command::Get(args) => commands::get(args, &settings()?),
        Command::Delete(args) => commands::delete(args, &settings()?),
        Command::Purge(args) => commands::purge(args, &settings()?),
        Command::Tokens(args) => commands::tokens(args, &settings()?),
        Command::Words(args) => commands::words(args),
        Command::Valor(args) => commands::valor(args),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("Erro: {err:#}");
        eprintln!();
        std::process::exit(1);
    }
}
