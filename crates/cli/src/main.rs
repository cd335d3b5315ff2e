use clap::Parser;

fn main() -> anyhow::Result<()> {
    moneydesk_observability::init_stderr();

    let config = moneydesk_infra::AppConfig::from_env()?;
    let cli = moneydesk_cli::Cli::parse();
    let output = moneydesk_cli::run(cli.command, &config)?;
    println!("{output}");
    Ok(())
}
