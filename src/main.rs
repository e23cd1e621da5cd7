mod cli;

use clap::Parser;
use cli::{Cli, Commands, SendArgs, TestArgs};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use dispatchbox::config::Config;
use dispatchbox::dispatch::Dispatcher;
use dispatchbox::handlers::{DispatchContext, HandlerRegistry};
use dispatchbox::observability::{self, Metrics};
use dispatchbox::targets::TargetRecord;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    observability::init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Server(args) => {
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            dispatchbox::api::run(config).await?
        }
        Commands::Send(args) => send(config, args).await?,
        Commands::Test(args) => test(config, args).await?,
        Commands::Types => {
            let registry = HandlerRegistry::with_defaults(&config.handler_settings())?;
            for info in registry.infos() {
                println!("{:<14} {:<14} {}", info.kind.name(), info.display_name, info.icon);
            }
        }
    }

    Ok(())
}

fn dispatcher(config: &Config) -> Result<Dispatcher, AnyError> {
    let registry = HandlerRegistry::with_defaults(&config.handler_settings())?;
    let dispatcher = Dispatcher::new(registry, Arc::new(Metrics::new()));
    Ok(dispatcher.with_deadline(config.dispatch.deadline()))
}

fn target<'a>(config: &'a Config, name: &str) -> Result<&'a TargetRecord, AnyError> {
    config
        .targets
        .get(name)
        .ok_or_else(|| format!("unknown target '{}'", name).into())
}

async fn send(config: Config, args: SendArgs) -> Result<(), AnyError> {
    let record = target(&config, &args.target)?;
    let task_id = args
        .task_id
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    let task = json!({ "id": task_id, "folder": args.folder.display().to_string() });

    let outcome = dispatcher(&config)?
        .send(
            &task_id,
            record,
            &DispatchContext::for_target(&args.target),
            &args.folder,
            &task,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn test(config: Config, args: TestArgs) -> Result<(), AnyError> {
    let record = target(&config, &args.target)?;
    let result = dispatcher(&config)?
        .test_connection(record, &args.target)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
