use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dispatchbox")]
#[command(about = "Dispatch DICOM task folders to configured targets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Server(ServerArgs),
    /// Send every DICOM file under a folder to a configured target
    Send(SendArgs),
    /// Probe connectivity to a configured target
    Test(TestArgs),
    /// List registered target types
    Types,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Name of a target from the configuration file
    #[arg(long)]
    pub target: String,

    /// Folder holding the task's DICOM files
    #[arg(long)]
    pub folder: PathBuf,

    /// Task id for log correlation; generated when omitted
    #[arg(long)]
    pub task_id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TestArgs {
    /// Name of a target from the configuration file
    #[arg(long)]
    pub target: String,
}
