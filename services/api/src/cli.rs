use crate::demo::{run_demo, run_slot_inventory, DemoArgs, SlotsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_booking::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Booking",
    about = "Run and inspect the interview time-slot booking service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print every slot known for a submission, booked ones included
    Slots(SlotsArgs),
    /// Book a slot end-to-end against an in-memory store
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Slots(args) => run_slot_inventory(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
