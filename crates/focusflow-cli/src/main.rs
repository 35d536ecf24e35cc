use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "focusflow", version, about = "FocusFlow: tasks, Pomodoro timer and study schedule")]
struct Cli {
    /// Act as this user instead of `user.id` from config
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Show the derived focus/break schedule
    Calendar(commands::calendar::CalendarArgs),
    /// Ask the productivity assistant
    Chat(commands::chat::ChatArgs),
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FOCUSFLOW_LOG")
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.user);

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(&ctx, action),
        Commands::Timer { action } => commands::timer::run(&ctx, action),
        Commands::Calendar(args) => commands::calendar::run(&ctx, args),
        Commands::Chat(args) => commands::chat::run(&ctx, args),
        Commands::Stats { action } => commands::stats::run(&ctx, action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focusflow", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
