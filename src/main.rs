use clap::Parser;
use miette::Result;
use masterdesk::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Terminate quietly on a closed pipe (`mdesk list units | head`)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => masterdesk::cli::commands::init::run(args),
        Commands::Resources(args) => masterdesk::cli::commands::resources::run(args, &global),
        Commands::List(args) => masterdesk::cli::commands::list::run(args, &global),
        Commands::Show(args) => masterdesk::cli::commands::show::run(args, &global),
        Commands::Add(args) => masterdesk::cli::commands::add::run(args, &global),
        Commands::Edit(args) => masterdesk::cli::commands::edit::run(args, &global),
        Commands::Delete(args) => masterdesk::cli::commands::delete::run(args, &global),
        Commands::Perms(args) => masterdesk::cli::commands::perms::run(args, &global),
        Commands::Options(args) => masterdesk::cli::commands::options::run(args, &global),
        Commands::Config(cmd) => masterdesk::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => masterdesk::cli::commands::completions::run(args),
    }
}

/// Logs go to stderr; MDESK_LOG overrides the level picked by --verbose
fn init_logging(global: &GlobalOpts) {
    let fallback = if global.verbose { "masterdesk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MDESK_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
