//! `mdesk perms` command - resolved permissions for a resource

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{block_on, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Action;

#[derive(clap::Args, Debug)]
pub struct PermsArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,
}

pub fn run(args: PermsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let gate = session.gate();
    let set = block_on(gate.resolve(&descriptor.scope()))?;

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&set).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&set).into_diagnostic()?),
        OutputFormat::Id => {
            for action in set.visible_actions() {
                println!("{}", action);
            }
        }
        _ => {
            println!(
                "{} {}",
                style(&descriptor.label).bold(),
                style(format!("({})", descriptor.route)).dim()
            );
            for action in Action::all() {
                let mark = if set.allows(*action) {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                println!("  {} {}", mark, action);
            }
        }
    }
    Ok(())
}
