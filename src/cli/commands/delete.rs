//! `mdesk delete` command - delete a record after confirmation

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{block_on, expect_loaded, finish_submit, locate, Session};
use crate::cli::GlobalOpts;
use crate::core::{Action, RecordId};

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Record id
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let screen = session.screen(descriptor)?;
    let id = RecordId::new(args.id.as_str());

    block_on(async {
        expect_loaded(screen.mount().await)?;
        if !screen.permissions().can_delete {
            return Err(miette::miette!("You are not allowed to delete {}", descriptor.label));
        }
        locate(&screen, &id).await?;
        screen.begin(Action::Delete);

        if !args.yes {
            let code = screen
                .controller()
                .form()
                .values
                .text(&descriptor.code_field)
                .unwrap_or_else(|| id.to_string());
            let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Delete {} {}?", descriptor.label, code))
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !confirmed {
                screen.controller().cancel();
                println!("{}", style("Cancelled").dim());
                return Ok(());
            }
        }

        let outcome = screen.submit().await;
        finish_submit(&screen, outcome, global.quiet)
    })?
}
