//! `mdesk edit` command - update a record

use console::Term;
use miette::Result;

use crate::cli::commands::add::prompt_fields;
use crate::cli::commands::utils::{apply_assignments, block_on, expect_loaded, finish_submit, locate, Session};
use crate::cli::GlobalOpts;
use crate::core::{Action, RecordId};

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Record id
    pub id: String,

    /// New field value, repeatable. Without any, fields are prompted for.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub values: Vec<String>,
}

pub fn run(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let screen = session.screen(descriptor)?;
    let id = RecordId::new(args.id.as_str());

    block_on(async {
        expect_loaded(screen.mount().await)?;
        if !screen.permissions().can_update {
            return Err(miette::miette!("You are not allowed to edit {}", descriptor.label));
        }
        locate(&screen, &id).await?;
        screen.begin(Action::Update);

        if args.values.is_empty() && Term::stdout().is_term() {
            prompt_fields(&screen)?;
        } else {
            apply_assignments(&screen, &args.values)?;
        }
        let outcome = screen.submit().await;
        finish_submit(&screen, outcome, global.quiet)
    })?
}
