//! `rows`: what the access-control layer sees for a username.

use tabled::Tabled;

use netpass_core::RadiusRow;

use crate::cli::{GlobalOpts, RowsArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
pub(super) struct RadiusRowView {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Op")]
    op: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&RadiusRow> for RadiusRowView {
    fn from(row: &RadiusRow) -> Self {
        Self {
            table: row.table.to_string(),
            username: row.username.clone(),
            attribute: row.attribute.clone(),
            op: row.op.clone(),
            value: row.value.clone(),
        }
    }
}

/// Render rows in the selected format; `plain` prints `attribute op value`.
pub(super) fn render(rows: &[RadiusRow], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(&global.output, rows, |r| RadiusRowView::from(r), |r| {
        format!("{} {} {}", r.attribute, r.op, r.value)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle(args: &RowsArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let rows = ctx
        .engine
        .stores()
        .auth
        .rows_for(ctx.tenant()?, &args.username)?;
    render(&rows, global)
}
