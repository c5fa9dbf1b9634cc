//! Command dispatch: bridges CLI args -> core hooks -> output formatting.

pub mod auth;
pub mod collections;
pub mod config_cmd;
pub mod entries;
pub mod search;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(ctx, args, global).await,
        Command::Collections(args) => collections::handle(&ctx.shelf, args, global).await,
        Command::Entries(args) => entries::handle(&ctx.shelf, args, global).await,
        Command::Search { query } => search::handle(&ctx.shelf, &query, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
