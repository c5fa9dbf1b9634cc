//! Collection command handlers.

use tabled::Tabled;

use gameshelf_core::validation::{validate_collection, validate_collection_update};
use gameshelf_core::{Collection, CollectionWithCount, CreateCollectionRequest, Shelf, UpdateCollectionRequest};

use crate::cli::{CollectionsArgs, CollectionsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Games")]
    games: usize,
}

impl From<&CollectionWithCount> for CollectionRow {
    fn from(c: &CollectionWithCount) -> Self {
        Self {
            id: c.collection.id,
            name: c.collection.name.clone(),
            description: c.collection.description.clone(),
            games: c.game_count,
        }
    }
}

fn collection_detail(c: &Collection) -> String {
    output::detail(&[
        ("ID", c.id.to_string()),
        ("Name", c.name.clone()),
        ("Description", c.description.clone()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(shelf: &Shelf, args: CollectionsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::require_login(shelf)?;
    let collections = shelf.collections();

    match args.command {
        CollectionsCommand::List => {
            let view = shelf.library().load().await;
            if let Some(err) = view.error {
                return Err(err.into());
            }
            let out = output::render_list(
                &global.output,
                &view.collections,
                |c| CollectionRow::from(c),
                |c| c.collection.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CollectionsCommand::Show { id } => {
            let collection = collections.get(id).await?;
            let out = output::render_single(&global.output, &collection, collection_detail, |c| {
                c.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CollectionsCommand::Create { name, description } => {
            validate_collection(&name, description.as_deref().unwrap_or_default())?;
            let created = collections
                .create(CreateCollectionRequest {
                    name: name.trim().to_owned(),
                    description,
                })
                .await?;
            output::success(global, &format!("Collection '{}' created (id {})", created.name, created.id));
            Ok(())
        }

        CollectionsCommand::Update { id, name, description } => {
            if name.is_none() && description.is_none() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass --name and/or --description".into(),
                });
            }
            validate_collection_update(name.as_deref(), description.as_deref())?;
            let updated = collections
                .update(
                    id,
                    UpdateCollectionRequest {
                        name: name.map(|n| n.trim().to_owned()),
                        description,
                    },
                )
                .await?;
            output::success(global, &format!("Collection {} updated", updated.id));
            Ok(())
        }

        CollectionsCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete collection {id} and all of its games?"),
                global.yes,
            )? {
                return Ok(());
            }
            collections.delete(id).await?;
            output::success(global, &format!("Collection {id} deleted"));
            Ok(())
        }
    }
}
