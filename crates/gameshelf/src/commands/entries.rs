//! Entry command handlers.

use tabled::Tabled;

use gameshelf_core::validation::validate_entry;
use gameshelf_core::{CollectionEntry, CreateEntryRequest, Shelf, UpdateEntryRequest};

use crate::cli::{EntriesArgs, EntriesCommand, EntryFields, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Game")]
    game: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl From<&CollectionEntry> for EntryRow {
    fn from(e: &CollectionEntry) -> Self {
        let game = e
            .game
            .as_ref()
            .map_or_else(|| format!("#{}", e.game_id), |g| g.name.clone());
        let tags = e
            .custom_tags
            .as_ref()
            .map(|tags| {
                tags.iter()
                    .map(|(k, v)| format!("{k}={}", util::tag_value(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        Self {
            id: e.id,
            game,
            status: e.status.clone().unwrap_or_default(),
            rating: util::or_blank(e.rating),
            tags,
            notes: e.notes.clone().unwrap_or_default(),
        }
    }
}

fn check_fields(fields: &EntryFields) -> Result<(), CliError> {
    validate_entry(fields.rating, fields.notes.as_deref(), fields.status.as_deref())?;
    Ok(())
}

pub async fn handle(shelf: &Shelf, args: EntriesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::require_login(shelf)?;
    let collection_id = args.collection;
    let entries = shelf.entries(collection_id);

    match args.command {
        EntriesCommand::List => {
            let list = entries.list().await?;
            let out = output::render_list(&global.output, &list, |e| EntryRow::from(e), |e| e.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntriesCommand::Add { game_id, fields } => {
            check_fields(&fields)?;
            let custom_tags = util::parse_tags(&fields.tags)?;
            let added = entries
                .add(CreateEntryRequest {
                    game_id,
                    notes: fields.notes,
                    status: fields.status,
                    rating: fields.rating,
                    custom_tags,
                })
                .await?;
            output::success(
                global,
                &format!("Game {game_id} added to collection {collection_id} (entry {})", added.id),
            );
            Ok(())
        }

        EntriesCommand::Update { entry_id, fields } => {
            check_fields(&fields)?;
            let custom_tags = util::parse_tags(&fields.tags)?;
            let request = UpdateEntryRequest {
                notes: fields.notes,
                status: fields.status,
                rating: fields.rating,
                custom_tags,
            };
            if request == UpdateEntryRequest::default() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass --notes, --status, --rating, or --tag".into(),
                });
            }
            entries.update(entry_id, request).await?;
            output::success(global, &format!("Entry {entry_id} updated"));
            Ok(())
        }

        EntriesCommand::Remove { entry_id } => {
            if !util::confirm(
                &format!("Remove entry {entry_id} from collection {collection_id}?"),
                global.yes,
            )? {
                return Ok(());
            }
            entries.remove(entry_id).await?;
            output::success(global, &format!("Entry {entry_id} removed"));
            Ok(())
        }
    }
}
