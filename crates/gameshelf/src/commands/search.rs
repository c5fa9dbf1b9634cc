//! Game catalog search.

use tabled::Tabled;

use gameshelf_core::{Game, Shelf};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct GameRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Platforms")]
    platforms: String,
}

impl From<&Game> for GameRow {
    fn from(g: &Game) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
            year: util::or_blank(g.release_year),
            platforms: g.platforms.as_deref().map(|p| p.join(", ")).unwrap_or_default(),
        }
    }
}

pub async fn handle(shelf: &Shelf, query: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let games = shelf.search().search(query).await?;
    let out = output::render_list(&global.output, &games, |g| GameRow::from(g), |g| g.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
