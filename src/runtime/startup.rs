use tracing::info;

use crate::app::App;
use crate::cli::Command;
use crate::source::{BrowseSection, FetchRequest, QueueContext};

/// Requests to issue before the first frame: the home screen, the account
/// when a token is configured, plus whatever the command line asked to open.
pub fn initial_requests(
    app: &mut App,
    command: Option<&Command>,
    signed_in: bool,
) -> Vec<FetchRequest> {
    let mut requests = vec![FetchRequest::Browse(BrowseSection::Home)];
    app.loading = true;
    if signed_in {
        requests.push(FetchRequest::Account);
    }

    let context = match command {
        Some(Command::Playlist { id }) => Some(QueueContext::Playlist(id.clone())),
        Some(Command::Artist { id }) => Some(QueueContext::Artist(id.clone())),
        Some(Command::Search { query }) => {
            let query = query.join(" ");
            app.search_query = query.clone();
            app.expect_search(&query);
            Some(QueueContext::Search(query.trim().to_string()))
        }
        Some(Command::Config) | None => None,
    };

    if let Some(context) = context {
        info!(%context, "opening from command line");
        requests.push(FetchRequest::Queue(context));
    }
    requests
}
