use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::{
    Account, AccountSource, BrowseEntry, BrowseSection, LibraryEdit, Queue, QueueContext,
    SourceError, TrackSource,
};

#[derive(Debug, Clone)]
pub enum FetchRequest {
    Queue(QueueContext),
    Browse(BrowseSection),
    Account,
    Edit(LibraryEdit),
}

#[derive(Debug)]
pub enum FetchResult {
    Queue {
        context: QueueContext,
        result: Result<Queue, SourceError>,
    },
    Browse {
        section: BrowseSection,
        result: Result<Vec<BrowseEntry>, SourceError>,
    },
    Account(Result<Account, SourceError>),
    Edit {
        edit: LibraryEdit,
        result: Result<String, SourceError>,
    },
}

/// Runs a `TrackSource` and `AccountSource` on a worker thread.
///
/// Requests are served one at a time in arrival order. The thread exits when
/// the `Fetcher` is dropped.
pub struct Fetcher {
    tx: Sender<FetchRequest>,
    rx: Receiver<FetchResult>,
    _join: JoinHandle<()>,
}

impl Fetcher {
    pub fn spawn<S>(source: S) -> Self
    where
        S: TrackSource + AccountSource + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel::<FetchRequest>();
        let (res_tx, res_rx) = mpsc::channel::<FetchResult>();

        let join = thread::spawn(move || {
            for req in req_rx {
                debug!(?req, "fetching");
                let res = match req {
                    FetchRequest::Queue(context) => {
                        let result = source.fetch_queue(&context);
                        if let Err(e) = &result {
                            warn!(%context, error = %e, "queue fetch failed");
                        }
                        FetchResult::Queue { context, result }
                    }
                    FetchRequest::Browse(section) => {
                        let result = source.browse(section);
                        if let Err(e) = &result {
                            warn!(?section, error = %e, "browse fetch failed");
                        }
                        FetchResult::Browse { section, result }
                    }
                    FetchRequest::Account => {
                        let result = source.current_user();
                        if let Err(e) = &result {
                            warn!(error = %e, "account lookup failed");
                        }
                        FetchResult::Account(result)
                    }
                    FetchRequest::Edit(edit) => {
                        let result = source.edit_library(&edit);
                        if let Err(e) = &result {
                            warn!(?edit, error = %e, "library edit failed");
                        }
                        FetchResult::Edit { edit, result }
                    }
                };
                if res_tx.send(res).is_err() {
                    break;
                }
            }
        });

        Self {
            tx: req_tx,
            rx: res_rx,
            _join: join,
        }
    }

    pub fn request(&self, req: FetchRequest) {
        let _ = self.tx.send(req);
    }

    /// Drain all finished results without blocking.
    pub fn poll(&self) -> Vec<FetchResult> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }
}
