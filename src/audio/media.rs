//! Fetching and decoding media into `rodio` sinks.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;

use super::types::Generation;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download failed with HTTP {0}")]
    Status(u16),
    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode media: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MediaLocation {
    Remote(String),
    Local(PathBuf),
}

pub(super) fn locate(src: &str) -> MediaLocation {
    let src = src.trim();
    if src.starts_with("http://") || src.starts_with("https://") {
        MediaLocation::Remote(src.to_string())
    } else {
        MediaLocation::Local(PathBuf::from(src.strip_prefix("file://").unwrap_or(src)))
    }
}

/// Result of a background fetch, tagged with the load it was started for.
pub(super) type Fetched = (Generation, Result<Vec<u8>, MediaError>);

/// Fetch `src` on its own thread and report back on `done`.
///
/// The command loop keeps serving play, pause and quit while the download
/// runs; a result for a generation that has since been replaced is simply
/// ignored by the receiver.
pub(super) fn spawn_fetch(http: Client, src: String, generation: Generation, done: Sender<Fetched>) {
    thread::spawn(move || {
        let result = fetch(&http, &src);
        // The audio thread may already be gone.
        let _ = done.send((generation, result));
    });
}

/// Read the whole media file into memory.
pub(super) fn fetch(http: &Client, src: &str) -> Result<Vec<u8>, MediaError> {
    match locate(src) {
        MediaLocation::Remote(url) => {
            let resp = http.get(&url).send()?;
            let status = resp.status();
            if !status.is_success() {
                return Err(MediaError::Status(status.as_u16()));
            }
            Ok(resp.bytes()?.to_vec())
        }
        MediaLocation::Local(path) => {
            fs::read(&path).map_err(|source| MediaError::File { path, source })
        }
    }
}

fn decode(bytes: Vec<u8>) -> Result<Decoder<Cursor<Vec<u8>>>, MediaError> {
    let len = bytes.len() as u64;
    Ok(Decoder::builder()
        .with_data(Cursor::new(bytes))
        .with_byte_len(len)
        .with_seekable(true)
        .build()?)
}

/// Create a paused `Sink` for `bytes` that starts playback at `start_at`.
///
/// Also returns the decoded length when the container reports one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    bytes: &[u8],
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), MediaError> {
    let decoder = decode(bytes.to_vec())?;
    let total = decoder.total_duration();
    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
