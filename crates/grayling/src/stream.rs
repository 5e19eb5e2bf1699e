//! Lazy graph input stream.
//!
//! Drains the resolved input sources strictly in order: one source is fully
//! exhausted before the next is opened. A source that cannot be opened is
//! reported, counted and skipped; the run continues with the remaining
//! sources. The stream is finite and not restartable.

use crate::diag::Diagnostics;
use crate::graph::{DocScanner, GraphDoc};
use crate::plugin::INTERNAL_SOURCE;
use std::io::Read;

/// Provenance name used for graphs read from standard input.
pub const STDIN_SOURCE: &str = "<stdin>";

/// A parsed graph document plus its provenance: the source it came from and
/// its zero-based index among the graphs parsed from that same source.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphHandle {
    pub doc: GraphDoc,
    pub source: String,
    pub index: usize,
}

struct OpenSource {
    name: String,
    scanner: DocScanner,
    next_index: usize,
}

pub struct InputGraphStream {
    cmd_name: String,
    files: Vec<String>,
    file_cursor: usize,
    stdin_done: bool,
    inventory: Option<GraphDoc>,
    current: Option<OpenSource>,
}

impl InputGraphStream {
    /// `files` empty means standard input, consumed exactly once. When an
    /// inventory pseudo-graph is supplied it is yielded first, exactly once;
    /// with no real sources it also replaces the implicit stdin source.
    pub fn new(cmd_name: impl Into<String>, files: Vec<String>, inventory: Option<GraphDoc>) -> Self {
        Self {
            cmd_name: cmd_name.into(),
            stdin_done: inventory.is_some() && files.is_empty(),
            files,
            file_cursor: 0,
            inventory,
            current: None,
        }
    }

    /// The next graph document, or `None` when every source is exhausted.
    ///
    /// Open failures are recorded on `diag` (which owns the cumulative error
    /// counter) and do not stop iteration.
    pub fn next_graph(&mut self, diag: &mut Diagnostics) -> Option<GraphHandle> {
        if let Some(doc) = self.inventory.take() {
            return Some(GraphHandle {
                doc,
                source: INTERNAL_SOURCE.to_string(),
                index: 0,
            });
        }

        loop {
            if self.current.is_none() {
                self.current = Some(self.open_next_source(diag)?);
            }
            if let Some(source) = self.current.as_mut() {
                if let Some(doc) = source.scanner.next_doc() {
                    let handle = GraphHandle {
                        doc,
                        source: source.name.clone(),
                        index: source.next_index,
                    };
                    source.next_index += 1;
                    return Some(handle);
                }
            }
            // exhausted; the file handle was already consumed on open
            self.current = None;
        }
    }

    /// Opens the next readable source; `None` means the stream is finished.
    fn open_next_source(&mut self, diag: &mut Diagnostics) -> Option<OpenSource> {
        if self.files.is_empty() {
            if self.stdin_done {
                return None;
            }
            self.stdin_done = true;
            let mut text = String::new();
            if let Err(err) = std::io::stdin().lock().read_to_string(&mut text) {
                diag.error(format_args!(
                    "{}: can't read {STDIN_SOURCE}: {err}",
                    self.cmd_name
                ));
                return None;
            }
            tracing::debug!(source = STDIN_SOURCE, "reading input source");
            return Some(OpenSource {
                name: STDIN_SOURCE.to_string(),
                scanner: DocScanner::new(text),
                next_index: 0,
            });
        }

        while self.file_cursor < self.files.len() {
            let name = self.files[self.file_cursor].clone();
            self.file_cursor += 1;
            match std::fs::read_to_string(&name) {
                Ok(text) => {
                    tracing::debug!(source = %name, "reading input source");
                    return Some(OpenSource {
                        name,
                        scanner: DocScanner::new(text),
                        next_index: 0,
                    });
                }
                Err(err) => {
                    diag.error(format_args!(
                        "{}: can't open {name}: {err}",
                        self.cmd_name
                    ));
                }
            }
        }
        None
    }
}
