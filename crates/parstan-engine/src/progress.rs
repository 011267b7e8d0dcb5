use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PROGRESS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap());

/// Extract the completed count from a worker's stderr text.
///
/// Workers print `<completed>/<total>` tokens where the total is chunk-local and only the
/// completed count matters. A single read may carry several tokens (or a rendered bar such as
/// ` 3/10 [▓▓░░]  30%`), so the last token wins. Text without a usable token returns `prior`.
pub fn parse_progress(text: &str, prior: usize) -> usize {
    PROGRESS_TOKEN
        .captures_iter(text.trim())
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .last()
        .unwrap_or(prior)
}

/// Longest unterminated tail kept between reads; a progress token is far shorter.
const MAX_PARTIAL_LINE: usize = 64;

#[derive(Debug, Clone)]
struct WorkerProgress {
    last_known: usize,
    expected: usize,
    // Unterminated text from earlier reads that did not hold a whole token yet, so a token
    // split across two reads is parsed whole.
    partial: String,
}

/// Combines per-worker progress into one monotonic counter.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    advanced: usize,
    workers: HashMap<usize, WorkerProgress>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            advanced: 0,
            workers: HashMap::new(),
        }
    }

    /// Start tracking a worker that will report at most `expected` completed files.
    pub fn register(&mut self, worker: usize, expected: usize) {
        self.workers.insert(
            worker,
            WorkerProgress {
                last_known: 0,
                expected,
                partial: String::new(),
            },
        );
    }

    /// Feed new stderr text from `worker` and return how far the combined counter moved.
    pub fn observe(&mut self, worker: usize, text: &str) -> usize {
        let Some(state) = self.workers.get_mut(&worker) else {
            return 0;
        };

        let mut buffered = std::mem::take(&mut state.partial);
        buffered.push_str(text);
        let completed = parse_progress(&buffered, state.last_known).min(state.expected);
        state.partial = carry_over(buffered);

        if completed <= state.last_known {
            return 0;
        }

        let step = (completed - state.last_known).min(self.total - self.advanced);
        state.last_known = completed;
        self.advanced += step;
        step
    }

    /// Stop tracking a terminated worker. Later observations for it are ignored.
    pub fn retire(&mut self, worker: usize) {
        self.workers.remove(&worker);
    }

    pub fn last_known(&self, worker: usize) -> Option<usize> {
        self.workers.get(&worker).map(|w| w.last_known)
    }

    pub fn advanced(&self) -> usize {
        self.advanced
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// The part of `text` a following read may still complete: the unterminated last line, unless
/// it already holds a token (that one has been counted).
fn carry_over(mut text: String) -> String {
    if let Some(end) = text.rfind(['\n', '\r']) {
        text.drain(..=end);
    }
    if PROGRESS_TOKEN.is_match(&text) {
        return String::new();
    }
    if text.len() > MAX_PARTIAL_LINE {
        let mut cut = text.len() - MAX_PARTIAL_LINE;
        while !text.is_char_boundary(cut) {
            cut += 1;
        }
        text.drain(..cut);
    }
    text
}
