use is_terminal::IsTerminal;
use parstan_runtime::ProgressSink;
use std::io::{self, Write};
use terminal_size::{Width, terminal_size};

const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Single-line progress bar redrawn in place with `\r`.
pub struct ConsoleProgress<W: Write> {
    out: W,
    enabled: bool,
    bar_width: usize,
    total: usize,
    done: usize,
}

impl ConsoleProgress<io::Stderr> {
    /// Bar on stderr, drawn only when stderr is a terminal.
    pub fn stderr() -> Self {
        let bar_width = terminal_size()
            .map(|(Width(columns), _)| usize::from(columns).saturating_sub(24))
            .unwrap_or(MAX_BAR_WIDTH)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        let enabled = io::stderr().is_terminal();
        Self::new(io::stderr(), enabled, bar_width)
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W, enabled: bool, bar_width: usize) -> Self {
        Self {
            out,
            enabled,
            bar_width,
            total: 0,
            done: 0,
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self) {
        if !self.enabled {
            return;
        }
        let line = render_line(self.done, self.total, self.bar_width);
        let _ = write!(self.out, "\r{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.draw();
    }

    fn advance(&mut self, step: usize) {
        self.done = (self.done + step).min(self.total);
        self.draw();
    }

    fn finish(&mut self) {
        if self.enabled {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out);
        }
    }
}

/// ` 3/10 [▓▓▓░░░░░░░]  30%`
pub fn render_line(done: usize, total: usize, bar_width: usize) -> String {
    let (filled, percent) = if total == 0 {
        (bar_width, 100)
    } else {
        (bar_width * done / total, done * 100 / total)
    };

    format!(
        " {:>width$}/{} [{}{}] {:>3}%",
        done,
        total,
        "▓".repeat(filled),
        "░".repeat(bar_width - filled),
        percent,
        width = total.to_string().len()
    )
}
