use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use std::collections::BTreeMap;
use std::io::{self, Stdout, Write};

use crate::menu::{Menu, MenuItem, Selection, StatusDisplay, StatusRow};

const MENU_COLUMN: u16 = 2;
const MENU_TOP: u16 = 1;
const STATUS_COLUMN: u16 = 34;
const STATUS_WIDTH: usize = 28;

/// Raw mode and alternate screen for the lifetime of the value
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn start() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), Show, LeaveAlternateScreen) {
            warn!("Failed to restore terminal screen: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
    }
}

/// Keyboard driven menu and status panel drawn with crossterm
pub struct TerminalMenu<W: Write> {
    out: W,
    title: String,
    items: Vec<MenuItem>,
    cursor: usize,
    status: BTreeMap<StatusRow, String>,
    show_status: bool,
}

impl TerminalMenu<Stdout> {
    /// Menu with a filter status panel beside it
    pub fn with_status(title: &str) -> Self {
        Self::new(io::stdout(), title, true)
    }

    /// Plain pick list
    pub fn plain(title: &str) -> Self {
        Self::new(io::stdout(), title, false)
    }
}

impl<W: Write> TerminalMenu<W> {
    pub fn new(out: W, title: &str, show_status: bool) -> Self {
        Self {
            out,
            title: title.to_string(),
            items: Vec::new(),
            cursor: 0,
            status: BTreeMap::new(),
            show_status,
        }
    }

    fn first_selectable(&self) -> usize {
        self.items
            .iter()
            .position(MenuItem::is_selectable)
            .unwrap_or(0)
    }

    fn move_cursor(&mut self, forward: bool) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let mut next = self.cursor;
        for _ in 0..len {
            next = if forward { (next + 1) % len } else { (next + len - 1) % len };
            if self.items[next].is_selectable() {
                self.cursor = next;
                return;
            }
        }
    }

    fn hotkey_row(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        self.items.iter().position(|item| match item {
            MenuItem::Entry { hotkey: Some(h), .. } => h.to_ascii_lowercase() == key,
            _ => false,
        })
    }

    fn draw(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(MENU_COLUMN, MENU_TOP),
            SetAttribute(Attribute::Bold),
            Print(&self.title),
            SetAttribute(Attribute::Reset)
        )?;

        for (i, item) in self.items.iter().enumerate() {
            let y = MENU_TOP + 2 + i as u16;
            queue!(self.out, MoveTo(MENU_COLUMN, y))?;
            match item {
                MenuItem::Entry { label, .. } if i == self.cursor => queue!(
                    self.out,
                    SetAttribute(Attribute::Reverse),
                    Print(format!(" {:<24}", label)),
                    SetAttribute(Attribute::Reset)
                )?,
                MenuItem::Entry { label, .. } => queue!(self.out, Print(format!(" {:<24}", label)))?,
                MenuItem::Separator => queue!(self.out, Print("-".repeat(25)))?,
            }
        }

        if let Some(MenuItem::Entry { description, .. }) = self.items.get(self.cursor) {
            let y = MENU_TOP + 3 + self.items.len() as u16;
            queue!(self.out, MoveTo(MENU_COLUMN, y), Print(description))?;
        }

        if self.show_status {
            self.draw_status()?;
        }
        self.out.flush()
    }

    fn draw_status(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(STATUS_COLUMN, MENU_TOP),
            SetAttribute(Attribute::Bold),
            Print(" Filter Status "),
            SetAttribute(Attribute::Reset)
        )?;
        for (row, text) in &self.status {
            queue!(
                self.out,
                MoveTo(STATUS_COLUMN + 2, MENU_TOP + 1 + row.line()),
                Print(format!("{:<width$}", text, width = STATUS_WIDTH))
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Menu for TerminalMenu<W> {
    fn show(&mut self, items: &[MenuItem]) -> io::Result<()> {
        if self.items != items {
            self.items = items.to_vec();
            self.cursor = self.first_selectable();
        }
        self.draw()
    }

    fn selection(&mut self) -> io::Result<Selection> {
        loop {
            let code = match event::read()? {
                Event::Key(KeyEvent {
                    code,
                    kind: KeyEventKind::Press,
                    ..
                }) => code,
                _ => continue,
            };

            match code {
                KeyCode::Up => self.move_cursor(false),
                KeyCode::Down | KeyCode::Tab => self.move_cursor(true),
                KeyCode::Enter => return Ok(Selection::Row(self.cursor + 1)),
                KeyCode::Esc => return Ok(Selection::Aborted),
                KeyCode::Char(c) => {
                    if let Some(row) = self.hotkey_row(c) {
                        self.cursor = row;
                        self.draw()?;
                        return Ok(Selection::Row(row + 1));
                    }
                }
                _ => {}
            }
            self.draw()?;
        }
    }
}

impl<W: Write> StatusDisplay for TerminalMenu<W> {
    fn render_status(&mut self, row: StatusRow, text: &str) -> io::Result<()> {
        self.status.insert(row, text.to_string());
        queue!(
            self.out,
            MoveTo(STATUS_COLUMN + 2, MENU_TOP + 1 + row.line()),
            Print(format!("{:<width$}", text, width = STATUS_WIDTH))
        )?;
        self.out.flush()
    }

    fn notify(&mut self, message: &str) -> io::Result<()> {
        let (_, rows) = terminal::size()?;
        let y = rows.saturating_sub(1);
        queue!(
            self.out,
            MoveTo(0, y),
            Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Reverse),
            Print(format!(" {} - press any key ", message)),
            SetAttribute(Attribute::Reset)
        )?;
        self.out.flush()?;

        loop {
            if let Event::Key(KeyEvent {
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            {
                break;
            }
        }

        queue!(self.out, MoveTo(0, y), Clear(ClearType::CurrentLine))?;
        self.out.flush()
    }
}
