//! Raw-mode line input for the interactive shell.

use std::io::{self, stdin, stdout, Write};

use termion::clear;
use termion::cursor;
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;
use unicode_segmentation::UnicodeSegmentation;

use super::history::{History, HistoryCursor};

pub mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadlineEvent {
    Continue,
    Done,
    Eof,
    ClearScreen,
}

/// Edit state for a single line. Only appending at the end is supported.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
    cursor: HistoryCursor,
}

impl LineEditor {
    pub fn new() -> LineEditor {
        LineEditor {
            buffer: String::new(),
            cursor: HistoryCursor::new(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn take_buffer(&mut self) -> String {
        self.cursor.reset();
        std::mem::take(&mut self.buffer)
    }

    pub fn handle_key(&mut self, key: Key, history: &History) -> ReadlineEvent {
        match key {
            Key::Char('\n') => ReadlineEvent::Done,
            Key::Char(c) if c.is_control() => ReadlineEvent::Continue,
            Key::Char(c) => {
                self.cursor.reset();
                self.buffer.push(c);
                ReadlineEvent::Continue
            }
            Key::Backspace => {
                self.cursor.reset();
                if let Some((index, _)) = self.buffer.grapheme_indices(true).next_back() {
                    self.buffer.truncate(index);
                }
                ReadlineEvent::Continue
            }
            Key::Up | Key::Ctrl('k') | Key::Ctrl('p') => {
                if let Some(line) = self.cursor.older(history) {
                    self.buffer = line.to_owned();
                }
                ReadlineEvent::Continue
            }
            Key::Down | Key::Ctrl('n') => {
                if let Some(line) = self.cursor.newer(history) {
                    self.buffer = line.to_owned();
                }
                ReadlineEvent::Continue
            }
            Key::Ctrl('c') => {
                self.cursor.reset();
                self.buffer.clear();
                ReadlineEvent::Continue
            }
            Key::Ctrl('d') if self.buffer.is_empty() => ReadlineEvent::Eof,
            Key::Ctrl('q') => ReadlineEvent::Eof,
            Key::Ctrl('l') => ReadlineEvent::ClearScreen,
            // Arrow keys, escape sequences and the rest are swallowed.
            _ => ReadlineEvent::Continue,
        }
    }
}

pub struct Readline {
    color: bool,
}

impl Readline {
    pub fn new(color: bool) -> Readline {
        Readline { color }
    }

    /// Read one line with the terminal in raw mode. Raw mode is left again
    /// before returning, so commands run with the terminal as they found it.
    /// `None` means the user ended the session.
    pub fn read(&mut self, history: &History) -> io::Result<Option<String>> {
        let prompt = prompt::render(self.color);
        let mut editor = LineEditor::new();
        let mut stdout = stdout().into_raw_mode()?;
        redraw(&mut stdout, &prompt, editor.buffer())?;
        for key in stdin().keys() {
            match editor.handle_key(key?, history) {
                ReadlineEvent::Continue => redraw(&mut stdout, &prompt, editor.buffer())?,
                ReadlineEvent::ClearScreen => {
                    write!(stdout, "{}{}", clear::All, cursor::Goto(1, 1))?;
                    redraw(&mut stdout, &prompt, editor.buffer())?;
                }
                ReadlineEvent::Done => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(Some(editor.take_buffer()));
                }
                ReadlineEvent::Eof => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }
}

fn redraw<W: Write>(out: &mut W, prompt: &str, buffer: &str) -> io::Result<()> {
    write!(out, "\r{}{}{}", clear::CurrentLine, prompt, buffer)?;
    out.flush()
}
