//! Interactive menu loop.
//!
//! # Responsibility
//! - Read menu choices and field input as text lines.
//! - Turn text into catalog calls and print results or error messages.
//!
//! # Invariants
//! - Every catalog rule is enforced by `shelf_core`; this layer only parses.
//! - A failed action prints a message and returns to the menu.
//! - End of input leaves the loop without committing.

use crate::render;
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use shelf_core::{
    CatalogError, CatalogResult, CatalogService, FieldKind, Fields, RecordId, TableKind,
    FIELD_NAME,
};
use std::io::{self, BufRead, Write};

const MENU: &str = "\
1. Add record
2. View records
3. Update record field
4. Delete record
5. Inner join Book & Author
6. Left join Book & Genre
0. Commit & exit";

const TABLE_PROMPT: &str = "Table (7=Book, 8=Author, 9=Genre)";

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Committed,
    EndOfInput,
}

/// Source of console input lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line; `None` at end of input.
    fn read_line<W: Write>(
        &mut self,
        prompt: &str,
        output: &mut W,
    ) -> io::Result<Option<String>>;
}

/// Interactive terminal input with line editing.
impl LineSource for DefaultEditor {
    fn read_line<W: Write>(
        &mut self,
        prompt: &str,
        _output: &mut W,
    ) -> io::Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C leaves like Ctrl-D: without committing.
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::new(io::ErrorKind::Other, err)),
        }
    }
}

/// Plain line input from a pipe, file or test buffer.
pub struct Piped<R>(pub R);

impl<R: BufRead> LineSource for Piped<R> {
    fn read_line<W: Write>(
        &mut self,
        prompt: &str,
        output: &mut W,
    ) -> io::Result<Option<String>> {
        write!(output, "{prompt}")?;
        output.flush()?;

        let mut line = String::new();
        if self.0.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

pub struct Console<'a, I, W> {
    service: &'a mut CatalogService,
    input: I,
    output: W,
}

impl<'a, I: LineSource, W: Write> Console<'a, I, W> {
    pub fn new(service: &'a mut CatalogService, input: I, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<Exit> {
        loop {
            writeln!(self.output, "\n{MENU}")?;
            let Some(choice) = self.prompt("Choose an option")? else {
                warn!("event=console_exit module=cli status=eof");
                writeln!(self.output, "Input closed; uncommitted changes discarded.")?;
                return Ok(Exit::EndOfInput);
            };

            match choice.as_str() {
                "1" => self.add()?,
                "2" => self.view()?,
                "3" => self.update()?,
                "4" => self.delete()?,
                "5" => self.inner_join()?,
                "6" => self.left_join()?,
                "0" => {
                    if self.commit()? {
                        return Ok(Exit::Committed);
                    }
                }
                other => writeln!(self.output, "Invalid option `{other}`.")?,
            }
        }
    }

    fn add(&mut self) -> io::Result<()> {
        let Some(table) = self.read_table(None)? else {
            return Ok(());
        };

        let mut fields = Fields::new();
        for def in self.service.schema().fields(table) {
            let label = match def.kind {
                FieldKind::Text => def.name.to_string(),
                FieldKind::ForeignKey(parent) => {
                    format!("{} ({parent} id, blank for none)", def.name)
                }
            };
            let Some(raw) = self.prompt(&label)? else {
                return Ok(());
            };
            match self.service.schema().parse_input(table, def.name, &raw) {
                Ok(value) => fields.insert(def.name, value),
                Err(violation) => return self.report(&violation.into()),
            }
        }

        match self.service.create(table, &fields) {
            Ok(id) => writeln!(self.output, "Created {table} row {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn view(&mut self) -> io::Result<()> {
        let Some(table) = self.read_table(None)? else {
            return Ok(());
        };

        let mut rows = 0usize;
        for record in self.service.read(table) {
            writeln!(self.output, "{}", render::record(&record))?;
            rows += 1;
        }
        if rows == 0 {
            writeln!(self.output, "No {table} rows.")?;
        }
        Ok(())
    }

    /// Blank table input selects authors and blank field input selects the
    /// table's first field, so the common rename is two ids and a value.
    fn update(&mut self) -> io::Result<()> {
        let Some(table) = self.read_table(Some(TableKind::Author))? else {
            return Ok(());
        };
        let Some(id) = self.read_id()? else {
            return Ok(());
        };

        let default_field = self
            .service
            .schema()
            .fields(table)
            .first()
            .map_or(FIELD_NAME, |def| def.name);
        let Some(field) = self.prompt(&format!("Field [{default_field}]"))? else {
            return Ok(());
        };
        let field = if field.is_empty() {
            default_field.to_string()
        } else {
            field
        };
        let Some(raw) = self.prompt("New value")? else {
            return Ok(());
        };

        let result = self
            .service
            .schema()
            .parse_input(table, &field, &raw)
            .map_err(CatalogError::from)
            .and_then(|value| self.service.update_field(table, id, &field, value));
        match result {
            Ok(()) => writeln!(self.output, "Updated {table} row {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn delete(&mut self) -> io::Result<()> {
        let Some(table) = self.read_table(None)? else {
            return Ok(());
        };
        let Some(id) = self.read_id()? else {
            return Ok(());
        };

        match self.service.delete(table, id) {
            Ok(report) => writeln!(self.output, "{}", render::delete_report(&report)),
            Err(err) => self.report(&err),
        }
    }

    fn inner_join(&mut self) -> io::Result<()> {
        for (book, author) in self.service.inner_join_books_authors() {
            writeln!(self.output, "{}", render::book_author(book, author))?;
        }
        Ok(())
    }

    fn left_join(&mut self) -> io::Result<()> {
        for (book, genre) in self.service.left_join_books_genres() {
            writeln!(self.output, "{}", render::book_genre(book, genre))?;
        }
        Ok(())
    }

    /// Returns whether the loop may exit.
    fn commit(&mut self) -> io::Result<bool> {
        match self.service.commit() {
            Ok(()) => {
                info!("event=console_exit module=cli status=ok");
                writeln!(self.output, "Changes committed. Goodbye.")?;
                Ok(true)
            }
            Err(err) => {
                self.report(&err)?;
                Ok(false)
            }
        }
    }

    /// `None` when input ended or the selector was rejected.
    fn read_table(&mut self, default: Option<TableKind>) -> io::Result<Option<TableKind>> {
        let label = match default {
            Some(table) => format!("{TABLE_PROMPT} [{table}]"),
            None => TABLE_PROMPT.to_string(),
        };
        let Some(raw) = self.prompt(&label)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            if let Some(table) = default {
                return Ok(Some(table));
            }
        }

        match parse_table(&raw) {
            Ok(table) => Ok(Some(table)),
            Err(err) => {
                self.report(&err)?;
                Ok(None)
            }
        }
    }

    fn read_id(&mut self) -> io::Result<Option<RecordId>> {
        let Some(raw) = self.prompt("Id")? else {
            return Ok(None);
        };
        match raw.parse::<RecordId>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.output, "Invalid id `{raw}`: expected a positive number.")?;
                Ok(None)
            }
        }
    }

    /// Shows `label: ` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.output.flush()?;
        let line = self.input.read_line(&format!("{label}: "), &mut self.output)?;
        Ok(line.map(|line| line.trim().to_string()))
    }

    fn report(&mut self, err: &CatalogError) -> io::Result<()> {
        writeln!(self.output, "{}", render::error(err))
    }
}

fn parse_table(raw: &str) -> CatalogResult<TableKind> {
    Ok(raw.parse::<TableKind>()?)
}
