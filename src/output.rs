use std::path::PathBuf;

use csv_core::WriteResult;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Format {
    Table,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    /// Write the output to a file instead of the terminal.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short='f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the specified output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize a record to JSON")]
    SerializeJson(#[source] serde_json::Error),
}

impl Args {
    pub fn into_sink(self) -> Result<Sink, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        let formatter = match &self.format {
            Format::Table => {
                let mut table = comfy_table::Table::new();
                table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Formatter::Table { table }
            }
            Format::Jsonl => Formatter::Jsonl,
            Format::Csv => Formatter::Csv { writer: csv_core::Writer::new(), wrote_rows: false },
        };
        Ok(Sink { args: self, io, formatter })
    }
}

/// Destination for command results in one of the supported formats.
///
/// Tables buffer up and render on [`Sink::finish`]; the other formats stream
/// row by row.
pub struct Sink {
    args: Args,
    io: Box<dyn std::io::Write>,
    formatter: Formatter,
}

enum Formatter {
    Table { table: comfy_table::Table },
    Jsonl,
    Csv { writer: csv_core::Writer, wrote_rows: bool },
}

impl Sink {
    pub fn headers(&mut self, names: Vec<&'static str>) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Table { table } => {
                table.set_header(names);
            }
            Formatter::Jsonl => {}
            Formatter::Csv { wrote_rows, .. } => {
                assert!(!*wrote_rows, "csv headers must come before any row");
                self.encode_csv_row(&names)?;
            }
        }
        Ok(())
    }

    /// Emit one result row. `cells` feeds the table and CSV formats, while
    /// `record` provides the structure serialized for JSON lines; only the
    /// representation the sink was opened with is evaluated.
    pub fn row<R: serde::Serialize>(
        &mut self,
        cells: impl FnOnce() -> Vec<String>,
        record: impl FnOnce() -> R,
    ) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Table { table } => {
                table.add_row(cells());
            }
            Formatter::Jsonl => {
                serde_json::to_writer(&mut self.io, &record()).map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?;
            }
            Formatter::Csv { wrote_rows, .. } => {
                *wrote_rows = true;
                let cells = cells();
                self.encode_csv_row(&cells)?;
            }
        }
        Ok(())
    }

    fn encode_csv_row<V: AsRef<str>>(&mut self, cells: &[V]) -> Result<(), Error> {
        let Formatter::Csv { writer, .. } = &mut self.formatter else {
            unreachable!("only the csv formatter encodes csv rows");
        };
        // Worst case every byte gets escaped into two, plus the quotes.
        let longest = cells.iter().map(|v| v.as_ref().len()).max().unwrap_or(0);
        let mut buffer = vec![0; 2 + 2 * longest];
        let mut first = true;
        for cell in cells {
            if !std::mem::take(&mut first) {
                let (result, written) = writer.delimiter(&mut buffer);
                assert_eq!(result, WriteResult::InputEmpty);
                Self::forward(&mut self.io, &self.args, &buffer[..written])?;
            }
            let mut rest = cell.as_ref().as_bytes();
            while !rest.is_empty() {
                let (result, consumed, written) = writer.field(rest, &mut buffer);
                assert_eq!(result, WriteResult::InputEmpty);
                rest = &rest[consumed..];
                Self::forward(&mut self.io, &self.args, &buffer[..written])?;
            }
        }
        let (result, written) = writer.terminator(&mut buffer);
        assert_eq!(result, WriteResult::InputEmpty);
        Self::forward(&mut self.io, &self.args, &buffer[..written])
    }

    fn forward(
        io: &mut Box<dyn std::io::Write>,
        args: &Args,
        bytes: &[u8],
    ) -> Result<(), Error> {
        io.write_all(bytes).map_err(|e| match &args.output {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.clone()),
        })
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.args.output {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.clone()),
        }
    }

    pub fn finish(mut self) -> Result<(), Error> {
        if let Formatter::Table { table } = &self.formatter {
            writeln!(self.io, "{table}").map_err(|e| self.write_error(e))?;
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}
