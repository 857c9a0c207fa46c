use std::fmt::{Display, Write as _};
use std::io::{self, Write};

use chrono::Local;

use crate::factory::{self, Factory};
use crate::layout::{Error, Layout};
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};
use crate::thread;

mod grammar;

pub use self::grammar::ParseError;

// format_string := <text> [ format <text> ] *
// format := '{' argument [ ':' format_spec ] '}'
// format_spec := [[fill]align][width]['.' precision][type]

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SeverityType {
    Num,
    String,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Timezone {
    Utc,
    Local,
}

/// Enum of alignments which are supported.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Alignment {
    /// The value will be aligned to the left.
    Left,
    /// The value will be aligned to the right.
    Right,
    /// The value will be aligned in the center.
    Center,
}

/// Specification for the formatting of an argument in the format string.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FormatSpec {
    /// Character to fill alignment with.
    pub fill: char,
    pub align: Alignment,
    /// The string width requested for the resulting format.
    pub width: usize,
    /// Maximum width. Longer values are truncated down to this many characters.
    pub precision: Option<usize>,
}

impl Default for FormatSpec {
    fn default() -> FormatSpec {
        FormatSpec {
            fill: ' ',
            align: Alignment::Left,
            width: 0,
            precision: None,
        }
    }
}

impl FormatSpec {
    fn write(&self, wr: &mut dyn Write, data: &str) -> Result<(), io::Error> {
        let data = match self.precision {
            Some(precision) => {
                match data.char_indices().nth(precision) {
                    Some((idx, _)) => &data[..idx],
                    None => data,
                }
            }
            None => data,
        };

        let len = data.chars().count();
        if len >= self.width {
            return wr.write_all(data.as_bytes());
        }

        let pad = self.width - len;
        let (lpad, rpad) = match self.align {
            Alignment::Left => (0, pad),
            Alignment::Right => (pad, 0),
            Alignment::Center => (pad / 2, (pad + 1) / 2),
        };

        let mut buf = [0; 4];
        let fill = self.fill.encode_utf8(&mut buf).as_bytes();

        for _ in 0..lpad {
            wr.write_all(fill)?;
        }
        wr.write_all(data.as_bytes())?;
        for _ in 0..rpad {
            wr.write_all(fill)?;
        }

        Ok(())
    }
}

/// Renders a timestamp through an intermediate buffer, because invalid strftime patterns are only
/// detected while formatting.
fn write_timestamp<T: Display>(wr: &mut dyn Write, spec: &FormatSpec, datetime: T) ->
    Result<(), io::Error>
{
    let mut buf = String::with_capacity(32);
    write!(buf, "{}", datetime)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid strftime pattern"))?;

    spec.write(wr, &buf)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Portion of the format string which represents the next part to emit.
    Piece(String),
    Message(FormatSpec),
    Severity(FormatSpec, SeverityType),
    /// Timestamp formatted using strftime pattern.
    Timestamp(FormatSpec, String, Timezone),
    /// Timestamp in microseconds since epoch.
    TimestampNum,
    Line,
    Module(FormatSpec),
    Thread,
    Process,
    /// Named attribute.
    Meta(String, FormatSpec),
    /// All attributes in `name: value` form, separated by comma.
    MetaList,
}

/// Layout driven by a pattern like `{timestamp} {severity:<5} [{thread}] {module}: {message}`.
pub struct PatternLayout {
    tokens: Vec<Token>,
}

impl PatternLayout {
    pub fn new(pattern: &str) -> Result<PatternLayout, ParseError> {
        let layout = PatternLayout {
            tokens: grammar::parse(pattern)?,
        };

        Ok(layout)
    }
}

impl Layout for PatternLayout {
    fn format(&self, rec: &Record, wr: &mut dyn Write) -> Result<(), Error> {
        for token in &self.tokens {
            match *token {
                Token::Piece(ref piece) => {
                    wr.write_all(piece.as_bytes())?
                }
                Token::Message(ref spec) => {
                    spec.write(wr, rec.message())?
                }
                Token::Severity(ref spec, SeverityType::Num) => {
                    spec.write(wr, &rec.severity().as_i32().to_string())?
                }
                Token::Severity(ref spec, SeverityType::String) => {
                    spec.write(wr, rec.severity().name())?
                }
                Token::Timestamp(ref spec, ref pattern, Timezone::Utc) => {
                    write_timestamp(wr, spec, rec.datetime().format(pattern))?
                }
                Token::Timestamp(ref spec, ref pattern, Timezone::Local) => {
                    let datetime = rec.datetime().with_timezone(&Local);
                    write_timestamp(wr, spec, datetime.format(pattern))?
                }
                Token::TimestampNum => {
                    write!(wr, "{}", rec.datetime().timestamp_micros())?
                }
                Token::Line => {
                    write!(wr, "{}", rec.line())?
                }
                Token::Module(ref spec) => {
                    spec.write(wr, rec.module())?
                }
                Token::Thread => {
                    write!(wr, "{:#x}", rec.thread())?
                }
                Token::Process => {
                    write!(wr, "{}", thread::pid())?
                }
                Token::Meta(ref name, ref spec) => {
                    let meta = rec.find(name)
                        .ok_or_else(|| Error::MetaNotFound(name.clone()))?;

                    spec.write(wr, &meta.value.to_string())?
                }
                Token::MetaList => {
                    let mut iter = rec.iter();
                    if let Some(meta) = iter.next() {
                        write!(wr, "{}: {}", meta.name, meta.value)?;
                    }

                    for meta in iter {
                        write!(wr, ", {}: {}", meta.name, meta.value)?;
                    }
                }
            }
        }

        Ok(())
    }
}

pub struct PatternLayoutFactory;

impl Factory for PatternLayoutFactory {
    type Item = dyn Layout;

    fn ty() -> &'static str {
        "pattern"
    }

    fn from(&self, cfg: &Config, _registry: &Registry) -> Result<Box<dyn Layout>, ConfigError> {
        let pattern = factory::string(cfg, "pattern")?;

        Ok(Box::new(PatternLayout::new(pattern)?))
    }
}

#[cfg(test)]
mod tests {
    use std::str::from_utf8;

    use chrono::{TimeZone, Utc};

    use crate::{Meta, Record, Severity};
    use crate::layout::{Error, Layout};
    use super::PatternLayout;

    fn format(pattern: &str, rec: &Record) -> String {
        let layout = PatternLayout::new(pattern).unwrap();

        let mut buf = Vec::new();
        layout.format(rec, &mut buf).unwrap();

        from_utf8(&buf[..]).unwrap().to_owned()
    }

    #[test]
    fn piece_with_braces() {
        assert_eq!("hello { world }", format("hello {{ world }}", &record!(Severity::Info)));
    }

    #[test]
    fn message() {
        let rec = record!(Severity::Info, "value");

        assert_eq!("message: value", format("message: {message}", &rec));
        assert_eq!("[value     ]", format("[{message:<10}]", &rec));
        assert_eq!("[value.....]", format("[{message:.<10}]", &rec));
        assert_eq!("[value]", format("[{message:<0}]", &rec));
        assert_eq!("[     value]", format("[{message:>10}]", &rec));
    }

    #[test]
    fn message_with_spec_full() {
        assert_eq!("/1005/", format("{message:/^6.4}", &record!(Severity::Info, "100500")));
    }

    #[test]
    fn severity() {
        let rec = record!(Severity::Warn);

        assert_eq!("WARN", format("{severity}", &rec));
        assert_eq!("3", format("{severity:d}", &rec));
        assert_eq!("[W]", format("[{severity:.1}]", &rec));
        assert_eq!("[WARN  ]", format("[{severity:<6s}]", &rec));
    }

    #[test]
    fn timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2016, 4, 1, 12, 30, 15).unwrap();
        let rec = Record::with_timestamp(Severity::Info, timestamp, "", "", 0, &[]);

        assert_eq!("2016-04-01 12:30:15", format("{timestamp:{%Y-%m-%d %H:%M:%S}s}", &rec));
        assert_eq!("1459513815000000", format("{timestamp:d}", &rec));
    }

    #[test]
    fn invalid_strftime_is_an_error() {
        let layout = PatternLayout::new("{timestamp:{%Q}s}").unwrap();

        let mut buf = Vec::new();
        assert!(layout.format(&record!(Severity::Info), &mut buf).is_err());
    }

    #[test]
    fn call_site() {
        let rec = Record::new(Severity::Info, "", "app::io", 42, &[]);

        assert_eq!("app::io:42", format("{module}:{line}", &rec));
    }

    #[test]
    fn meta() {
        let meta = [Meta::new("path", "/home"), Meta::new("code", 404)];
        let rec = Record::new(Severity::Info, "", "", 0, &meta);

        assert_eq!("path=/home", format("path={path}", &rec));
        assert_eq!("path: /home, code: 404", format("{...}", &rec));
        assert_eq!("", format("{...}", &record!(Severity::Info)));
    }

    #[test]
    fn meta_not_found() {
        let layout = PatternLayout::new("{path}").unwrap();

        let mut buf = Vec::new();
        match layout.format(&record!(Severity::Info), &mut buf) {
            Err(Error::MetaNotFound(name)) => assert_eq!("path", name),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
