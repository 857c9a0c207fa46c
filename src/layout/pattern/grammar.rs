use peg::error;
use peg::str::LineCol;

use super::{Alignment, FormatSpec, SeverityType, Timezone, Token};

pub type ParseError = error::ParseError<LineCol>;

peg::parser! {
    grammar pattern() for str {
        pub rule expression() -> Vec<Token>
            = (format() / text())*

        rule text() -> Token
            = "{{" { Token::Piece("{".into()) }
            / "}}" { Token::Piece("}".into()) }
            / piece:$((!['{' | '}'] [_])+) { Token::Piece(piece.into()) }

        rule format() -> Token
            = "{message}" { Token::Message(FormatSpec::default()) }
            / "{message:" spec:spec() "}" { Token::Message(spec) }
            / "{severity}" { Token::Severity(FormatSpec::default(), SeverityType::String) }
            / "{severity:d}" { Token::Severity(FormatSpec::default(), SeverityType::Num) }
            / "{severity:" spec:spec() ty:sevty()? "}" {
                Token::Severity(spec, ty.unwrap_or(SeverityType::String))
            }
            / "{timestamp}" { Token::Timestamp(FormatSpec::default(), "%+".into(), Timezone::Utc) }
            / "{timestamp:d}" { Token::TimestampNum }
            / "{timestamp:" fmt:strftime()? spec:spec() tz:tz() "}" {
                Token::Timestamp(spec, fmt.unwrap_or_else(|| "%+".into()), tz)
            }
            / "{line}" { Token::Line }
            / "{module}" { Token::Module(FormatSpec::default()) }
            / "{module:" spec:spec() "}" { Token::Module(spec) }
            / "{thread}" { Token::Thread }
            / "{process}" { Token::Process }
            / "{...}" { Token::MetaList }
            / "{" name:name() "}" { Token::Meta(name.into(), FormatSpec::default()) }
            / "{" name:name() ":" spec:spec() "}" { Token::Meta(name.into(), spec) }

        rule spec() -> FormatSpec
            = fill:fill()? align:align()? width:width()? precision:precision()? {
                FormatSpec {
                    fill: fill.unwrap_or(' '),
                    align: align.unwrap_or(Alignment::Left),
                    width: width.unwrap_or(0),
                    precision,
                }
            }

        rule fill() -> char
            = fill:[_] &align() { fill }

        rule align() -> Alignment
            = "<" { Alignment::Left }
            / ">" { Alignment::Right }
            / "^" { Alignment::Center }

        rule width() -> usize
            = width:$(['0'..='9']+) {? width.parse().or(Err("width")) }

        rule precision() -> usize
            = "." precision:$(['0'..='9']+) {? precision.parse().or(Err("precision")) }

        rule sevty() -> SeverityType
            = "d" { SeverityType::Num }
            / "s" { SeverityType::String }

        rule tz() -> Timezone
            = "s" { Timezone::Utc }
            / "l" { Timezone::Local }

        rule strftime() -> String
            = "{" chars:tchar()* "}" { chars.into_iter().collect() }

        rule tchar() -> char
            = "{{" { '{' }
            / "}}" { '}' }
            / !['{' | '}'] ch:[_] { ch }

        rule name() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)
    }
}

pub fn parse(pattern: &str) -> Result<Vec<Token>, ParseError> {
    self::pattern::expression(pattern)
}
