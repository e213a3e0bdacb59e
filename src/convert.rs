use std::io::Write;

use anyhow::{anyhow, Result};
use encoding_rs::{Encoding, SHIFT_JIS};

/// Turns UTF-8 source text into the bytes handed to the compiler.
pub trait Convert {
    fn convert(&self, source: &str, out: &mut dyn Write) -> Result<()>;
}

/// Re-encodes the string and character literals of C source as octal
/// escapes of their legacy encoding. Code and comments stay UTF-8.
pub struct Transcoder {
    encoding: &'static Encoding,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Context {
    Code,
    Literal(char),
    LineComment,
    BlockComment,
}

struct Characters {
    data: Vec<char>,
    counter: usize,
    line: usize,
}

impl Characters {
    fn new(source: &str) -> Self {
        Characters {
            data: source.chars().collect(),
            counter: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.data.get(self.counter).copied()
    }
}

impl Iterator for Characters {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.peek()?;
        self.counter += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }
}

impl Transcoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Transcoder { encoding }
    }

    pub fn for_label(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding label `{label}`."))?;
        // encoding_rs encodes UTF-16 and `replacement` as UTF-8.
        if encoding.output_encoding() != encoding {
            return Err(anyhow!("Cannot encode into {}.", encoding.name()));
        }
        Ok(Transcoder::new(encoding))
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn encode(&self, c: char, line: usize) -> Result<Vec<u8>> {
        let mut buf = [0; 4];
        let (bytes, _, had_errors) = self.encoding.encode(c.encode_utf8(&mut buf));
        if had_errors {
            return Err(anyhow!(
                "Line {line}: {c:?} (U+{:04X}) has no {} representation.",
                c as u32,
                self.encoding.name()
            ));
        }
        Ok(bytes.into_owned())
    }

    fn write_escaped(&self, c: char, line: usize, out: &mut dyn Write) -> Result<()> {
        if c.is_ascii() {
            out.write_all(&[c as u8])?;
        } else {
            // Octal escapes stop after three digits, unlike `\x`.
            for b in self.encode(c, line)? {
                write!(out, "\\{b:03o}")?;
            }
        }
        Ok(())
    }
}

fn write_utf8(c: char, out: &mut dyn Write) -> Result<()> {
    let mut buf = [0; 4];
    out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
    Ok(())
}

impl Default for Transcoder {
    fn default() -> Self {
        Transcoder::new(SHIFT_JIS)
    }
}

impl Convert for Transcoder {
    fn convert(&self, source: &str, out: &mut dyn Write) -> Result<()> {
        let mut cs = Characters::new(source);
        let mut context = Context::Code;

        while let Some(c) = cs.next() {
            match context {
                Context::Code => {
                    match c {
                        '"' | '\'' => context = Context::Literal(c),
                        '/' if cs.peek() == Some('/') => context = Context::LineComment,
                        '/' if cs.peek() == Some('*') => {
                            cs.next();
                            out.write_all(b"/*")?;
                            context = Context::BlockComment;
                            continue;
                        }
                        _ => {}
                    }
                    write_utf8(c, out)?;
                }
                Context::Literal(quote) => {
                    if c == '\\' {
                        out.write_all(b"\\")?;
                        if let Some(escaped) = cs.peek().filter(char::is_ascii) {
                            cs.next();
                            out.write_all(&[escaped as u8])?;
                        }
                        continue;
                    }
                    // An unterminated literal ends at the line break.
                    if c == quote || c == '\n' {
                        context = Context::Code;
                    }
                    self.write_escaped(c, cs.line, out)?;
                }
                Context::LineComment => {
                    if c == '\n' {
                        context = Context::Code;
                    }
                    write_utf8(c, out)?;
                }
                Context::BlockComment => {
                    if c == '*' && cs.peek() == Some('/') {
                        cs.next();
                        out.write_all(b"*/")?;
                        context = Context::Code;
                        continue;
                    }
                    write_utf8(c, out)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn convert(source: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Transcoder::default().convert(source, &mut out)?;
        Ok(out)
    }

    #[test]
    fn ascii_passthrough() -> Result<()> {
        let source = "int main(void) {\n    return puts(\"hi \\\" there\") + '\\'';\n}\n";
        assert_eq!(source.as_bytes(), convert(source)?);
        Ok(())
    }

    #[test]
    fn literal_is_escaped() -> Result<()> {
        assert_eq!(
            br#"char *s = "\223\372\226\173\214\352";"#.to_vec(),
            convert(r#"char *s = "日本語";"#)?
        );
        Ok(())
    }

    #[test]
    fn backslash_trail_byte() -> Result<()> {
        // ソ is 0x83 0x5C in Shift-JIS.
        assert_eq!(br#"'\203\134' "a\203\1341""#.to_vec(), convert(r#"'ソ' "aソ1""#)?);
        Ok(())
    }

    #[test]
    fn comments_stay_utf8() -> Result<()> {
        assert_eq!(
            "// 日本\n/* \"語 */ x = \"\\214\\352\";".as_bytes(),
            convert("// 日本\n/* \"語 */ x = \"語\";")?
        );
        Ok(())
    }

    #[test]
    fn backslash_trail_byte_in_comment() -> Result<()> {
        // 表 is 0x95 0x5C; written raw it would splice the next line.
        let source = "// 表\nint x;\n";
        assert_eq!(source.as_bytes(), convert(source)?);
        Ok(())
    }

    #[test]
    fn unmappable_comment_passes_through() -> Result<()> {
        let source = "/* \u{1F600} */\n// caf\u{E9} \u{1F600}\nint x;\n";
        assert_eq!(source.as_bytes(), convert(source)?);
        Ok(())
    }

    #[test]
    fn escaped_quote_stays_in_literal() -> Result<()> {
        assert_eq!(br#""\"\223\372""#.to_vec(), convert(r#""\"日""#)?);
        Ok(())
    }

    #[test]
    fn unmappable_character() {
        let err = convert("int a;\nchar *s = \"\u{1F600}\";\n").unwrap_err();
        assert!(err.to_string().starts_with("Line 2:"), "{err}");
    }

    #[test]
    fn idempotent() -> Result<()> {
        let source = "/* 説明 */\nconst char *msg = \"メッセージ\";\n";
        assert_eq!(convert(source)?, convert(source)?);
        Ok(())
    }

    #[test]
    fn labels() -> Result<()> {
        assert_eq!(encoding_rs::EUC_JP, Transcoder::for_label("euc-jp")?.encoding());
        assert_eq!(SHIFT_JIS, Transcoder::for_label("sjis")?.encoding());
        assert!(Transcoder::for_label("not-an-encoding").is_err());
        assert!(Transcoder::for_label("utf-16le").is_err());
        assert!(Transcoder::for_label("iso-2022-kr").is_err());
        Ok(())
    }
}
