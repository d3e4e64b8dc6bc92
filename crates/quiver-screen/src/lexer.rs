//! Comment and string masking for Python source.
//!
//! [`mask_source`] blanks out comment bodies and string-literal contents with
//! spaces. Quote delimiters and line breaks are kept, so every remaining
//! character stays on its original line and column (counted in chars).

use std::str::Chars;

use crate::error::{ScreenError, ScreenResult};

/// Mask comments and string contents in `source`.
///
/// Single-quoted literals left open at the end of a line are closed there.
/// Triple-quoted literals must be closed.
///
/// # Errors
///
/// Returns [`ScreenError::UnterminatedString`] for a triple-quoted literal
/// that runs to the end of the file.
pub fn mask_source(source: &str) -> ScreenResult<String> {
    let mut masker = Masker {
        chars: source.chars(),
        out: String::with_capacity(source.len()),
        line: 1,
    };
    masker.run()?;
    Ok(masker.out)
}

struct Masker<'a> {
    chars: Chars<'a>,
    out: String,
    line: usize,
}

impl Masker<'_> {
    fn run(&mut self) -> ScreenResult<()> {
        while let Some(c) = self.chars.next() {
            match c {
                '#' => self.comment(),
                '\'' | '"' => self.string(c)?,
                '\n' => self.newline(),
                _ => self.out.push(c),
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Whether the next two chars repeat `quote`.
    fn continues_triple(&self, quote: char) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some(quote) && ahead.next() == Some(quote)
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line = self.line.saturating_add(1);
    }

    /// Blank a char inside a literal, keeping line breaks.
    fn blank(&mut self, c: char) {
        if c == '\n' {
            self.newline();
        } else {
            self.out.push(' ');
        }
    }

    fn comment(&mut self) {
        self.out.push(' ');
        while self.peek().is_some_and(|c| c != '\n') {
            self.chars.next();
            self.out.push(' ');
        }
    }

    fn string(&mut self, quote: char) -> ScreenResult<()> {
        if self.continues_triple(quote) {
            self.chars.next();
            self.chars.next();
            self.triple_string(quote)
        } else {
            self.single_string(quote);
            Ok(())
        }
    }

    fn triple_string(&mut self, quote: char) -> ScreenResult<()> {
        let start = self.line;
        self.out.extend([quote; 3]);
        loop {
            match self.chars.next() {
                None => return Err(ScreenError::UnterminatedString { line: start }),
                Some('\\') => {
                    self.out.push(' ');
                    if let Some(escaped) = self.chars.next() {
                        self.blank(escaped);
                    }
                },
                Some(c) if c == quote && self.continues_triple(quote) => {
                    self.chars.next();
                    self.chars.next();
                    self.out.extend([quote; 3]);
                    return Ok(());
                },
                Some(c) => self.blank(c),
            }
        }
    }

    fn single_string(&mut self, quote: char) {
        self.out.push(quote);
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }
            self.chars.next();
            match c {
                '\\' => {
                    self.out.push(' ');
                    if let Some(escaped) = self.chars.next() {
                        self.blank(escaped);
                    }
                },
                c if c == quote => {
                    self.out.push(quote);
                    return;
                },
                c => self.blank(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_is_blanked() {
        let masked = mask_source("x = 1  # os.system('rm')\ny = 2\n").unwrap();
        assert_eq!(masked, format!("x = 1  {}\ny = 2\n", " ".repeat(17)));
    }

    #[test]
    fn test_string_contents_blanked_columns_kept() {
        let src = "print(\"eval(x)\")\n";
        let masked = mask_source(src).unwrap();
        assert_eq!(masked, "print(\"       \")\n");
        assert_eq!(masked.chars().count(), src.chars().count());
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        let masked = mask_source("s = 'it\\'s exec(1)'\nexec(2)\n").unwrap();
        let lines: Vec<&str> = masked.lines().collect();
        assert!(!lines[0].contains("exec"));
        assert_eq!(lines[1], "exec(2)");
    }

    #[test]
    fn test_triple_string_keeps_line_breaks() {
        let src = "\"\"\"\nDescription: runs eval(\n\"\"\"\neval('1')\n";
        let masked = mask_source(src).unwrap();
        assert_eq!(masked.lines().count(), src.lines().count());
        assert!(!masked.lines().nth(1).unwrap().contains("eval"));
        assert!(masked.lines().nth(3).unwrap().starts_with("eval("));
    }

    #[test]
    fn test_empty_string_then_code() {
        let masked = mask_source("a = '' + exec(b)\n").unwrap();
        assert_eq!(masked, "a = '' + exec(b)\n");
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let masked = mask_source("u = \"#\"; os.system(u)\n").unwrap();
        assert!(masked.contains("os.system(u)"));
    }

    #[test]
    fn test_unterminated_triple_string_fails() {
        let err = mask_source("x = 1\ny = '''\nnever closed\n").unwrap_err();
        assert!(matches!(err, ScreenError::UnterminatedString { line: 2 }));
        assert_eq!(
            err.to_string(),
            "unterminated string literal starting at line 2"
        );
    }

    #[test]
    fn test_unterminated_single_string_closes_at_eol() {
        let masked = mask_source("s = 'open\nexec(1)\n").unwrap();
        assert_eq!(masked.lines().nth(1), Some("exec(1)"));
    }
}
