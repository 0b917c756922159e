/// A whitespace-delimited word of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Any part of the word was quoted or escaped; such words are never
    /// keywords or separators
    pub quoted: bool,
}

impl Token {
    pub fn is_separator(&self) -> bool {
        !self.quoted && (self.text.eq_ignore_ascii_case("and") || self.text == "&&")
    }

    /// Lowercased keyword text for unquoted words
    pub fn keyword(&self) -> Option<String> {
        if self.quoted {
            None
        } else {
            Some(self.text.to_lowercase())
        }
    }
}

/// Splits a query on unquoted whitespace.
///
/// `"` and `'` quote, backslash escapes the next character (also inside
/// quotes), and a quote with no closing partner is kept as a literal.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current = chars.first().copied();
        Self {
            input: chars,
            position: 0,
            current_char: current,
        }
    }

    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut tokenizer = Self::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Whether a matching unescaped `quote` follows the current position
    fn has_closing_quote(&self, quote: char) -> bool {
        let mut i = self.position + 1;
        while let Some(&ch) = self.input.get(i) {
            if ch == '\\' {
                i += 2;
                continue;
            }
            if ch == quote {
                return true;
            }
            i += 1;
        }
        false
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        self.current_char?;

        let mut text = String::new();
        let mut quoted = false;
        let mut open_quote: Option<char> = None;

        while let Some(ch) = self.current_char {
            match ch {
                '\\' => {
                    self.advance();
                    match self.current_char {
                        Some(escaped) => {
                            text.push(escaped);
                            quoted = true;
                            self.advance();
                        }
                        // Trailing backslash stays literal
                        None => text.push('\\'),
                    }
                }
                q if open_quote == Some(q) => {
                    open_quote = None;
                    self.advance();
                }
                '"' | '\'' if open_quote.is_none() => {
                    if self.has_closing_quote(ch) {
                        open_quote = Some(ch);
                        quoted = true;
                    } else {
                        text.push(ch);
                    }
                    self.advance();
                }
                c if c.is_whitespace() && open_quote.is_none() => break,
                c => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        Some(Token { text, quoted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        Tokenizer::tokenize(input)
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_splits_on_whitespace() {
        assert_eq!(texts("  age   ==\t30 "), vec!["age", "==", "30"]);
        assert!(texts("   ").is_empty());
    }

    #[test]
    fn test_quotes_suppress_splitting() {
        assert_eq!(texts(r#"city == "New York""#), vec!["city", "==", "New York"]);
        assert_eq!(texts("name == 'Bo Jo'"), vec!["name", "==", "Bo Jo"]);
        assert_eq!(texts(r#"a"b c"d"#), vec!["ab cd"]);
    }

    #[test]
    fn test_backslash_escapes() {
        assert_eq!(texts(r"New\ York"), vec!["New York"]);
        assert_eq!(texts(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(texts(r"trailing\"), vec![r"trailing\"]);
    }

    #[test]
    fn test_unterminated_quote_is_literal() {
        assert_eq!(texts(r#"name == O"Neil"#), vec!["name", "==", r#"O"Neil"#]);
        assert_eq!(texts("it's fine"), vec!["it's", "fine"]);
    }

    #[test]
    fn test_quoted_words_are_not_separators() {
        let tokens = Tokenizer::tokenize(r#"and "and" \&&"#);
        assert!(tokens[0].is_separator());
        assert!(!tokens[1].is_separator());
        assert!(!tokens[2].is_separator());
        assert_eq!(tokens[1].text, "and");
        assert_eq!(tokens[1].keyword(), None);
    }

    #[test]
    fn test_empty_quoted_token() {
        let tokens = Tokenizer::tokenize(r#"name == """#);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "");
        assert!(tokens[2].quoted);
    }
}
