/*!
 * Declaration Scanner
 * Tokenizer and declaration recognizer for lock header text
 */

/// One recognized function declaration: `static ... name(params)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Each parameter as its own token sequence
    pub params: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Punct(char),
}

/// Scan declaration text for `static` function declarations
///
/// The grammar is deliberately small: comments, string/char literals, and
/// preprocessor lines are stripped; a declaration is an identifier followed
/// by a parenthesized parameter list, appearing after a `static` keyword
/// within the same statement (no `;`, `{`, `}`, or `=` in between).
/// Parameter lists split at top-level commas only, so function-pointer
/// parameters stay intact.
pub fn scan_declarations(text: &str) -> Vec<Declaration> {
    let tokens = tokenize(&strip_noise(text));
    let mut decls = Vec::new();

    let mut static_pos: Option<usize> = None;
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            // Statement boundaries and initializers end a declaration candidate
            Token::Punct(';') | Token::Punct('{') | Token::Punct('}') | Token::Punct('=') => {
                static_pos = None;
            }
            Token::Ident(s) if s == "static" => {
                static_pos = Some(i);
            }
            Token::Ident(name)
                if matches!(tokens.get(i + 1), Some(Token::Punct('(')))
                    // At least one return-type token between `static` and the name
                    && static_pos.is_some_and(|p| i >= p + 2) =>
            {
                if let Some((params, close)) = parse_params(&tokens, i + 2) {
                    decls.push(Declaration {
                        name: name.clone(),
                        params,
                    });
                    i = close;
                }
            }
            _ => {}
        }
        i += 1;
    }

    decls
}

/// Parse a parameter list starting just inside the opening parenthesis
///
/// Returns the parameters and the index of the matching closing parenthesis.
fn parse_params(tokens: &[Token], start: usize) -> Option<(Vec<Vec<String>>, usize)> {
    let mut params = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut depth = 1usize;

    let mut i = start;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Punct('(') => {
                depth += 1;
                current.push("(".into());
            }
            Token::Punct(')') => {
                depth -= 1;
                if depth == 0 {
                    if !current.is_empty() {
                        params.push(current);
                    }
                    return Some((params, i));
                }
                current.push(")".into());
            }
            Token::Punct(',') if depth == 1 => {
                params.push(std::mem::take(&mut current));
            }
            Token::Punct(c) => current.push(c.to_string()),
            Token::Ident(s) => current.push(s.clone()),
        }
        i += 1;
    }
    None
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut ident = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
        } else {
            if !ident.is_empty() {
                tokens.push(Token::Ident(std::mem::take(&mut ident)));
            }
            if !c.is_whitespace() {
                tokens.push(Token::Punct(c));
            }
        }
    }
    if !ident.is_empty() {
        tokens.push(Token::Ident(ident));
    }
    tokens
}

/// Blank out comments, string/char literals, and preprocessor lines
///
/// Replaced regions become spaces so token positions stay line-stable for
/// debugging. Preprocessor lines honor backslash continuations.
fn strip_noise(text: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        StringLit,
        CharLit,
        Directive,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut at_line_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '"' => {
                    out.push(' ');
                    state = State::StringLit;
                }
                '\'' => {
                    out.push(' ');
                    state = State::CharLit;
                }
                '#' if at_line_start => {
                    out.push(' ');
                    state = State::Directive;
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                }
            }
            State::StringLit => match c {
                '\\' => {
                    chars.next();
                    out.push_str("  ");
                }
                '"' => {
                    out.push(' ');
                    state = State::Code;
                }
                _ => out.push(' '),
            },
            State::CharLit => match c {
                '\\' => {
                    chars.next();
                    out.push_str("  ");
                }
                '\'' => {
                    out.push(' ');
                    state = State::Code;
                }
                _ => out.push(' '),
            },
            State::Directive => {
                if c == '\\' && chars.peek() == Some(&'\n') {
                    chars.next();
                    out.push_str(" \n");
                } else if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
        }
        at_line_start = c == '\n' || (at_line_start && c.is_whitespace());
    }

    out
}
