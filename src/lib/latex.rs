//! Plain-text rendering of LaTeX math snippets.
//!
//! README files often contain inline math (`$E = mc^2$`). The PDF output uses the
//! standard Type1 fonts, so math is approximated as a single line of ASCII text
//! rather than typeset. [`render`] first tries to parse the snippet into an
//! expression tree and print it linearly; when the snippet uses anything the parser
//! does not understand it falls back to [`render_fallback`], a fixed sequence of
//! textual substitutions. Neither path can fail.
//!
//! # Examples
//!
//! ```rust
//! use github_portfolio::latex::render;
//!
//! assert_eq!(render("x^{n+1}"), "x^(n + 1)");
//! assert_eq!(render(r"\frac{a+b}{c}"), "(a + b)/c");
//! assert_eq!(render(r"\alpha^2"), "a^2");
//! ```

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt;

/// Named symbols and their ASCII mnemonics. The flag marks binary operators and
/// relations, which the structural printer surrounds with spaces.
const SYMBOLS: &[(&str, &str, bool)] = &[
    ("alpha", "a", false),
    ("beta", "b", false),
    ("gamma", "g", false),
    ("delta", "d", false),
    ("epsilon", "e", false),
    ("varepsilon", "e", false),
    ("zeta", "z", false),
    ("eta", "n", false),
    ("theta", "th", false),
    ("vartheta", "th", false),
    ("iota", "i", false),
    ("kappa", "k", false),
    ("lambda", "l", false),
    ("mu", "m", false),
    ("nu", "v", false),
    ("xi", "x", false),
    ("pi", "p", false),
    ("rho", "r", false),
    ("sigma", "s", false),
    ("tau", "t", false),
    ("upsilon", "u", false),
    ("phi", "ph", false),
    ("varphi", "ph", false),
    ("chi", "ch", false),
    ("psi", "ps", false),
    ("omega", "o", false),
    ("Gamma", "G", false),
    ("Delta", "D", false),
    ("Theta", "Th", false),
    ("Lambda", "L", false),
    ("Xi", "X", false),
    ("Pi", "P", false),
    ("Sigma", "S", false),
    ("Upsilon", "U", false),
    ("Phi", "Ph", false),
    ("Psi", "Ps", false),
    ("Omega", "O", false),
    ("infty", "inf", false),
    ("pm", "+/-", true),
    ("mp", "-/+", true),
    ("times", "x", true),
    ("cdot", "*", true),
    ("div", "/", true),
    ("leq", "<=", true),
    ("le", "<=", true),
    ("geq", ">=", true),
    ("ge", ">=", true),
    ("neq", "!=", true),
    ("ne", "!=", true),
    ("approx", "~", true),
    ("equiv", "==", true),
    ("to", "->", true),
    ("rightarrow", "->", true),
    ("leftarrow", "<-", true),
    ("int", "int", false),
    ("sum", "sum", false),
    ("prod", "prod", false),
    ("sqrt", "sqrt", false),
    ("partial", "d", false),
    ("nabla", "grad", false),
    ("ldots", "...", false),
    ("cdots", "...", false),
];

/// Commands printed verbatim as function names.
const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "lg", "exp", "lim", "max", "min", "sup", "inf", "det", "gcd", "deg",
    "dim", "ker", "arg",
];

/// Commands whose single argument is printed as plain text.
const TEXT_COMMANDS: &[&str] = &[
    "text", "mathrm", "mathbf", "mathit", "mathsf", "mathtt", "operatorname", "textbf",
];

const SPACING_COMMANDS: &[&str] = &[",", ";", ":", "!", " ", "quad", "qquad"];

/// Deepest nesting of groups and command arguments the parser accepts.
const MAX_DEPTH: usize = 64;

fn lookup_symbol(name: &str) -> Option<(&'static str, bool)> {
    SYMBOLS
        .iter()
        .find(|(command, _, _)| *command == name)
        .map(|(_, ascii, binary)| (*ascii, *binary))
}

lazy_static! {
    static ref COMMAND: Regex = Regex::new(r"\\([A-Za-z]+)").unwrap();
    static ref SUP_GROUP: Regex = Regex::new(r"\^\{([^{}]+)\}").unwrap();
    static ref SUP_CHAR: Regex = Regex::new(r"\^([a-zA-Z0-9])").unwrap();
    static ref SUB_GROUP: Regex = Regex::new(r"_\{([^{}]+)\}").unwrap();
    static ref SUB_CHAR: Regex = Regex::new(r"_([a-zA-Z0-9])").unwrap();
    static ref FRAC: Regex = Regex::new(r"\\frac\{([^{}]+)\}\{([^{}]+)\}").unwrap();
}

/// Why a snippet could not be parsed structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathParseError {
    UnknownCommand(String),
    UnsupportedChar(char),
    UnclosedGroup,
    UnexpectedClose,
    MissingArgument,
    MissingBase,
    DoubleScript,
    TrailingBackslash,
    TooDeep,
}

impl fmt::Display for MathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathParseError::UnknownCommand(name) => write!(f, "unknown command \\{}", name),
            MathParseError::UnsupportedChar(c) => write!(f, "unsupported character '{}'", c),
            MathParseError::UnclosedGroup => write!(f, "unclosed brace group"),
            MathParseError::UnexpectedClose => write!(f, "unexpected closing brace"),
            MathParseError::MissingArgument => write!(f, "command is missing an argument"),
            MathParseError::MissingBase => write!(f, "script has no base"),
            MathParseError::DoubleScript => write!(f, "double superscript or subscript"),
            MathParseError::TrailingBackslash => write!(f, "trailing backslash"),
            MathParseError::TooDeep => write!(f, "nesting deeper than {} levels", MAX_DEPTH),
        }
    }
}

impl std::error::Error for MathParseError {}

/// Renders a math snippet as a single line of plain text.
///
/// Tries the structural parser first and silently falls back to textual
/// substitution when parsing fails.
pub fn render(snippet: &str) -> String {
    match render_structural(snippet) {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => render_fallback(snippet),
        Err(err) => {
            log::debug!("math fallback for {:?}: {}", snippet, err);
            render_fallback(snippet)
        }
    }
}

/// Parses `snippet` into an expression tree and prints it linearly.
pub fn render_structural(snippet: &str) -> Result<String, MathParseError> {
    let tokens = lex(snippet)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let nodes = parser.parse_sequence(false)?;
    Ok(print_sequence(&nodes))
}

/// Textual substitution used when the structural parse fails.
///
/// The steps run in a fixed order: named symbols, superscripts, subscripts, then
/// non-nested fractions. Symbols go first so that `\alpha^2` becomes `a^2` rather
/// than leaving a half-rewritten command behind. Unknown commands and unmatched
/// braces are left as they are.
pub fn render_fallback(snippet: &str) -> String {
    let text = COMMAND.replace_all(snippet, |caps: &Captures| match lookup_symbol(&caps[1]) {
        Some((ascii, _)) => ascii.to_string(),
        None => caps[0].to_string(),
    });
    let text = SUP_GROUP.replace_all(&text, "^$1");
    let text = SUP_CHAR.replace_all(&text, "^$1");
    let text = SUB_GROUP.replace_all(&text, "_$1");
    let text = SUB_CHAR.replace_all(&text, "_$1");
    let text = FRAC.replace_all(&text, "$1/$2");
    text.into_owned()
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Char(char),
    Command(String),
    Open,
    Close,
    Sup,
    Sub,
}

fn lex(input: &str) -> Result<Vec<Tok>, MathParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '\\' => match chars.next() {
                Some(next) if next.is_ascii_alphabetic() => {
                    let mut name = next.to_string();
                    while let Some(&n) = chars.peek() {
                        if !n.is_ascii_alphabetic() {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    tokens.push(Tok::Command(name));
                }
                Some(brace @ ('{' | '}' | '|')) => tokens.push(Tok::Char(brace)),
                Some(other) => tokens.push(Tok::Command(other.to_string())),
                None => return Err(MathParseError::TrailingBackslash),
            },
            '{' => tokens.push(Tok::Open),
            '}' => tokens.push(Tok::Close),
            '^' => tokens.push(Tok::Sup),
            '_' => tokens.push(Tok::Sub),
            c if c.is_ascii_alphanumeric() => tokens.push(Tok::Char(c)),
            '+' | '-' | '=' | '<' | '>' | '/' | '*' | '(' | ')' | '[' | ']' | '|' | ',' | '.'
            | '!' | '\'' | ':' | ';' => tokens.push(Tok::Char(c)),
            other => return Err(MathParseError::UnsupportedChar(other)),
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Atom(String),
    Operator(String),
    Function(String),
    Group(Vec<Node>),
    Scripts {
        base: Box<Node>,
        sub: Option<Box<Node>>,
        sup: Option<Box<Node>>,
    },
    Frac(Box<Node>, Box<Node>),
    Sqrt {
        index: Option<Box<Node>>,
        radicand: Box<Node>,
    },
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Runs `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, MathParseError>,
    ) -> Result<T, MathParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathParseError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_sequence(&mut self, in_group: bool) -> Result<Vec<Node>, MathParseError> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None if in_group => return Err(MathParseError::UnclosedGroup),
                None => break,
                Some(Tok::Close) if in_group => {
                    self.pos += 1;
                    break;
                }
                Some(Tok::Close) => return Err(MathParseError::UnexpectedClose),
                Some(Tok::Sup) | Some(Tok::Sub) => {
                    let base = match nodes.pop() {
                        Some(Node::Operator(_)) | None => return Err(MathParseError::MissingBase),
                        Some(base) => base,
                    };
                    let scripted = self.parse_scripts(base)?;
                    nodes.push(scripted);
                }
                Some(_) => {
                    if let Some(node) = self.parse_atom()? {
                        nodes.push(node);
                    }
                }
            }
        }
        Ok(nodes)
    }

    fn parse_scripts(&mut self, base: Node) -> Result<Node, MathParseError> {
        let mut sub = None;
        let mut sup = None;
        while let Some(tok) = self.peek() {
            let slot = match tok {
                Tok::Sup => &mut sup,
                Tok::Sub => &mut sub,
                _ => break,
            };
            if slot.is_some() {
                return Err(MathParseError::DoubleScript);
            }
            self.pos += 1;
            let argument = self.parse_argument()?;
            *slot = Some(Box::new(argument));
        }
        Ok(Node::Scripts {
            base: Box::new(base),
            sub,
            sup,
        })
    }

    /// A single-token argument, as taken by `^`, `_` and `\frac`.
    fn parse_argument(&mut self) -> Result<Node, MathParseError> {
        self.nested(|parser| match parser.next() {
            Some(Tok::Open) => Ok(Node::Group(parser.parse_sequence(true)?)),
            Some(Tok::Char(c)) => Ok(Node::Atom(c.to_string())),
            Some(Tok::Command(name)) => parser
                .parse_command(&name)?
                .ok_or(MathParseError::MissingArgument),
            _ => Err(MathParseError::MissingArgument),
        })
    }

    fn parse_atom(&mut self) -> Result<Option<Node>, MathParseError> {
        match self.next() {
            Some(Tok::Open) => self
                .nested(|parser| parser.parse_sequence(true))
                .map(|nodes| Some(Node::Group(nodes))),
            Some(Tok::Char(c)) if c.is_ascii_digit() => {
                let mut number = c.to_string();
                while let Some(Tok::Char(next)) = self.peek() {
                    let next = *next;
                    let continues_decimal = next == '.'
                        && matches!(self.tokens.get(self.pos + 1), Some(Tok::Char(d)) if d.is_ascii_digit());
                    if !next.is_ascii_digit() && !continues_decimal {
                        break;
                    }
                    number.push(next);
                    self.pos += 1;
                }
                Ok(Some(Node::Atom(number)))
            }
            Some(Tok::Char(c @ ('+' | '-' | '=' | '<' | '>'))) => {
                Ok(Some(Node::Operator(c.to_string())))
            }
            Some(Tok::Char(c)) => Ok(Some(Node::Atom(c.to_string()))),
            Some(Tok::Command(name)) => self.parse_command(&name),
            Some(Tok::Close) => Err(MathParseError::UnexpectedClose),
            Some(Tok::Sup) | Some(Tok::Sub) => Err(MathParseError::MissingBase),
            None => Ok(None),
        }
    }

    fn parse_command(&mut self, name: &str) -> Result<Option<Node>, MathParseError> {
        self.nested(|parser| parser.parse_command_body(name))
    }

    fn parse_command_body(&mut self, name: &str) -> Result<Option<Node>, MathParseError> {
        match name {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_argument()?;
                let denominator = self.parse_argument()?;
                Ok(Some(Node::Frac(Box::new(numerator), Box::new(denominator))))
            }
            "sqrt" => {
                let index = if self.peek() == Some(&Tok::Char('[')) {
                    self.pos += 1;
                    Some(Box::new(Node::Group(self.parse_bracket_index()?)))
                } else {
                    None
                };
                let radicand = self.parse_argument()?;
                Ok(Some(Node::Sqrt {
                    index,
                    radicand: Box::new(radicand),
                }))
            }
            "left" | "right" | "big" | "Big" | "bigl" | "bigr" => match self.next() {
                Some(Tok::Char('.')) => Ok(None),
                Some(Tok::Char(c @ ('(' | ')' | '[' | ']' | '|' | '{' | '}'))) => {
                    Ok(Some(Node::Atom(c.to_string())))
                }
                _ => Err(MathParseError::MissingArgument),
            },
            _ if SPACING_COMMANDS.contains(&name) => Ok(None),
            _ if TEXT_COMMANDS.contains(&name) => self.parse_argument().map(Some),
            _ if FUNCTIONS.contains(&name) => Ok(Some(Node::Function(name.to_string()))),
            _ => match lookup_symbol(name) {
                Some((ascii, true)) => Ok(Some(Node::Operator(ascii.to_string()))),
                Some((ascii, false)) => Ok(Some(Node::Atom(ascii.to_string()))),
                None => Err(MathParseError::UnknownCommand(name.to_string())),
            },
        }
    }

    /// Parses the `[n]` index of `\sqrt[n]{x}` after the opening bracket.
    fn parse_bracket_index(&mut self) -> Result<Vec<Node>, MathParseError> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                Some(Tok::Char(']')) => {
                    self.pos += 1;
                    return Ok(nodes);
                }
                None => return Err(MathParseError::UnclosedGroup),
                Some(_) => {
                    if let Some(node) = self.parse_atom()? {
                        nodes.push(node);
                    }
                }
            }
        }
    }
}

fn is_simple(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

fn wrapped(node: &Node) -> String {
    let text = print_node(node);
    if is_simple(&text) {
        text
    } else {
        format!("({})", text)
    }
}

/// Multi-letter names that need a space before adjacent letters.
fn is_word(node: &Node) -> bool {
    match node {
        Node::Atom(text) => text.chars().count() > 1 && text.chars().all(|c| c.is_alphabetic()),
        Node::Function(_) => true,
        Node::Scripts { base, .. } => is_word(base),
        _ => false,
    }
}

fn print_node(node: &Node) -> String {
    match node {
        Node::Atom(text) | Node::Operator(text) | Node::Function(text) => text.clone(),
        Node::Group(nodes) => print_sequence(nodes),
        Node::Scripts { base, sub, sup } => {
            let mut out = match base.as_ref() {
                Node::Frac(..) | Node::Group(_) => wrapped(base),
                other => print_node(other),
            };
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&wrapped(sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&wrapped(sup));
            }
            out
        }
        Node::Frac(numerator, denominator) => {
            format!("{}/{}", wrapped(numerator), wrapped(denominator))
        }
        Node::Sqrt {
            index: None,
            radicand,
        } => format!("sqrt({})", print_node(radicand)),
        Node::Sqrt {
            index: Some(index),
            radicand,
        } => format!("{}^(1/{})", wrapped(radicand), print_node(index)),
    }
}

fn print_sequence(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Node> = None;
    for node in nodes {
        let text = print_node(node);
        match node {
            Node::Operator(op) => {
                let unary = matches!(previous, None | Some(Node::Operator(_)));
                if unary {
                    out.push_str(op);
                } else {
                    out.push(' ');
                    out.push_str(op);
                    out.push(' ');
                }
            }
            _ => {
                let touches_alnum = out.chars().last().is_some_and(|c| c.is_ascii_alphanumeric())
                    && text.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
                let after_word = previous.is_some_and(is_word) || is_word(node);
                if touches_alnum && after_word {
                    out.push(' ');
                }
                out.push_str(&text);
            }
        }
        previous = Some(node);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_scripts_and_fractions() {
        assert_eq!(render("x^2"), "x^2");
        assert_eq!(render("x^{n+1}"), "x^(n + 1)");
        assert_eq!(render("a_{i}"), "a_i");
        assert_eq!(render("x_i^2"), "x_i^2");
        assert_eq!(render(r"\frac{a+b}{c}"), "(a + b)/c");
        assert_eq!(render(r"\frac12"), "1/2");
        assert_eq!(render("E = mc^2"), "E = mc^2");
    }

    #[test]
    fn test_structural_functions_and_roots() {
        assert_eq!(render(r"\sqrt{x}"), "sqrt(x)");
        assert_eq!(render(r"\sqrt[3]{x}"), "x^(1/3)");
        assert_eq!(render(r"\sin x"), "sin x");
        assert_eq!(render(r"\sin(x)"), "sin(x)");
        assert_eq!(render(r"\sum_{i=1}^{n} i"), "sum_(i = 1)^n i");
        assert_eq!(render(r"\left( a \right)"), "(a)");
    }

    #[test]
    fn test_structural_operators() {
        assert_eq!(render(r"a \pm b"), "a +/- b");
        assert_eq!(render(r"x \leq 3.5"), "x <= 3.5");
        assert_eq!(render("-x"), "-x");
        assert_eq!(render("a = -b"), "a = -b");
        assert_eq!(render(r"\alpha^2"), "a^2");
    }

    #[test]
    fn test_structural_rejects_unknown_commands() {
        assert_eq!(
            render_structural(r"\mathbb{R}"),
            Err(MathParseError::UnknownCommand("mathbb".to_string()))
        );
        assert_eq!(render_structural("{x"), Err(MathParseError::UnclosedGroup));
        assert_eq!(render_structural("x}"), Err(MathParseError::UnexpectedClose));
        assert_eq!(render_structural("^2"), Err(MathParseError::MissingBase));
        assert_eq!(render_structural("x^2^3"), Err(MathParseError::DoubleScript));
        assert_eq!(render_structural("a & b"), Err(MathParseError::UnsupportedChar('&')));
    }

    #[test]
    fn test_fallback_substitutes_symbols_before_scripts() {
        assert_eq!(render_fallback(r"\alpha^2"), "a^2");
        assert_eq!(render_fallback(r"\beta_{ij}"), "b_ij");
    }

    #[test]
    fn test_fallback_pipeline() {
        assert_eq!(render_fallback(r"x^{10} + \infty"), "x^10 + inf");
        assert_eq!(render_fallback(r"\frac{a}{b}"), "a/b");
        assert_eq!(render_fallback(r"\frac{\frac{a}{b}}{c}"), r"\frac{a/b}{c}");
    }

    #[test]
    fn test_fallback_keeps_unknown_commands_and_braces() {
        assert_eq!(render_fallback(r"\mathbb{R} \pmb{x}"), r"\mathbb{R} \pmb{x}");
        assert_eq!(render_fallback("{x"), "{x");
        assert_eq!(render(r"\mathbb{R}^n"), r"\mathbb{R}^n");
    }

    #[test]
    fn test_deep_nesting_falls_back() {
        let deep = format!("{}x{}", "{".repeat(100_000), "}".repeat(100_000));
        assert_eq!(render_structural(&deep), Err(MathParseError::TooDeep));
        assert_eq!(render(&deep), deep);

        let fractions = format!("{}1{}", r"\frac{".repeat(200), "}{2}".repeat(200));
        assert_eq!(render_structural(&fractions), Err(MathParseError::TooDeep));
        let _ = render(&fractions);

        let shallow = format!("{}x{}", "{".repeat(10), "}".repeat(10));
        assert_eq!(render(&shallow), "x");
    }

    #[test]
    fn test_render_is_pure() {
        for snippet in [r"\alpha^2", r"\mathbb{R}", "x^{2}", "", r"\frac{1}{\gamma}"] {
            assert_eq!(render(snippet), render(snippet));
            assert_eq!(render_fallback(snippet), render_fallback(snippet));
        }
    }
}
