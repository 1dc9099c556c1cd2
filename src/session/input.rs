//! Terminal input parsing.

/// A parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reset,
    Back,
    Quit,
    Help,
    /// A bare number, e.g. a 1-5 scale selection.
    Choice(u8),
    Text(String),
}

/// Parses user input into commands.
pub struct InputParser;

impl InputParser {
    pub fn parse(content: &str) -> Command {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/reset" | "/restart" | "/new" => Command::Reset,
            "/back" | "/previous" | "/prev" => Command::Back,
            "/quit" | "/exit" => Command::Quit,
            "/help" | "/?" => Command::Help,
            _ => match trimmed.parse::<u8>() {
                Ok(n) => Command::Choice(n),
                Err(_) => Command::Text(trimmed.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(InputParser::parse("/reset"), Command::Reset);
        assert_eq!(InputParser::parse("  /BACK "), Command::Back);
        assert_eq!(InputParser::parse("/exit"), Command::Quit);
        assert_eq!(InputParser::parse("/?"), Command::Help);
    }

    #[test]
    fn parse_choice() {
        assert_eq!(InputParser::parse("4"), Command::Choice(4));
        assert_eq!(InputParser::parse(" 0 "), Command::Choice(0));
    }

    #[test]
    fn parse_text() {
        assert_eq!(
            InputParser::parse("I changed my mind once"),
            Command::Text("I changed my mind once".to_string())
        );
        assert_eq!(InputParser::parse("/unknown"), Command::Text("/unknown".to_string()));
        assert_eq!(InputParser::parse("300"), Command::Text("300".to_string()));
    }
}
