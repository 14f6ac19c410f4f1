//! Flat command table: the whole input line, lowercased, names one command.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Save,
    Load,
    Sessions,
    Delete,
    Reset,
    Summarize,
    Attach,
    Attachments,
    Purge,
    PurgeAll,
    Web,
    ChangeDir,
    Copy,
    Consume,
    Settings,
    ContextLength,
    RefreshRate,
    Theme,
    ApiKey,
    SystemPrompt,
    ProfileList,
    ProfileAdd,
    ProfileRemove,
    ProfileSwitch,
    Clear,
    Quit,
}

const COMMANDS: &[(&str, Command)] = &[
    ("!h", Command::Help),
    ("!help", Command::Help),
    ("!s", Command::Save),
    ("!save", Command::Save),
    ("!l", Command::Load),
    ("!load", Command::Load),
    ("!sessions", Command::Sessions),
    ("!delete", Command::Delete),
    ("!reset", Command::Reset),
    ("!sum", Command::Summarize),
    ("!summary", Command::Summarize),
    ("!a", Command::Attach),
    ("!attach", Command::Attach),
    ("!attachments", Command::Attachments),
    ("!purge", Command::Purge),
    ("!purge all", Command::PurgeAll),
    ("!web", Command::Web),
    ("!cd", Command::ChangeDir),
    ("!cp", Command::Copy),
    ("!consume", Command::Consume),
    ("!config", Command::Settings),
    ("!ctx", Command::ContextLength),
    ("!rate", Command::RefreshRate),
    ("!theme", Command::Theme),
    ("!key", Command::ApiKey),
    ("!prompt", Command::SystemPrompt),
    ("!profile list", Command::ProfileList),
    ("!profile add", Command::ProfileAdd),
    ("!profile remove", Command::ProfileRemove),
    ("!profile switch", Command::ProfileSwitch),
    ("!clear", Command::Clear),
    ("!q", Command::Quit),
    ("!quit", Command::Quit),
];

impl Command {
    pub fn lookup(input: &str) -> Option<Command> {
        let key = input.trim().to_lowercase();
        COMMANDS.iter().find(|(name, _)| *name == key).map(|(_, cmd)| *cmd)
    }

    /// Commands that discard the current history ask to save it first.
    pub fn offers_save(&self) -> bool {
        matches!(self, Command::Quit | Command::Summarize | Command::Load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_same_command() {
        assert_eq!(Command::lookup("!h"), Some(Command::Help));
        assert_eq!(Command::lookup("!HELP"), Some(Command::Help));
        assert_eq!(Command::lookup("  !sum "), Some(Command::Summarize));
        assert_eq!(Command::lookup("!summary"), Some(Command::Summarize));
    }

    #[test]
    fn multi_word_commands_match_whole_line() {
        assert_eq!(Command::lookup("!purge all"), Some(Command::PurgeAll));
        assert_eq!(Command::lookup("!purge"), Some(Command::Purge));
        assert_eq!(Command::lookup("!Profile Switch"), Some(Command::ProfileSwitch));
        assert_eq!(Command::lookup("!profile"), None);
    }

    #[test]
    fn plain_text_and_unknown_commands_miss() {
        assert_eq!(Command::lookup("hello !h"), None);
        assert_eq!(Command::lookup("!nope"), None);
        assert_eq!(Command::lookup("!h extra"), None);
    }

    #[test]
    fn save_prompt_only_for_destructive_commands() {
        assert!(Command::Quit.offers_save());
        assert!(Command::Load.offers_save());
        assert!(!Command::Save.offers_save());
        assert!(!Command::Reset.offers_save());
    }
}
