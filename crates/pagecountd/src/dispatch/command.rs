//! Chat command parsing.
//!
//! Operators type commands such as `/contador ip:10.0.0.1` or
//! `/adicionar NID:200 IP:10.0.0.3 SETOR:Almoxarifado`. The first token names
//! the command; the remaining text carries `KEYWORD:value` fields at token
//! boundaries. Free-text fields (`SETOR:`, the `PARA:` label of
//! `/atualizarSetor` and the argument of `/buscar`) capture the rest of the
//! message, so they must come last.

use std::fmt;
use std::net::Ipv4Addr;

use pagecount_inventory::{AssetId, Lookup};
use thiserror::Error;

const ADDRESS_KEYWORD: &str = "ip:";
const ASSET_ID_KEYWORD: &str = "NID:";
const TARGET_KEYWORD: &str = "PARA:";
const TARGET_ADDRESS_ALIAS: &str = "PARA_IP:";
const TARGET_LABEL_ALIAS: &str = "PARA_SETOR:";
const LABEL_KEYWORD: &str = "SETOR:";

/// Names of the commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// `/start`
    Start,
    /// `/comandos`
    Help,
    /// `/contadores`
    Counters,
    /// `/contador`
    Counter,
    /// `/atualizarNID`
    RenameAssetId,
    /// `/atualizarIP`
    Move,
    /// `/atualizarSetor`
    Relabel,
    /// `/adicionar`
    Add,
    /// `/buscar`
    Search,
    /// `/buscarErro`
    ListFailures,
    /// `/remover`
    Remove,
}

impl CommandName {
    /// Every command in the order `/comandos` lists them.
    pub const ALL: [Self; 11] = [
        Self::Start,
        Self::Help,
        Self::Counters,
        Self::Counter,
        Self::RenameAssetId,
        Self::Move,
        Self::Relabel,
        Self::Add,
        Self::Search,
        Self::ListFailures,
        Self::Remove,
    ];

    /// Slash-prefixed keyword typed by the operator.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/comandos",
            Self::Counters => "/contadores",
            Self::Counter => "/contador",
            Self::RenameAssetId => "/atualizarNID",
            Self::Move => "/atualizarIP",
            Self::Relabel => "/atualizarSetor",
            Self::Add => "/adicionar",
            Self::Search => "/buscar",
            Self::ListFailures => "/buscarErro",
            Self::Remove => "/remover",
        }
    }

    /// Usage line shown by `/comandos` and in parse error replies.
    #[must_use]
    pub fn usage(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/comandos",
            Self::Counters => "/contadores",
            Self::Counter => "/contador ip:<IP> ou /contador NID:<NID>",
            Self::RenameAssetId => "/atualizarNID NID:<NID atual> PARA:<novo NID>",
            Self::Move => "/atualizarIP NID:<NID> PARA:<novo IP>",
            Self::Relabel => "/atualizarSetor NID:<NID> PARA:<novo setor>",
            Self::Add => "/adicionar NID:<NID> IP:<IP> SETOR:<setor>",
            Self::Search => "/buscar <texto>",
            Self::ListFailures => "/buscarErro",
            Self::Remove => "/remover NID:<NID> ou /remover IP:<IP>",
        }
    }

    /// One-line description shown by `/comandos`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "mensagem de boas-vindas",
            Self::Help => "lista os comandos disponíveis",
            Self::Counters => "lê o contador de todas as impressoras",
            Self::Counter => "lê o contador de uma impressora",
            Self::RenameAssetId => "altera o NID de uma impressora",
            Self::Move => "altera o IP de uma impressora",
            Self::Relabel => "altera o setor de uma impressora",
            Self::Add => "cadastra uma impressora",
            Self::Search => "procura impressoras pelo setor",
            Self::ListFailures => "lista impressoras cuja leitura falhou",
            Self::Remove => "remove uma impressora",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.keyword() == keyword)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.keyword())
    }
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Greets the operator.
    Start,
    /// Lists available commands.
    Help,
    /// Reads every printer's counter.
    Counters,
    /// Reads one printer's counter.
    Counter(Lookup),
    /// Changes a printer's asset identifier.
    RenameAssetId {
        /// Current identifier.
        from: AssetId,
        /// Replacement identifier.
        to: AssetId,
    },
    /// Moves a printer to a new address.
    Move {
        /// Printer to move.
        asset_id: AssetId,
        /// New address.
        address: Ipv4Addr,
    },
    /// Changes a printer's sector label.
    Relabel {
        /// Printer to relabel.
        asset_id: AssetId,
        /// New label.
        label: String,
    },
    /// Registers a printer.
    Add {
        /// Asset identifier of the new printer.
        asset_id: AssetId,
        /// Address of the new printer.
        address: Ipv4Addr,
        /// Sector label of the new printer.
        label: String,
    },
    /// Finds printers by label.
    Search {
        /// Text to look for.
        text: String,
    },
    /// Lists printers whose counter read failed.
    ListFailures,
    /// Deletes a printer.
    Remove(Lookup),
}

impl Command {
    /// Name of the command that produced this value.
    #[must_use]
    pub fn name(&self) -> CommandName {
        match self {
            Self::Start => CommandName::Start,
            Self::Help => CommandName::Help,
            Self::Counters => CommandName::Counters,
            Self::Counter(_) => CommandName::Counter,
            Self::RenameAssetId { .. } => CommandName::RenameAssetId,
            Self::Move { .. } => CommandName::Move,
            Self::Relabel { .. } => CommandName::Relabel,
            Self::Add { .. } => CommandName::Add,
            Self::Search { .. } => CommandName::Search,
            Self::ListFailures => CommandName::ListFailures,
            Self::Remove(_) => CommandName::Remove,
        }
    }
}

/// Reasons a message could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The message was blank.
    #[error("empty message")]
    Empty,
    /// The message does not start with a slash command.
    #[error("message does not start with a command")]
    NotACommand,
    /// The slash command is not one the bot knows.
    #[error("unknown command '{name}'")]
    UnknownCommand {
        /// Command name as typed.
        name: String,
    },
    /// A required field was not supplied.
    #[error("{command} requires {field}")]
    MissingField {
        /// Command being parsed.
        command: CommandName,
        /// Description of the missing field.
        field: &'static str,
    },
    /// A field that should hold an IPv4 address did not.
    #[error("{command}: '{value}' is not an IPv4 address")]
    InvalidAddress {
        /// Command being parsed.
        command: CommandName,
        /// Rejected value.
        value: String,
    },
    /// A field that should hold an asset identifier did not.
    #[error("{command}: '{value}' is not a valid NID")]
    InvalidAssetId {
        /// Command being parsed.
        command: CommandName,
        /// Rejected value.
        value: String,
    },
    /// A free-text field was empty.
    #[error("{command}: {field} must not be empty")]
    EmptyText {
        /// Command being parsed.
        command: CommandName,
        /// Description of the empty field.
        field: &'static str,
    },
}

impl ParseError {
    /// Command whose arguments failed to parse, when one was recognised.
    #[must_use]
    pub fn command(&self) -> Option<CommandName> {
        match self {
            Self::Empty | Self::NotACommand | Self::UnknownCommand { .. } => None,
            Self::MissingField { command, .. }
            | Self::InvalidAddress { command, .. }
            | Self::InvalidAssetId { command, .. }
            | Self::EmptyText { command, .. } => Some(*command),
        }
    }
}

/// Parses one chat message.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the first piece of the message that could
/// not be understood.
pub fn parse(text: &str) -> Result<Command, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    let (head, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(head, rest)| (head, rest.trim()));
    if !head.starts_with('/') {
        return Err(ParseError::NotACommand);
    }
    let keyword = head.split_once('@').map_or(head, |(keyword, _)| keyword);
    let name = CommandName::from_keyword(keyword).ok_or_else(|| ParseError::UnknownCommand {
        name: keyword.to_owned(),
    })?;

    let fields = Fields {
        command: name,
        text: rest,
    };
    match name {
        CommandName::Start => Ok(Command::Start),
        CommandName::Help => Ok(Command::Help),
        CommandName::Counters => Ok(Command::Counters),
        CommandName::ListFailures => Ok(Command::ListFailures),
        CommandName::Counter => fields.counter_target().map(Command::Counter),
        CommandName::Remove => fields.removal_target().map(Command::Remove),
        CommandName::RenameAssetId => Ok(Command::RenameAssetId {
            from: fields.required_asset_id()?,
            to: fields.asset_id_value(TARGET_KEYWORD, &[], "PARA:<novo NID>")?,
        }),
        CommandName::Move => Ok(Command::Move {
            asset_id: fields.required_asset_id()?,
            address: fields.address_value(
                TARGET_KEYWORD,
                &[TARGET_ADDRESS_ALIAS],
                "PARA:<novo IP>",
            )?,
        }),
        CommandName::Relabel => fields.relabel(),
        CommandName::Add => fields.add(),
        CommandName::Search => {
            if rest.is_empty() {
                return Err(ParseError::EmptyText {
                    command: name,
                    field: "o texto da busca",
                });
            }
            Ok(Command::Search {
                text: rest.to_owned(),
            })
        }
    }
}

/// Argument text of one command.
#[derive(Clone, Copy)]
struct Fields<'a> {
    command: CommandName,
    text: &'a str,
}

impl<'a> Fields<'a> {
    fn counter_target(self) -> Result<Lookup, ParseError> {
        if let Some(value) = self.address_token() {
            return self.parse_address(value).map(Lookup::Address);
        }
        if let Some(value) = self.token_value(ASSET_ID_KEYWORD) {
            return self.parse_asset_id(value).map(Lookup::AssetId);
        }
        Err(self.missing("ip:<IP> ou NID:<NID>"))
    }

    fn removal_target(self) -> Result<Lookup, ParseError> {
        if let Some(value) = self.token_value(ASSET_ID_KEYWORD) {
            return self.parse_asset_id(value).map(Lookup::AssetId);
        }
        if let Some(value) = self.address_token() {
            return self.parse_address(value).map(Lookup::Address);
        }
        Err(self.missing("NID:<NID> ou IP:<IP>"))
    }

    fn relabel(self) -> Result<Command, ParseError> {
        let Some((before, label)) = self.split_free_text(&[TARGET_KEYWORD, TARGET_LABEL_ALIAS])
        else {
            return Err(self.missing("PARA:<novo setor>"));
        };
        let asset_id = before.required_asset_id()?;
        let label = self.non_empty(label, "o novo setor")?;
        Ok(Command::Relabel { asset_id, label })
    }

    fn add(self) -> Result<Command, ParseError> {
        let Some((before, label)) = self.split_free_text(&[LABEL_KEYWORD]) else {
            return Err(self.missing("SETOR:<setor>"));
        };
        let asset_id = before.required_asset_id()?;
        let Some(address) = before.address_token() else {
            return Err(self.missing("IP:<IP>"));
        };
        let address = self.parse_address(address)?;
        let label = self.non_empty(label, "o setor")?;
        Ok(Command::Add {
            asset_id,
            address,
            label,
        })
    }

    fn required_asset_id(self) -> Result<AssetId, ParseError> {
        self.asset_id_value(ASSET_ID_KEYWORD, &[], "NID:<NID>")
    }

    fn asset_id_value(
        self,
        keyword: &str,
        aliases: &[&str],
        field: &'static str,
    ) -> Result<AssetId, ParseError> {
        let value = self
            .first_token_value(keyword, aliases)
            .ok_or_else(|| self.missing(field))?;
        self.parse_asset_id(value)
    }

    fn address_value(
        self,
        keyword: &str,
        aliases: &[&str],
        field: &'static str,
    ) -> Result<Ipv4Addr, ParseError> {
        let value = self
            .first_token_value(keyword, aliases)
            .ok_or_else(|| self.missing(field))?;
        self.parse_address(value)
    }

    fn first_token_value(self, keyword: &str, aliases: &[&str]) -> Option<&'a str> {
        std::iter::once(keyword)
            .chain(aliases.iter().copied())
            .find_map(|candidate| self.token_value(candidate))
    }

    /// Value of the first token starting with `keyword`.
    fn token_value(self, keyword: &str) -> Option<&'a str> {
        self.text
            .split_whitespace()
            .find_map(|token| token.strip_prefix(keyword))
    }

    /// Value of the first `ip:` token, whatever the keyword's case.
    fn address_token(self) -> Option<&'a str> {
        self.text.split_whitespace().find_map(|token| {
            let prefix = token.get(..ADDRESS_KEYWORD.len())?;
            if prefix.eq_ignore_ascii_case(ADDRESS_KEYWORD) {
                token.get(ADDRESS_KEYWORD.len()..)
            } else {
                None
            }
        })
    }

    /// Splits the text at the first of `keywords` found at a token boundary,
    /// returning the fields before it and the trimmed remainder after it.
    fn split_free_text(self, keywords: &[&str]) -> Option<(Self, &'a str)> {
        let (start, keyword) = keywords
            .iter()
            .filter_map(|keyword| {
                self.keyword_position(keyword)
                    .map(|position| (position, *keyword))
            })
            .min_by_key(|(position, _)| *position)?;
        let before = self.text.get(..start)?;
        let after = self.text.get(start + keyword.len()..)?;
        Some((
            Self {
                command: self.command,
                text: before,
            },
            after.trim(),
        ))
    }

    fn keyword_position(self, keyword: &str) -> Option<usize> {
        self.text.match_indices(keyword).map(|(index, _)| index).find(|index| {
            self.text
                .get(..*index)
                .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with(char::is_whitespace))
        })
    }

    fn parse_address(self, value: &str) -> Result<Ipv4Addr, ParseError> {
        value.parse().map_err(|_| ParseError::InvalidAddress {
            command: self.command,
            value: value.to_owned(),
        })
    }

    fn parse_asset_id(self, value: &str) -> Result<AssetId, ParseError> {
        AssetId::parse(value).map_err(|_| ParseError::InvalidAssetId {
            command: self.command,
            value: value.to_owned(),
        })
    }

    fn non_empty(self, text: &str, field: &'static str) -> Result<String, ParseError> {
        if text.is_empty() {
            Err(ParseError::EmptyText {
                command: self.command,
                field,
            })
        } else {
            Ok(text.to_owned())
        }
    }

    fn missing(self, field: &'static str) -> ParseError {
        ParseError::MissingField {
            command: self.command,
            field,
        }
    }
}
