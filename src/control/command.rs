//! Control command grammar
//!
//! The first whitespace-separated token is the verb, matched
//! case-insensitively with any `@botname` suffix removed. Trailing tokens
//! beyond the expected arguments are ignored.

use std::str::FromStr;
use thiserror::Error;

/// A parsed control command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Pause,
    Start,
    Balance,
    History,
    Info(u16),
    Boost(u16),
    Slash(u16),
    Exclude(u16),
    Unstake { netuid: u16, amount: f64 },
    Stake { netuid: u16, amount: f64 },
    Amount(f64),
}

/// Parse failures. The display text is the reply sent to the operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid command.")]
    Invalid,

    #[error("Usage: Command requires a netuid.")]
    MissingNetuid,

    #[error("Usage: Command requires a numeric netuid.")]
    InvalidNetuid,

    #[error("Usage: {verb} <netuid> <amount>")]
    MissingAmount { verb: &'static str },

    #[error("Usage: {verb} <netuid> <amount> (amount must be a number)")]
    InvalidAmount { verb: &'static str },

    #[error("Usage: /amount <value> (value must be a number)")]
    InvalidValue,
}

impl Command {
    /// Verb used for metrics labels and logs
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Pause => "pause",
            Command::Start => "start",
            Command::Balance => "balance",
            Command::History => "history",
            Command::Info(_) => "info",
            Command::Boost(_) => "boost",
            Command::Slash(_) => "slash",
            Command::Exclude(_) => "exclude",
            Command::Unstake { .. } => "unstake",
            Command::Stake { .. } => "stake",
            Command::Amount(_) => "amount",
        }
    }

    /// Whether handling the command needs a gateway handle
    pub fn needs_gateway(&self) -> bool {
        matches!(
            self,
            Command::Balance
                | Command::History
                | Command::Info(_)
                | Command::Unstake { .. }
                | Command::Stake { .. }
        )
    }
}

fn parse_netuid(arg: Option<&str>) -> Result<u16, CommandError> {
    arg.ok_or(CommandError::MissingNetuid)?
        .parse()
        .map_err(|_| CommandError::InvalidNetuid)
}

/// Amounts must be finite and strictly positive
fn parse_amount(arg: &str) -> Option<f64> {
    arg.parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

fn parse_transfer(
    verb: &'static str,
    args: &[&str],
) -> Result<(u16, f64), CommandError> {
    let netuid = parse_netuid(args.first().copied())?;
    let amount = args
        .get(1)
        .ok_or(CommandError::MissingAmount { verb })?;
    let amount = parse_amount(amount).ok_or(CommandError::InvalidAmount { verb })?;
    Ok((netuid, amount))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.split_whitespace();
        let verb = parts.next().ok_or(CommandError::Invalid)?;
        let verb = verb.split('@').next().unwrap_or(verb).to_lowercase();
        let args: Vec<&str> = parts.collect();

        match verb.as_str() {
            "/pause" => Ok(Command::Pause),
            "/start" => Ok(Command::Start),
            "/balance" => Ok(Command::Balance),
            "/history" => Ok(Command::History),
            "/info" => parse_netuid(args.first().copied()).map(Command::Info),
            "/boost" => parse_netuid(args.first().copied()).map(Command::Boost),
            "/slash" => parse_netuid(args.first().copied()).map(Command::Slash),
            "/exclude" => parse_netuid(args.first().copied()).map(Command::Exclude),
            "/unstake" => parse_transfer("/unstake", &args)
                .map(|(netuid, amount)| Command::Unstake { netuid, amount }),
            "/stake" => parse_transfer("/stake", &args)
                .map(|(netuid, amount)| Command::Stake { netuid, amount }),
            "/amount" => args
                .first()
                .and_then(|arg| parse_amount(arg))
                .map(Command::Amount)
                .ok_or(CommandError::InvalidValue),
            _ => Err(CommandError::Invalid),
        }
    }
}
