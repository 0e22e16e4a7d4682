//! Command Grammar Unit Tests

use subnet_staker::control::{Command, CommandError};

#[test]
fn test_all_verbs_parse() {
    let cases = [
        ("/pause", Command::Pause),
        ("/start", Command::Start),
        ("/balance", Command::Balance),
        ("/history", Command::History),
        ("/info 1", Command::Info(1)),
        ("/boost 2", Command::Boost(2)),
        ("/slash 3", Command::Slash(3)),
        ("/exclude 4", Command::Exclude(4)),
        (
            "/unstake 5 1.25",
            Command::Unstake {
                netuid: 5,
                amount: 1.25,
            },
        ),
        (
            "/stake 6 0.5",
            Command::Stake {
                netuid: 6,
                amount: 0.5,
            },
        ),
        ("/amount 0.02", Command::Amount(0.02)),
    ];

    for (text, expected) in cases {
        assert_eq!(text.parse::<Command>(), Ok(expected), "parsing {text}");
    }
}

#[test]
fn test_extra_arguments_are_ignored() {
    assert_eq!("/pause now please".parse::<Command>(), Ok(Command::Pause));
    assert_eq!("/boost 2 3".parse::<Command>(), Ok(Command::Boost(2)));
}

#[test]
fn test_reply_texts() {
    assert_eq!(CommandError::Invalid.to_string(), "Invalid command.");
    assert_eq!(
        CommandError::MissingNetuid.to_string(),
        "Usage: Command requires a netuid."
    );
    assert_eq!(
        CommandError::InvalidNetuid.to_string(),
        "Usage: Command requires a numeric netuid."
    );
    assert_eq!(
        CommandError::MissingAmount { verb: "/unstake" }.to_string(),
        "Usage: /unstake <netuid> <amount>"
    );
    assert_eq!(
        CommandError::InvalidValue.to_string(),
        "Usage: /amount <value> (value must be a number)"
    );
}

#[test]
fn test_netuid_out_of_range() {
    assert_eq!(
        "/info 70000".parse::<Command>(),
        Err(CommandError::InvalidNetuid)
    );
}

#[test]
fn test_zero_amount_rejected() {
    assert_eq!(
        "/stake 1 0".parse::<Command>(),
        Err(CommandError::InvalidAmount { verb: "/stake" })
    );
    assert_eq!("/amount 0".parse::<Command>(), Err(CommandError::InvalidValue));
}

#[test]
fn test_gateway_commands() {
    assert!(Command::Balance.needs_gateway());
    assert!(Command::Info(1).needs_gateway());
    assert!(!Command::Boost(1).needs_gateway());
    assert!(!Command::Amount(1.0).needs_gateway());
    assert_eq!(Command::Exclude(1).verb(), "exclude");
}
