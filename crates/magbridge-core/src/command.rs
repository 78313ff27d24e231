//! Inbound command vocabulary.
//!
//! Commands are single tokens sent by the peer. Dispatching a command never
//! performs the side effect itself; it yields a [`CommandAction`] that the
//! caller carries out.

/// A recognized command token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    LedOn,
    LedOff,
    Reset,
    Calibrate,
}

/// What the caller should do in response to an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Unknown, malformed or missing command.
    Noop,
    /// Drive the indicator output high (`true`) or low (`false`).
    SetIndicator(bool),
    /// Close the connection and restart the device.
    RequestRestart,
    /// Start a calibration capture.
    RequestCalibration,
}

impl Command {
    /// Parse an exact, case-sensitive wire token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "LED_ON" => Some(Command::LedOn),
            "LED_OFF" => Some(Command::LedOff),
            "RESET" => Some(Command::Reset),
            "CALIBRATE" => Some(Command::Calibrate),
            _ => None,
        }
    }

    pub fn action(self) -> CommandAction {
        match self {
            Command::LedOn => CommandAction::SetIndicator(true),
            Command::LedOff => CommandAction::SetIndicator(false),
            Command::Reset => CommandAction::RequestRestart,
            Command::Calibrate => CommandAction::RequestCalibration,
        }
    }
}

/// Map an optional token to an action. Anything unrecognized is a no-op.
pub fn dispatch_token(token: Option<&str>) -> CommandAction {
    token
        .and_then(Command::parse)
        .map(Command::action)
        .unwrap_or(CommandAction::Noop)
}
