//! Login flow states.
//!
//! `Start → Pending → {Session, Error}`, plus `Gone` for retired endpoints.
//! `Error` and `Gone` are absorbing: no event moves a flow out of them, and
//! the only redirect they can produce points at the error surface.

use std::fmt;

/// Path of the login entry point.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path of the IdP callback.
pub const CALLBACK_PATH: &str = "/auth/callback";
/// Path of the terminal error surface.
pub const AUTH_ERROR_PATH: &str = "/auth-error";

/// Reason code carried to the error surface in `?e=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    InvalidState,
    CallbackError,
    AccessDenied,
    Unauthorized,
    Unknown,
}

impl ErrorReason {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidState => "invalid_state",
            Self::CallbackError => "callback_error",
            Self::AccessDenied => "access_denied",
            Self::Unauthorized => "unauthorized",
            Self::Unknown => "unknown",
        }
    }

    /// Unrecognised codes map to [`ErrorReason::Unknown`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "invalid_state" => Self::InvalidState,
            "callback_error" => Self::CallbackError,
            "access_denied" => Self::AccessDenied,
            "unauthorized" => Self::Unauthorized,
            _ => Self::Unknown,
        }
    }

    /// Human-readable explanation shown on the error surface.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidState => {
                "Your login session expired or was interrupted. This can happen if you took \
                 too long to complete login, or if you opened multiple login windows."
            }
            Self::CallbackError => {
                "There was an error completing your login. This may be a temporary issue."
            }
            Self::AccessDenied => {
                "Access to the application was denied. Please contact your administrator \
                 if you believe this is an error."
            }
            Self::Unauthorized => "You are not authorized to access this application.",
            Self::Unknown => "An unexpected error occurred during login.",
        }
    }

    /// Redirect target for this failure. Always the error surface.
    #[must_use]
    pub fn location(self) -> String {
        format!("{AUTH_ERROR_PATH}?e={}", self.code())
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Start,
    Pending,
    Session,
    Error(ErrorReason),
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    BeginLogin,
    Exchanged,
    Rejected(ErrorReason),
    Retired,
}

impl FlowState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error(_) | Self::Gone)
    }

    #[must_use]
    pub fn on(self, event: FlowEvent) -> Self {
        match (self, event) {
            (state, _) if state.is_terminal() => state,
            (_, FlowEvent::Retired) => Self::Gone,
            (Self::Start | Self::Session, FlowEvent::BeginLogin) => Self::Pending,
            (Self::Pending, FlowEvent::BeginLogin) => Self::Pending,
            (Self::Pending, FlowEvent::Exchanged) => Self::Session,
            (Self::Pending, FlowEvent::Rejected(reason)) => Self::Error(reason),
            // A callback with nothing pending is an invalid callback.
            (Self::Start | Self::Session, FlowEvent::Exchanged | FlowEvent::Rejected(_)) => {
                Self::Error(ErrorReason::InvalidState)
            }
            (Self::Error(_) | Self::Gone, _) => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_REASONS: [ErrorReason; 5] = [
        ErrorReason::InvalidState,
        ErrorReason::CallbackError,
        ErrorReason::AccessDenied,
        ErrorReason::Unauthorized,
        ErrorReason::Unknown,
    ];

    fn all_events() -> Vec<FlowEvent> {
        let mut events = vec![FlowEvent::BeginLogin, FlowEvent::Exchanged, FlowEvent::Retired];
        events.extend(ALL_REASONS.iter().map(|r| FlowEvent::Rejected(*r)));
        events
    }

    #[test]
    fn happy_path() {
        let state = FlowState::Start
            .on(FlowEvent::BeginLogin)
            .on(FlowEvent::Exchanged);
        assert_eq!(state, FlowState::Session);
    }

    #[test]
    fn rejection_is_terminal() {
        let state = FlowState::Start
            .on(FlowEvent::BeginLogin)
            .on(FlowEvent::Rejected(ErrorReason::CallbackError));
        assert_eq!(state, FlowState::Error(ErrorReason::CallbackError));
    }

    #[test]
    fn terminal_states_absorb_every_event() {
        let terminals = ALL_REASONS
            .iter()
            .map(|r| FlowState::Error(*r))
            .chain(std::iter::once(FlowState::Gone));
        for terminal in terminals {
            for event in all_events() {
                assert_eq!(terminal.on(event), terminal, "{terminal:?} on {event:?}");
            }
        }
    }

    #[test]
    fn callback_without_pending_is_invalid_state() {
        assert_eq!(
            FlowState::Start.on(FlowEvent::Exchanged),
            FlowState::Error(ErrorReason::InvalidState)
        );
    }

    #[test]
    fn error_locations_never_point_at_login() {
        for reason in ALL_REASONS {
            let location = reason.location();
            assert!(location.starts_with(AUTH_ERROR_PATH));
            assert!(!location.contains(LOGIN_PATH));
        }
    }

    #[test]
    fn reason_codes_round_trip_and_unknown_fallback() {
        for reason in ALL_REASONS {
            assert_eq!(ErrorReason::from_code(reason.code()), reason);
        }
        assert_eq!(ErrorReason::from_code("test"), ErrorReason::Unknown);
        assert_eq!(ErrorReason::from_code(""), ErrorReason::Unknown);
    }
}
