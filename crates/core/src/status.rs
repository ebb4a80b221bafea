use thiserror::Error;

/// Outcome of a datalink operation. `Ok(())` is the nominal status.
pub type Status = Result<(), DatalinkError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatalinkError {
    #[error("communication failed")]
    ComFailed,

    #[error("unknown message type")]
    UnknownMessage,

    #[error("network is administratively disabled")]
    FeatureDisabled,

    #[error("no connection to network")]
    NoConnection,

    #[error("callsign already in use")]
    CallsignInUse,

    #[error("station is not an ATC unit")]
    NoAtc,

    #[error("proxy error")]
    ProxyError,

    #[error("mailbox full")]
    MailboxFull,

    #[error("backend error: {0}")]
    Backend(String),
}
