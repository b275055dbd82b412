// Crate error type. Every variant states *where* things went wrong.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Opening the X display failed (no DISPLAY, no server, bad auth).
    #[error("Display open error: {0}")]
    DisplayOpen(#[from] x11rb::errors::ConnectError),

    /// The connection broke while sending a request.
    #[error("X11 connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    /// A request was sent but the server answered with an error.
    #[error("X11 reply error: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    /// Allocating an X resource id (graphics context) failed.
    #[error("X11 resource id error: {0}")]
    ResourceId(#[from] x11rb::errors::ReplyOrIdError),

    /// The server lacks an extension we need (XTEST).
    #[error("X11 extension missing: {0}")]
    MissingExtension(&'static str),

    /// The raw pointer device could not be opened.
    #[error("Input device error ({path}): {source}")]
    InputDevice {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Creating the preview window failed.
    #[error("Preview window init error: {0}")]
    PreviewInit(String),

    /// Pushing a frame to the preview window failed.
    #[error("Preview window update error: {0}")]
    PreviewUpdate(String),

    /// The settings file exists but could not be read.
    #[error("Config read error ({path}): {source}")]
    Config {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
