//! Error taxonomy for network construction, column generation, and I/O.

use std::fmt;

use crate::lp::SolverError;

/// Errors produced while building the network or running column generation.
#[derive(Debug)]
pub enum Error {
    /// Input tables are malformed or incomplete.
    DataIntegrity(String),
    /// Two consecutive stops of a path have no arc between them.
    MissingArc {
        /// Name of the origin vertex.
        from: String,
        /// Name of the destination vertex.
        to: String,
    },
    /// No column selection satisfies every customer partitioning row.
    InfeasibleMaster(String),
    /// The pricing problem produced no route.
    NoRouteFound(String),
    /// A solver call exhausted its time budget without an incumbent.
    SolverTimeout(String),
    /// The solver backend failed for a reason other than time or feasibility.
    Solver(SolverError),
    /// Reading or writing a file failed.
    Io(std::io::Error),
    /// A JSON or CSV document could not be parsed or written.
    Format(String),
}

impl Error {
    /// Short stable name of the error kind, used in logs and CLI exit messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DataIntegrity(_) => "DataIntegrityError",
            Error::MissingArc { .. } => "MissingArcError",
            Error::InfeasibleMaster(_) => "InfeasibleMasterError",
            Error::NoRouteFound(_) => "NoRouteFoundError",
            Error::SolverTimeout(_) => "SolverTimeoutError",
            Error::Solver(_) => "SolverError",
            Error::Io(_) => "IoError",
            Error::Format(_) => "FormatError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DataIntegrity(msg) => write!(f, "data integrity: {msg}"),
            Error::MissingArc { from, to } => write!(f, "no arc from '{from}' to '{to}'"),
            Error::InfeasibleMaster(msg) => write!(f, "master problem infeasible: {msg}"),
            Error::NoRouteFound(msg) => write!(f, "pricing found no route: {msg}"),
            Error::SolverTimeout(msg) => write!(f, "solver timed out without incumbent: {msg}"),
            Error::Solver(err) => write!(f, "solver failure: {err}"),
            Error::Io(err) => write!(f, "i/o: {err}"),
            Error::Format(msg) => write!(f, "format: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Solver(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SolverError> for Error {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::TimedOut(msg) => Error::SolverTimeout(msg),
            other => Error::Solver(other),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Format(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
