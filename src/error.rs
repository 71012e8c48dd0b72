use std::env;
use std::fmt::Debug;
use std::io;

/// Crate-wide error. Codes partition failures into the classes the
/// recovery policy cares about:
///
/// - 1..=99    internal (environment, io, decoding)
/// - 100..=199 invalid invocation or input
/// - 200..=299 transient network, recovered by the next scheduled poll
/// - 300..=399 action rejected by the remote service
/// - 400..=499 authentication invalid or expired
/// - 500..=599 geolocation
#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_transient(&self) -> bool {
        (200..=299).contains(&self.code)
    }

    pub fn is_rejection(&self) -> bool {
        (300..=399).contains(&self.code)
    }

    pub fn is_auth(&self) -> bool {
        (400..=499).contains(&self.code)
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        io_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        decode_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transient_error(err)
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn io_error<T: Debug>(_: T) -> Error {
    Error {
        code: 2,
        message: "io error".into(),
    }
}

pub fn decode_error<T: Debug>(_: T) -> Error {
    Error {
        code: 3,
        message: "decode error".into(),
    }
}

pub fn invalid_invocation_error() -> Error {
    Error {
        code: 100,
        message: "invalid invocation".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn transient_error<T: Debug>(_: T) -> Error {
    Error {
        code: 200,
        message: "transient network error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 201,
        message: "upstream error".into(),
    }
}

pub fn action_rejected_error() -> Error {
    Error {
        code: 300,
        message: "action rejected".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: 400,
        message: "unauthorized".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_classify() {
        assert!(transient_error("boom").is_transient());
        assert!(upstream_error().is_transient());
        assert!(action_rejected_error().is_rejection());
        assert!(unauthorized_error().is_auth());
        assert!(!invalid_invocation_error().is_transient());
        assert!(!invalid_invocation_error().is_auth());
    }
}
