use super::emoji;

/// Emoji-prefixed, one-line messages for the user.
///
/// `StdOut` is for regular command output; `StdErr` keeps diagnostics out of
/// stdout so that output meant for pipes (e.g. `proxyflare fetch`) stays clean.
pub trait Message {
    fn message(msg: &str);

    fn info(msg: &str) {
        Self::message(&format!("{} {}", emoji::INFO, msg));
    }

    fn warn(msg: &str) {
        Self::message(&format!("{} {}", emoji::WARN, msg));
    }

    fn success(msg: &str) {
        Self::message(&format!("{} {}", emoji::SPARKLES, msg));
    }

    fn working(msg: &str) {
        Self::message(&format!("{} {}", emoji::SWIRL, msg));
    }
}

pub struct StdOut;

impl Message for StdOut {
    fn message(msg: &str) {
        println!("{}", msg);
    }
}

pub struct StdErr;

impl Message for StdErr {
    fn message(msg: &str) {
        eprintln!("{}", msg);
    }
}
