//! `hexvote chat`: talk to the bot on stdin.

use std::io::{self, BufRead, Write};

use hexvote_core::{Gateway, UserId};

use super::{make_gateway, parse_line};

pub fn run(user: Option<i64>, admin: i64, allow: Option<&str>, config_path: Option<&str>) {
    let mut gateway = make_gateway(admin, allow, config_path);
    let default_user = user.unwrap_or(admin);

    println!("🔮 hexvote chat: speaking as user {default_user}. Ctrl-D to quit.");
    println!("   Send a token, then 0 or 1. Commands: /start /menu /stats /list /add /remove");
    println!("   Prefix a line with @<id> to speak as another user.");

    let stdin = io::stdin();
    if let Err(e) = session(&mut gateway, default_user, stdin.lock(), &mut io::stdout()) {
        eprintln!("Error: {e}");
    }

    println!();
    println!(
        "Session over: {} results recorded, {} rules mined.",
        gateway.engine().history().len(),
        gateway.engine().rules().len()
    );
}

/// Prompt, read and answer until end of input. Stops at the first I/O error.
fn session(
    gateway: &mut Gateway,
    default_user: UserId,
    mut input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    loop {
        write!(out, "> ")?;
        out.flush()
            .map_err(|e| io::Error::new(e.kind(), format!("flushing prompt: {e}")))?;

        let mut line = String::new();
        if input
            .read_line(&mut line)
            .map_err(|e| io::Error::new(e.kind(), format!("reading stdin: {e}")))?
            == 0
        {
            return Ok(());
        }

        let (speaker, text) = match parse_line(&line, default_user) {
            None => continue,
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                writeln!(out, "❌ {e}")?;
                continue;
            }
        };

        match gateway.handle_message(speaker, text) {
            Ok(reply) => writeln!(out, "{}", reply.render())?,
            Err(e) => writeln!(out, "❌ {e}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexvote_core::{EngineConfig, GatewayConfig};

    fn gateway() -> Gateway {
        Gateway::new(EngineConfig::default(), &GatewayConfig::new(1))
    }

    /// Accepts writes but refuses to flush.
    struct NoFlush(Vec<u8>);

    impl Write for NoFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_session_answers_each_line() {
        let mut gw = gateway();
        let input = "00000000000000000000000000000000\n\n0\n@7 1\n";
        let mut out = Vec::new();
        session(&mut gw, 1, input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("👉 Prediction: Low"));
        assert!(text.contains("✅ Recorded result: Low"));
        assert!(text.contains("❌ user 7 is not authorized"));
        assert_eq!(gw.engine().history().len(), 1);
    }

    #[test]
    fn test_session_stops_when_flush_fails() {
        let mut gw = gateway();
        let mut out = NoFlush(Vec::new());
        let err = session(&mut gw, 1, "00000000000000000000000000000000\n".as_bytes(), &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // Nothing was read past the failed prompt
        assert_eq!(gw.engine().pending_token(1), None);
    }
}
