//! Command Handler
//!
//! Turns decoded requests into calls on the [`Store`] and encodes the outcome
//! as a RESP reply.
//!
//! ## Supported Commands
//!
//! - `SET key value [EX <n><S|M|H|D>] [NX|XX]` - Set a key, optionally with
//!   expiry and a reject-if-exists guard
//! - `GET key` - Get a key's scalar value
//! - `QPUSH key value [value ...]` - Append values to a key's queue
//! - `QPOP key` - Remove and return the head of a key's queue
//! - `GETALL` - Every key with its display value
//! - `PING [message]`, `ECHO message`, `QUIT`
//!
//! ## Error Replies
//!
//! | Outcome | Reply |
//! |---------|-------|
//! | key not found / expired | null bulk string |
//! | queue missing or empty  | null bulk string |
//! | invalid expiry          | `-ERR invalid expiry time` |
//! | guarded write conflict  | `-ERR key already exists: <key>` |
//! | bad arguments           | `-ERR <reason>` |

use crate::commands::args::{non_empty_key, parse_set_options, CommandError};
use crate::protocol::RespValue;
use crate::storage::{Store, StoreError};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Executes commands against a shared store.
#[derive(Clone)]
pub struct CommandHandler {
    store: Arc<Store>,
}

impl CommandHandler {
    /// Creates a new command handler with the given store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Returns the store this handler executes against.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Executes one request and returns the reply.
    ///
    /// `args[0]` is the command name (case-insensitive), the rest are its
    /// arguments. An empty request yields an error reply.
    pub fn execute(&self, args: Vec<Bytes>) -> RespValue {
        let args = match decode_args(args) {
            Ok(args) if !args.is_empty() => args,
            Ok(_) => return RespValue::error("ERR empty command"),
            Err(e) => return command_error(e),
        };

        let name = args[0].to_ascii_uppercase();
        trace!(command = %name, argc = args.len() - 1, "execute");

        match self.dispatch(&name, &args[1..]) {
            Ok(reply) => reply,
            Err(e) => command_error(e),
        }
    }

    fn dispatch(&self, cmd: &str, args: &[String]) -> Result<RespValue, CommandError> {
        match cmd {
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "QPUSH" => self.cmd_qpush(args),
            "QPOP" => self.cmd_qpop(args),
            "GETALL" => self.cmd_getall(args),
            "PING" => cmd_ping(args),
            "ECHO" => cmd_echo(args),
            "QUIT" => Ok(RespValue::ok()),
            _ => Err(CommandError::UnknownCommand(cmd.to_string())),
        }
    }

    /// SET key value [EX <expiry>] [NX|XX]
    fn cmd_set(&self, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, value, options @ ..] = args else {
            return Err(CommandError::WrongArity("set"));
        };
        let key = non_empty_key(key)?;
        let options = parse_set_options(options, Instant::now())?;

        Ok(match self.store.set(key, value.as_str(), options) {
            Ok(()) => RespValue::ok(),
            Err(e) => store_error(e),
        })
    }

    /// GET key
    fn cmd_get(&self, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("get"));
        };

        Ok(match self.store.get(non_empty_key(key)?) {
            Ok(value) => RespValue::bulk_string(value),
            Err(e) => store_error(e),
        })
    }

    /// QPUSH key value [value ...]
    fn cmd_qpush(&self, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, values @ ..] = args else {
            return Err(CommandError::WrongArity("qpush"));
        };
        if values.is_empty() {
            return Err(CommandError::WrongArity("qpush"));
        }

        let len = self.store.push(non_empty_key(key)?, values.iter().cloned());
        Ok(RespValue::integer(len as i64))
    }

    /// QPOP key
    fn cmd_qpop(&self, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("qpop"));
        };

        Ok(match self.store.pop(non_empty_key(key)?) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        })
    }

    /// GETALL
    ///
    /// Replies with a flat `key, value, key, value, ...` array sorted by key.
    fn cmd_getall(&self, args: &[String]) -> Result<RespValue, CommandError> {
        if !args.is_empty() {
            return Err(CommandError::WrongArity("getall"));
        }

        let mut all: Vec<_> = self.store.get_all().into_iter().collect();
        all.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let items = all
            .into_iter()
            .flat_map(|(key, value)| [RespValue::bulk_string(key), RespValue::bulk_string(value)])
            .collect();
        Ok(RespValue::array(items))
    }
}

/// PING [message]
fn cmd_ping(args: &[String]) -> Result<RespValue, CommandError> {
    match args {
        [] => Ok(RespValue::pong()),
        [message] => Ok(RespValue::bulk_string(message.clone())),
        _ => Err(CommandError::WrongArity("ping")),
    }
}

/// ECHO message
fn cmd_echo(args: &[String]) -> Result<RespValue, CommandError> {
    match args {
        [message] => Ok(RespValue::bulk_string(message.clone())),
        _ => Err(CommandError::WrongArity("echo")),
    }
}

fn decode_args(args: Vec<Bytes>) -> Result<Vec<String>, CommandError> {
    args.into_iter()
        .map(|arg| String::from_utf8(arg.to_vec()).map_err(|_| CommandError::InvalidUtf8))
        .collect()
}

fn command_error(e: CommandError) -> RespValue {
    RespValue::error(format!("ERR {}", e))
}

fn store_error(e: StoreError) -> RespValue {
    match e {
        StoreError::NotFound(_) => RespValue::null(),
        e => RespValue::error(format!("ERR {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Store::new()))
    }

    fn run(handler: &CommandHandler, line: &str) -> RespValue {
        let args = line
            .split_whitespace()
            .map(|s| Bytes::from(s.to_string()))
            .collect();
        handler.execute(args)
    }

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.to_string())
    }

    #[test]
    fn test_ping_echo() {
        let h = handler();
        assert_eq!(run(&h, "PING"), RespValue::pong());
        assert_eq!(run(&h, "ping hello"), bulk("hello"));
        assert_eq!(run(&h, "ECHO hi"), bulk("hi"));
        assert!(run(&h, "ECHO").is_error());
    }

    #[test]
    fn test_set_get() {
        let h = handler();
        assert_eq!(run(&h, "SET name Ariz"), RespValue::ok());
        assert_eq!(run(&h, "GET name"), bulk("Ariz"));
        assert_eq!(run(&h, "get missing"), RespValue::null());
    }

    #[test]
    fn test_set_guard_conflict() {
        let h = handler();
        run(&h, "SET k v1");
        assert_eq!(
            run(&h, "SET k v2 NX"),
            RespValue::error("ERR key already exists: k")
        );
        assert_eq!(
            run(&h, "SET k v2 XX"),
            RespValue::error("ERR key already exists: k")
        );
        assert_eq!(run(&h, "GET k"), bulk("v1"));

        assert_eq!(run(&h, "SET fresh v NX"), RespValue::ok());
    }

    #[test]
    fn test_set_with_expiry() {
        let h = handler();
        assert_eq!(run(&h, "SET k v EX 10s"), RespValue::ok());
        assert_eq!(run(&h, "GET k"), bulk("v"));

        let entry_expiry = h.store().data.read()["k"].expires_at.unwrap();
        let remaining = entry_expiry.saturating_duration_since(Instant::now());
        assert!(remaining > Duration::from_secs(8) && remaining <= Duration::from_secs(10));
    }

    #[test]
    fn test_set_expiry_errors() {
        let h = handler();
        assert_eq!(
            run(&h, "SET k v EX 0s"),
            RespValue::error("ERR invalid expiry time")
        );
        assert_eq!(
            run(&h, "SET k v EX -5m"),
            RespValue::error("ERR invalid expiry time")
        );
        assert_eq!(
            run(&h, "SET k v EX 5y"),
            RespValue::error("ERR invalid expiry unit: 5y")
        );
        assert_eq!(run(&h, "SET k v EX"), RespValue::error("ERR syntax error"));
        assert_eq!(run(&h, "SET k v PX 5"), RespValue::error("ERR syntax error"));
        assert_eq!(run(&h, "GET k"), RespValue::null());
    }

    #[test]
    fn test_queue_commands() {
        let h = handler();
        assert_eq!(run(&h, "QPUSH q x y"), RespValue::integer(2));
        assert_eq!(run(&h, "QPUSH q z"), RespValue::integer(3));
        assert_eq!(run(&h, "QPOP q"), bulk("x"));
        assert_eq!(run(&h, "QPOP q"), bulk("y"));
        assert_eq!(run(&h, "QPOP q"), bulk("z"));
        assert_eq!(run(&h, "QPOP q"), RespValue::null());
        assert_eq!(run(&h, "QPOP never"), RespValue::null());
    }

    #[test]
    fn test_getall() {
        let h = handler();
        assert_eq!(run(&h, "GETALL"), RespValue::array(vec![]));

        run(&h, "QPUSH q a b");
        run(&h, "SET s hello");
        assert_eq!(
            run(&h, "GETALL"),
            RespValue::array(vec![bulk("q"), bulk("a, b"), bulk("s"), bulk("hello")])
        );
    }

    #[test]
    fn test_arity_errors() {
        let h = handler();
        assert_eq!(
            run(&h, "SET k"),
            RespValue::error("ERR wrong number of arguments for 'set' command")
        );
        assert_eq!(
            run(&h, "GET a b"),
            RespValue::error("ERR wrong number of arguments for 'get' command")
        );
        assert_eq!(
            run(&h, "QPUSH q"),
            RespValue::error("ERR wrong number of arguments for 'qpush' command")
        );
        assert!(run(&h, "QPOP").is_error());
        assert!(run(&h, "GETALL extra").is_error());
    }

    #[test]
    fn test_unknown_and_empty() {
        let h = handler();
        assert_eq!(
            run(&h, "LPUSH q a"),
            RespValue::error("ERR unknown command 'LPUSH'")
        );
        assert_eq!(h.execute(vec![]), RespValue::error("ERR empty command"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let h = handler();
        let reply = h.execute(vec![Bytes::from("SET"), Bytes::new(), Bytes::from("v")]);
        assert_eq!(reply, RespValue::error("ERR empty key"));
        let reply = h.execute(vec![Bytes::from("QPUSH"), Bytes::new(), Bytes::from("v")]);
        assert_eq!(reply, RespValue::error("ERR empty key"));
        assert!(h.store().is_empty());
    }

    #[test]
    fn test_invalid_utf8_argument() {
        let h = handler();
        let reply = h.execute(vec![Bytes::from("GET"), Bytes::from(&b"\xff\xfe"[..])]);
        assert_eq!(reply, RespValue::error("ERR invalid UTF-8 in argument"));
    }
}
