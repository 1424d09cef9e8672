//! Parsed view of a Git credential query.
//!
//! Git hands the helper an ordered series of `key=value` lines on standard input,
//! terminated by a blank line or end-of-stream. Keys are case-sensitive exactly as
//! received; that is Git's own contract and the helper preserves it.

// std
use std::io::BufRead;
// self
use crate::{_prelude::*, error::InputError};

/// Immutable key/value view of a credential query with derived accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputArguments {
	entries: Vec<(String, String)>,
}
impl InputArguments {
	/// Builds the view from pre-parsed entries, preserving order.
	pub fn new(entries: Vec<(String, String)>) -> Self {
		Self { entries }
	}

	/// Reads `key=value` lines from `reader` until a blank line or end-of-stream.
	///
	/// A line without a `=` separator is a fatal parse error. Later occurrences of
	/// a key are kept but shadowed by the first, matching dictionary semantics.
	pub fn from_reader(reader: &mut dyn BufRead) -> Result<Self, InputError> {
		let mut entries = Vec::new();

		loop {
			let mut line = String::new();

			if reader.read_line(&mut line)? == 0 {
				break;
			}

			let line = line.trim_end_matches(['\r', '\n']);

			if line.is_empty() {
				break;
			}

			let Some((key, value)) = line.split_once('=') else {
				return Err(InputError::MalformedLine { line: line.to_owned() });
			};

			entries.push((key.to_owned(), value.to_owned()));
		}

		Ok(Self { entries })
	}

	/// Returns the first value recorded for `key`, case-sensitively.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// `protocol` attribute of the query.
	pub fn protocol(&self) -> Option<&str> {
		self.get("protocol")
	}

	/// `host` attribute of the query, possibly carrying a port.
	pub fn host(&self) -> Option<&str> {
		self.get("host")
	}

	/// `path` attribute of the query.
	pub fn path(&self) -> Option<&str> {
		self.get("path")
	}

	/// `username` attribute of the query.
	pub fn username(&self) -> Option<&str> {
		self.get("username")
	}

	/// `password` attribute of the query (present on `store` callbacks).
	pub fn password(&self) -> Option<&str> {
		self.get("password")
	}

	/// Splits the `host` attribute into a hostname and an optional port.
	pub fn host_and_port(&self) -> Option<(&str, Option<u16>)> {
		let host = self.host()?;

		match host.split_once(':') {
			Some((name, port)) => Some((name, port.parse().ok())),
			None => Some((host, None)),
		}
	}

	/// Builds the absolute remote URL described by protocol/host/path.
	pub fn remote_url(&self) -> Result<Url, InputError> {
		let protocol =
			self.protocol().ok_or(InputError::MissingAttribute { attribute: "protocol" })?;
		let host = self.host().ok_or(InputError::MissingAttribute { attribute: "host" })?;
		let path = self.path().unwrap_or_default();
		let url = format!("{protocol}://{host}/{path}");

		Ok(Url::parse(&url)?)
	}

	/// Iterates the raw entries in input order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}
