//! Helper-wide error taxonomy shared across commands, providers, and stores.

// self
use crate::_prelude::*;

/// Helper-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical helper error surfaced to the top-level command dispatcher.
///
/// Recoverable conditions (a malformed authentication-mode override, a failed
/// metadata probe) never appear here; they are traced and absorbed inside the
/// provider flow. Everything below is fatal to the current command.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No registered host provider supports the credential query.
	#[error("No host provider available to service this request.")]
	NoProvider,
	/// The query asked for an unencrypted transport the provider refuses to use.
	#[error("Unencrypted HTTP is not supported for {host}. Ensure the repository remote URL is using HTTPS.")]
	InsecureProtocol {
		/// Host named by the credential query.
		host: String,
	},
	/// Interactive authentication did not produce a token.
	#[error("Interactive logon for '{url}' failed.")]
	InteractiveLogonFailed {
		/// Remote the logon was attempted against.
		url: String,
	},
	/// Credential-query input could not be parsed or is missing required fields.
	#[error(transparent)]
	Input(#[from] InputError),
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Remote API failure (token exchange, user-info resolution).
	#[error(transparent)]
	Api(#[from] crate::api::ApiError),
	/// Authentication prompt failure (non-interactive session, declined flow).
	#[error(transparent)]
	Prompt(#[from] crate::auth::PromptError),
}

/// Failures while reading the Git credential-protocol input.
#[derive(Debug, ThisError)]
pub enum InputError {
	/// A line in the credential query is not of the form `key=value`.
	#[error("Invalid credential query input: '{line}'.")]
	MalformedLine {
		/// Offending input line.
		line: String,
	},
	/// A field the command requires was not supplied by Git.
	#[error("Credential query is missing the '{attribute}' attribute.")]
	MissingAttribute {
		/// Name of the absent attribute.
		attribute: &'static str,
	},
	/// The protocol/host/path triple does not form a valid remote URL.
	#[error("Credential query does not describe a valid remote URL.")]
	InvalidRemote(#[from] url::ParseError),
	/// Reading standard input failed.
	#[error("Failed to read the credential query from standard input.")]
	Io(#[from] std::io::Error),
}

/// Writes `err` and every nested cause as `fatal: <message>` lines, innermost last.
pub fn write_fatal_chain(out: &mut dyn std::io::Write, err: &Error) {
	let mut cause: Option<&dyn StdError> = Some(err);

	while let Some(e) = cause {
		// Diagnostics are best effort; a broken stderr pipe must not panic the helper.
		let _ = writeln!(out, "fatal: {e}");

		cause = e.source();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn fatal_chain_prints_innermost_last() {
		let err = Error::Storage(StoreError::Backend { message: "vault sealed".into() });
		let mut buf = Vec::new();

		write_fatal_chain(&mut buf, &err);

		let text = String::from_utf8(buf).unwrap();
		let lines: Vec<_> = text.lines().collect();

		assert!(lines[0].starts_with("fatal: "));
		assert!(lines.last().unwrap().contains("vault sealed"));
	}

	#[test]
	fn insecure_protocol_message_names_the_host() {
		let err = Error::InsecureProtocol { host: "github.com".into() };

		assert!(err.to_string().contains("github.com"));
		assert!(err.to_string().contains("HTTPS"));
	}
}
