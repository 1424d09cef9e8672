//! Authentication-mode model and the interactive prompt contract.

pub mod terminal;

pub use terminal::TerminalPrompt;

// std
use std::ops::{BitOr, BitOrAssign};
// self
use crate::{_prelude::*, credential::Credential};

/// Boxed future returned by [`AuthenticationPrompt`] implementations.
pub type PromptFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PromptError>> + 'a + Send>>;

/// Bitset describing which authentication modes a remote instance accepts.
///
/// The set is recomputed on every invocation; it is never persisted. An explicit
/// configuration override can replace the detected value wholesale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationModes(u8);
impl AuthenticationModes {
	/// Empty set; no authentication possible.
	pub const NONE: Self = Self(0);
	/// Username/password (or password-equivalent token) authentication.
	pub const BASIC: Self = Self(1);
	/// OAuth bearer-token authentication.
	pub const OAUTH: Self = Self(1 << 1);

	/// Whether every mode in `other` is present in `self`.
	pub fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Whether the set is empty.
	pub fn is_none(self) -> bool {
		self.0 == 0
	}
}
impl BitOr for AuthenticationModes {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}
impl BitOrAssign for AuthenticationModes {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}
impl Display for AuthenticationModes {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.is_none() {
			return f.write_str("none");
		}

		let mut names = Vec::new();

		if self.contains(Self::BASIC) {
			names.push("basic");
		}
		if self.contains(Self::OAUTH) {
			names.push("oauth");
		}

		f.write_str(&names.join(","))
	}
}
impl FromStr for AuthenticationModes {
	type Err = ParseAuthenticationModesError;

	/// Parses a comma/whitespace separated, case-insensitive mode list.
	///
	/// `"none"` contributes nothing; the result may therefore be empty, which
	/// callers treat the same as a malformed override.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut modes = Self::NONE;

		for token in s.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
			match token.to_ascii_lowercase().as_str() {
				"none" => {},
				"basic" => modes |= Self::BASIC,
				"oauth" => modes |= Self::OAUTH,
				_ => return Err(ParseAuthenticationModesError { token: token.to_owned() }),
			}
		}

		Ok(modes)
	}
}

/// Error produced when an authentication-mode list contains an unknown name.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown authentication mode '{token}'.")]
pub struct ParseAuthenticationModesError {
	/// Token that failed to parse.
	pub token: String,
}

/// Outcome of resolving which authentication mode to use.
///
/// Exactly one variant is produced: a Basic credential pair, or the bare OAuth
/// selection. The two are mutually exclusive by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticationPromptResult {
	/// Basic authentication was selected; carries the captured credential pair.
	Basic(Credential),
	/// OAuth authentication was selected; the token is obtained in a later step.
	OAuth,
}

/// Channel over which a two-factor one-time code is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TwoFactorChannel {
	/// Authenticator-app generated code.
	App,
	/// Code delivered via SMS.
	Sms,
}

/// Bearer token returned by the OAuth step of the prompt contract.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthToken {
	/// Access token granted for the requested scopes.
	pub access_token: String,
}
impl Debug for OAuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthToken").field("access_token", &"<redacted>").finish()
	}
}

/// Failures raised by an [`AuthenticationPrompt`] implementation.
#[derive(Debug, ThisError)]
pub enum PromptError {
	/// Prompting is disabled (`GIT_TERMINAL_PROMPT=0`) or no terminal is attached.
	#[error("Cannot prompt because terminal prompts have been disabled.")]
	NonInteractive,
	/// The user or the authorization server declined the flow.
	#[error("Authentication was not completed: {reason}.")]
	Declined {
		/// Reason reported by the user or the server.
		reason: String,
	},
	/// The OAuth device flow failed at the transport or protocol level.
	#[error("OAuth authorization failed.")]
	OAuth(#[source] crate::api::ApiError),
	/// Reading from or writing to the terminal failed.
	#[error("Terminal I/O failed.")]
	Io(#[from] std::io::Error),
}

/// Interactive authentication helper driven by the credential-generation flow.
///
/// The UI itself is out of scope for the flow: the contract is "returns exactly
/// one selected mode and, iff Basic was chosen, a credential pair".
pub trait AuthenticationPrompt
where
	Self: Send + Sync,
{
	/// Resolves which of the supported `modes` to use for `target`, capturing a
	/// Basic credential pair when that mode is chosen.
	fn select<'a>(
		&'a self,
		target: &'a Url,
		username: Option<&'a str>,
		modes: AuthenticationModes,
	) -> PromptFuture<'a, AuthenticationPromptResult>;

	/// Obtains a one-time two-factor code delivered over `channel`.
	fn two_factor_code<'a>(
		&'a self,
		target: &'a Url,
		channel: TwoFactorChannel,
	) -> PromptFuture<'a, String>;

	/// Obtains an OAuth access token for `target` covering `scopes`.
	fn oauth_token<'a>(
		&'a self,
		target: &'a Url,
		scopes: &'a [&'a str],
	) -> PromptFuture<'a, OAuthToken>;
}
