//! Account/secret credential pair with log-safe formatting.

// self
use crate::_prelude::*;

/// A Git credential: an account name paired with a secret.
///
/// The secret is redacted from `Debug` and `Display` output so credentials can be
/// traced safely. Ownership transfers to the credential store on persist.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Account (username) half of the pair.
	pub account: String,
	secret: String,
}
impl Credential {
	/// Builds a credential from an account and its secret.
	pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { account: account.into(), secret: secret.into() }
	}

	/// Returns the secret. Callers must avoid logging this string.
	pub fn expose_secret(&self) -> &str {
		&self.secret
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("account", &self.account)
			.field("secret", &"<redacted>")
			.finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:<redacted>", self.account)
	}
}
