//! Command dispatch: maps a Git credential-helper verb to its handler.
//!
//! Dispatch proceeds `Idle → Parsed → ProviderResolved → Executed`: the credential
//! query is read from standard input, a provider is resolved from the registry,
//! the storage key is derived, and the verb handler runs against the credential
//! store and/or the provider. All fatal errors funnel to the single top-level
//! boundary here, which renders them and sets the non-zero outcome.

// std
use std::io::{BufRead, Write};
// self
use crate::{
	_prelude::*,
	credential::Credential,
	error::{InputError, write_fatal_chain},
	input::InputArguments,
	provider::HostProviderRegistry,
	store::CredentialStore,
};

/// Human-readable program header traced and printed by `version`.
pub fn program_header() -> String {
	format!("Git Credential Broker (version {})", env!("CARGO_PKG_VERSION"))
}

fn print_usage(out: &mut dyn Write) {
	let _ = writeln!(out, "usage: git credential-broker <get|store|erase|version|help>");
	let _ = writeln!(out);
	let _ = writeln!(out, "  get      return a stored or freshly generated credential");
	let _ = writeln!(out, "  store    persist the credential supplied by Git");
	let _ = writeln!(out, "  erase    remove the credential for the queried remote");
	let _ = writeln!(out, "  version  print the application version");
	let _ = writeln!(out, "  help     print this message");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verb {
	Get,
	Store,
	Erase,
}

/// The credential helper application: a provider registry plus a credential store.
pub struct Application {
	registry: HostProviderRegistry,
	store: Arc<dyn CredentialStore>,
}
impl Application {
	/// Assembles the application from its collaborators.
	pub fn new(registry: HostProviderRegistry, store: Arc<dyn CredentialStore>) -> Self {
		Self { registry, store }
	}

	/// Dispatches `args`, returning the process exit code.
	///
	/// `0` on success; `-1` on any dispatch failure, missing verb, or
	/// unrecognized verb.
	pub async fn run(
		&self,
		args: &[String],
		stdin: &mut dyn BufRead,
		stdout: &mut dyn Write,
		stderr: &mut dyn Write,
	) -> i32 {
		tracing::debug!(header = %program_header(), ?args, "invoked");

		let Some(verb) = args.first() else {
			let _ = writeln!(stderr, "Missing command.");

			print_usage(stderr);

			return -1;
		};

		// First matching verb in the registered list wins.
		let verb = match verb.to_ascii_lowercase().as_str() {
			"get" => Verb::Get,
			"store" => Verb::Store,
			"erase" => Verb::Erase,
			"version" => {
				let _ = writeln!(stdout, "{}", program_header());

				return 0;
			},
			"help" => {
				print_usage(stdout);

				return 0;
			},
			other => {
				let _ = writeln!(stderr, "Unrecognized command '{other}'.");

				print_usage(stderr);

				return -1;
			},
		};

		match self.execute(verb, stdin, stdout).await {
			Ok(()) => 0,
			Err(e) => {
				write_fatal_chain(stderr, &e);

				-1
			},
		}
	}

	/// Common preamble shared by the provider verbs, then the verb body.
	async fn execute(
		&self,
		verb: Verb,
		stdin: &mut dyn BufRead,
		stdout: &mut dyn Write,
	) -> Result<()> {
		let input = InputArguments::from_reader(stdin).map_err(Error::Input)?;

		tracing::debug!("detecting host provider for input:");

		for (key, value) in input.iter() {
			let value = if key == "password" { "<redacted>" } else { value };

			tracing::debug!("  {key}={value}");
		}

		let provider = self.registry.get_provider(&input)?;

		tracing::debug!(provider = provider.name(), "host provider selected");

		let key = format!("git:{}", provider.credential_key(&input)?);

		tracing::debug!(%key, "credential key derived");

		match verb {
			Verb::Get => {
				let credential = match self.store.get(&key)? {
					Some(credential) => {
						tracing::debug!(%key, "credential found in store");

						credential
					},
					// A freshly generated credential is not persisted here; Git
					// confirms success through a later `store` callback (except
					// where the provider's own flow opts to persist early).
					None => provider.generate(&input).await?,
				};

				writeln!(stdout, "username={}", credential.account)
					.and_then(|()| writeln!(stdout, "password={}", credential.expose_secret()))
					.and_then(|()| stdout.flush())
					.map_err(|e| Error::Input(InputError::Io(e)))?;
			},
			Verb::Store => {
				let username = input
					.username()
					.ok_or(InputError::MissingAttribute { attribute: "username" })?;
				let password = input
					.password()
					.ok_or(InputError::MissingAttribute { attribute: "password" })?;

				self.store.add_or_update(&key, &Credential::new(username, password))?;
			},
			Verb::Erase => {
				// Removing a non-existent key is a no-op, not an error.
				self.store.remove(&key)?;
			},
		}

		Ok(())
	}

	/// Tears down every registered provider; called once at process exit.
	pub fn dispose(&mut self) {
		if let Err(e) = self.registry.dispose() {
			tracing::warn!(error = %e, "provider teardown reported a failure");
		}
	}
}
