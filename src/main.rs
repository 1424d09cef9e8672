//! Binary entry point for the `git-credential-broker` helper.

// std
use std::{
	env,
	io::{self, BufReader},
	process::ExitCode,
	sync::Arc,
};
// crates.io
use tracing_subscriber::EnvFilter;
// self
#[cfg(not(feature = "native-keyring"))] use git_credential_broker::store::FileStore;
use git_credential_broker::{
	api::RestApi,
	auth::TerminalPrompt,
	commands::Application,
	provider::{GitHubProvider, HostProviderRegistry},
	settings::EnvSettings,
	store::CredentialStore,
};

/// Environment variable that enables diagnostic tracing, e.g. `GCB_TRACE=debug`.
const TRACE_ENV: &str = "GCB_TRACE";

fn init_tracing() {
	let filter = match env::var(TRACE_ENV) {
		Ok(value) if !value.is_empty() =>
			EnvFilter::try_new(&value).unwrap_or_else(|_| EnvFilter::new("debug")),
		_ => EnvFilter::new("off"),
	};

	// Diagnostics share stderr with prompts and fatal output; stdout belongs to Git.
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.without_time()
		.init();
}

fn open_store() -> Result<Arc<dyn CredentialStore>, git_credential_broker::error::Error> {
	#[cfg(feature = "native-keyring")]
	{
		Ok(Arc::new(git_credential_broker::store::KeyringStore))
	}
	#[cfg(not(feature = "native-keyring"))]
	{
		use std::path::PathBuf;

		let path = env::var_os("GCB_STORE_PATH").map(PathBuf::from).unwrap_or_else(|| {
			let home = env::var_os("HOME").map(PathBuf::from).unwrap_or_default();

			home.join(".git-credential-broker").join("store.json")
		});

		Ok(Arc::new(FileStore::open(path)?))
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	init_tracing();

	let store = match open_store() {
		Ok(store) => store,
		Err(e) => {
			eprintln!("fatal: {e}");

			return ExitCode::FAILURE;
		},
	};
	let settings = Arc::new(EnvSettings);
	let http = reqwest::Client::new();
	let mut registry = HostProviderRegistry::default();

	registry.register(Box::new(GitHubProvider::new(
		Arc::new(RestApi::with_client(http.clone())),
		Arc::new(TerminalPrompt::with_client(http)),
		settings,
		store.clone(),
	)));

	let mut app = Application::new(registry, store);
	let args: Vec<String> = env::args().skip(1).collect();
	let code = {
		let stdin = io::stdin();
		let mut reader = BufReader::new(stdin.lock());
		let mut stdout = io::stdout();
		let mut stderr = io::stderr();

		app.run(&args, &mut reader, &mut stdout, &mut stderr).await
	};

	app.dispose();

	if code == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
