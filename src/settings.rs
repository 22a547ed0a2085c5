use {super::*, bitcoincore_rpc::Auth};

/// Validated configuration. Every non-bool option is required; command-line
/// values win over the environment.
#[derive(Debug, Clone)]
pub struct Settings {
  chain: Chain,
  disable_tls: bool,
  host: String,
  indexer_url: Option<String>,
  port: u16,
  private_key: String,
  rpc_pass: String,
  rpc_user: String,
  wallet_name: String,
  wallet_pass: String,
}

impl Settings {
  pub fn new(options: Options, env: BTreeMap<String, String>) -> Result<Self, Error> {
    let chain = match Self::setting(options.chain.map(|chain| chain.to_string()), &env, "CHAIN") {
      Some(chain) => chain.parse::<Chain>()?,
      None => return Self::missing("chain"),
    };

    let port = match Self::setting(options.port.map(|port| port.to_string()), &env, "PORT") {
      Some(port) => port.parse::<u16>().map_err(|err| {
        error::Config {
          message: format!("invalid port `{port}`: {err}"),
        }
        .build()
      })?,
      None => chain.default_rpc_port(),
    };

    Ok(Self {
      chain,
      disable_tls: options.disable_tls || env.contains_key("DISABLE_TLS"),
      host: Self::required(options.host, &env, "HOST", "host")?,
      indexer_url: Self::setting(options.indexer_url, &env, "INDEXER_URL"),
      port,
      private_key: Self::required(options.private_key, &env, "PRIVATE_KEY", "private key")?,
      rpc_pass: Self::required(options.rpc_pass, &env, "RPC_PASS", "rpc password")?,
      rpc_user: Self::required(options.rpc_user, &env, "RPC_USER", "rpc user")?,
      wallet_name: Self::required(options.wallet_name, &env, "WALLET_NAME", "wallet name")?,
      wallet_pass: Self::required(options.wallet_pass, &env, "WALLET_PASS", "wallet passphrase")?,
    })
  }

  fn setting(
    arg_value: Option<String>,
    env: &BTreeMap<String, String>,
    env_key: &str,
  ) -> Option<String> {
    arg_value
      .or_else(|| env.get(env_key).cloned())
      .filter(|value| !value.is_empty())
  }

  fn required(
    arg_value: Option<String>,
    env: &BTreeMap<String, String>,
    env_key: &str,
    name: &str,
  ) -> Result<String, Error> {
    match Self::setting(arg_value, env, env_key) {
      Some(value) => Ok(value),
      None => Self::missing(name),
    }
  }

  fn missing<T>(name: &str) -> Result<T, Error> {
    error::Config {
      message: format!("missing required option `{name}`"),
    }
    .fail()
  }

  pub fn chain(&self) -> Chain {
    self.chain
  }

  pub fn indexer_url(&self) -> Option<&str> {
    self.indexer_url.as_deref()
  }

  pub fn wallet_pass(&self) -> &str {
    &self.wallet_pass
  }

  pub(crate) fn descriptor(&self) -> String {
    format!("wpkh({})", self.private_key)
  }

  pub(crate) fn rpc_url(&self) -> String {
    format!(
      "{}://{}:{}/wallet/{}",
      if self.disable_tls { "http" } else { "https" },
      self.host,
      self.port,
      self.wallet_name,
    )
  }

  pub(crate) fn bitcoin_rpc_client(&self) -> Result<bitcoincore_rpc::Client, Error> {
    let rpc_url = self.rpc_url();

    log::info!("connecting to Bitcoin Core at {rpc_url}");

    bitcoincore_rpc::Client::new(
      &rpc_url,
      Auth::UserPass(self.rpc_user.clone(), self.rpc_pass.clone()),
    )
    .map_err(|err| {
      error::Rpc {
        message: format!("failed to connect to Bitcoin Core at `{rpc_url}`: {err}"),
      }
      .build()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(args: &[&str]) -> Options {
    Options::try_parse_from(std::iter::once(&"bitseal").chain(args.iter()).copied()).unwrap()
  }

  fn complete() -> Vec<&'static str> {
    vec![
      "--host",
      "127.0.0.1",
      "--chain",
      "regtest",
      "--wallet-name",
      "anchor",
      "--wallet-pass",
      "hunter2",
      "--rpc-user",
      "user",
      "--rpc-pass",
      "pass",
      "--private-key",
      "cVt4o7BGAig1UXywgGSmARhxMdzP5qvQsxKkSsc1XEkw3tDTQFpy",
    ]
  }

  #[test]
  fn all_required_options_present() {
    let settings = Settings::new(options(&complete()), BTreeMap::new()).unwrap();

    assert_eq!(settings.chain(), Chain::Regtest);
    assert_eq!(settings.port, 18443);
    assert_eq!(
      settings.descriptor(),
      "wpkh(cVt4o7BGAig1UXywgGSmARhxMdzP5qvQsxKkSsc1XEkw3tDTQFpy)"
    );
  }

  #[test]
  fn each_required_option_is_enforced() {
    for missing in [
      "--host",
      "--chain",
      "--wallet-name",
      "--wallet-pass",
      "--rpc-user",
      "--rpc-pass",
      "--private-key",
    ] {
      let mut args = Vec::new();
      let complete = complete();

      for pair in complete.chunks(2) {
        if pair[0] != missing {
          args.extend_from_slice(pair);
        }
      }

      assert!(
        matches!(
          Settings::new(options(&args), BTreeMap::new()).unwrap_err(),
          Error::Config { .. }
        ),
        "expected missing `{missing}` to fail",
      );
    }
  }

  #[test]
  fn environment_fills_missing_options() {
    let env = [
      ("HOST".to_string(), "10.0.0.1".to_string()),
      ("PORT".to_string(), "8000".to_string()),
    ]
    .into_iter()
    .collect::<BTreeMap<String, String>>();

    let args = complete()
      .chunks(2)
      .filter(|pair| pair[0] != "--host")
      .flatten()
      .copied()
      .collect::<Vec<&str>>();

    let settings = Settings::new(options(&args), env).unwrap();

    assert_eq!(settings.host, "10.0.0.1");
    assert_eq!(settings.port, 8000);
  }

  #[test]
  fn arguments_win_over_environment() {
    let env = [("HOST".to_string(), "10.0.0.1".to_string())]
      .into_iter()
      .collect::<BTreeMap<String, String>>();

    let settings = Settings::new(options(&complete()), env).unwrap();

    assert_eq!(settings.host, "127.0.0.1");
  }

  #[test]
  fn rpc_url_reflects_tls_choice() {
    let settings = Settings::new(options(&complete()), BTreeMap::new()).unwrap();
    assert_eq!(settings.rpc_url(), "https://127.0.0.1:18443/wallet/anchor");

    let mut args = complete();
    args.push("--disable-tls");
    let settings = Settings::new(options(&args), BTreeMap::new()).unwrap();
    assert_eq!(settings.rpc_url(), "http://127.0.0.1:18443/wallet/anchor");
  }
}
