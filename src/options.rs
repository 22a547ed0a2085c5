use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(long, help = "RPC host of the Bitcoin Core node.")]
  pub(crate) host: Option<String>,
  #[arg(long, help = "RPC port of the Bitcoin Core node.")]
  pub(crate) port: Option<u16>,
  #[arg(long, value_enum, help = "Operate on <CHAIN>.")]
  pub(crate) chain: Option<Chain>,
  #[arg(long, help = "Use the node wallet named <WALLET_NAME>.")]
  pub(crate) wallet_name: Option<String>,
  #[arg(long, help = "Passphrase of the node wallet.")]
  pub(crate) wallet_pass: Option<String>,
  #[arg(long, help = "Authenticate to the node with <RPC_USER>.")]
  pub(crate) rpc_user: Option<String>,
  #[arg(long, help = "Authenticate to the node with <RPC_PASS>.")]
  pub(crate) rpc_pass: Option<String>,
  #[arg(
    long,
    help = "Derive the wallet address from <PRIVATE_KEY>, as `wpkh(<PRIVATE_KEY>)`."
  )]
  pub(crate) private_key: Option<String>,
  #[arg(long, help = "Also connect to the Electrum indexer at <INDEXER_URL>.")]
  pub(crate) indexer_url: Option<String>,
  #[arg(long, help = "Connect to the node over plain HTTP.")]
  pub(crate) disable_tls: bool,
}
