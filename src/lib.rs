#![allow(clippy::too_many_arguments, clippy::result_large_err)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    fee_rate::FeeRate,
    indexer::Indexer,
    inscription::Inscription,
    node_client::{NodeClient, Utxo},
    plan::{Inscribed, Mode, Plan},
    subcommand::Subcommand,
    wallet::Wallet,
  },
  anyhow::{bail, Context},
  bitcoin::{
    address::NetworkUnchecked,
    blockdata::constants::MAX_SCRIPT_ELEMENT_SIZE,
    consensus, opcodes,
    script::{self, ScriptBuf},
    Address, Amount, Network, OutPoint, Script, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
  },
  clap::Parser,
  serde::{Deserialize, Serialize},
  std::{
    cmp,
    collections::BTreeMap,
    env,
    fmt::{self, Display, Formatter},
    fs, io,
    path::PathBuf,
    process,
    str::FromStr,
    thread,
    time::Duration,
  },
};

pub use crate::{
  arguments::Arguments, chain::Chain, error::Error, inscription_id::InscriptionId,
  options::Options, sealer::Sealer, settings::Settings,
};

#[cfg(test)]
use self::test::*;


mod arguments;
mod chain;
mod envelope;
mod error;
mod fee_rate;
mod indexer;
mod inscription;
mod inscription_id;
mod node_client;
mod options;
mod plan;
mod sealer;
mod settings;
pub mod subcommand;
mod wallet;

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

const SCHNORR_SIGNATURE_SIZE: usize = 64;

pub(crate) const DUST: Amount = Amount::from_sat(546);
pub(crate) const MIN_CONSOLIDATION_INPUTS: usize = 10;
pub(crate) const MAX_CONSOLIDATION_INPUTS: usize = 100;
pub(crate) const TARGET_POSTAGE: Amount = Amount::from_sat(546);

pub fn main() {
  env_logger::init();

  if let Err(err) = Arguments::parse().run() {
    eprintln!("error: {err}");
    err
      .chain()
      .skip(1)
      .for_each(|cause| eprintln!("because: {cause}"));
    if env::var_os("RUST_BACKTRACE")
      .map(|val| val == "1")
      .unwrap_or_default()
    {
      eprintln!("{}", err.backtrace());
    }
    process::exit(1);
  }
}
