use super::*;

pub(crate) const COMMIT_FEE_RATE: FeeRate = FeeRate::from_sat_per_vb(3);
pub(crate) const REVEAL_FEE_RATE: FeeRate = FeeRate::from_sat_per_vb(2);
pub(crate) const UTXO_THRESHOLD: Amount = Amount::from_sat(5_000);
pub(crate) const CONSOLIDATION_FEE: Amount = Amount::from_sat(1_000);
pub(crate) const CONTENT_TYPE: &str = "application/octet-stream";

/// Embeds opaque payloads in the chain and recovers them. One instance owns
/// its node connection and optional indexer connection; callers drive it
/// serially and own all retry policy.
pub struct Sealer {
  pub(crate) indexer: Option<Indexer>,
  pub(crate) wallet: Wallet,
}

impl Sealer {
  pub fn new(settings: Settings) -> Result<Self, Error> {
    let wallet = Wallet::new(&settings)?;

    let indexer = settings.indexer_url().map(Indexer::connect).transpose()?;

    Ok(Self { indexer, wallet })
  }

  /// Embeds `payload` in a commit/reveal transaction pair and returns the
  /// reveal txid once both are in the node mempool.
  pub fn inscribe(&self, payload: &[u8]) -> Result<Txid, Error> {
    Ok(self.inscribe_payload(payload)?.reveals[0])
  }

  pub(crate) fn inscribe_payload(&self, payload: &[u8]) -> Result<Inscribed, Error> {
    let utxo = self
      .wallet
      .select_utxo(UTXO_THRESHOLD, CONSOLIDATION_FEE)?;

    log::info!(
      "inscribing {} byte payload funded by {}",
      payload.len(),
      utxo.outpoint,
    );

    let plan = Plan {
      commit_fee_rate: COMMIT_FEE_RATE,
      reveal_fee_rate: REVEAL_FEE_RATE,
      inscriptions: vec![Inscription::new(
        CONTENT_TYPE,
        payload.to_vec(),
        self.wallet.address().clone(),
      )],
      mode: Mode::SingleReveal,
      postage: TARGET_POSTAGE,
    };

    let inscribed = plan.inscribe(&self.wallet, &[utxo])?;

    log::info!(
      "inscribed {} paying {} in fees",
      inscribed.inscriptions[0],
      inscribed.total_fees,
    );

    Ok(inscribed)
  }

  /// Recovers the payload embedded in the transaction with `txid` and logs
  /// it.
  pub fn decode_inscription(&self, txid: Txid) -> Result<Vec<u8>, Error> {
    let transaction = self.transaction(txid)?;

    let payload = envelope::payload(&transaction)?;

    log::info!(
      "decoded {} byte payload from {txid}: {}",
      payload.len(),
      hex::encode(&payload),
    );

    Ok(payload)
  }

  /// Fetches a raw transaction, preferring the indexer when one is
  /// configured.
  fn transaction(&self, txid: Txid) -> Result<Transaction, Error> {
    if let Some(indexer) = &self.indexer {
      let hex = indexer.transaction(&txid)?;

      let bytes = hex::decode(&hex).map_err(|err| {
        error::Rpc {
          message: format!("indexer returned undecodable transaction {txid}: {err}"),
        }
        .build()
      })?;

      consensus::encode::deserialize(&bytes).map_err(|err| {
        error::Rpc {
          message: format!("indexer returned undecodable transaction {txid}: {err}"),
        }
        .build()
      })
    } else {
      self.wallet.node().transaction(&txid)
    }
  }

  /// Closes the indexer connection and stops its keep-alive. The node
  /// connection needs no explicit teardown.
  pub fn shutdown(self) {
    if let Some(indexer) = self.indexer {
      indexer.shutdown();
    }
  }
}
