use super::*;

/// The single wallet identity every transaction spends to and from: one
/// address derived from the configured private-key descriptor at startup.
impl std::fmt::Debug for Wallet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Wallet")
      .field("address", &self.address)
      .field("chain", &self.chain)
      .finish_non_exhaustive()
  }
}

pub(crate) struct Wallet {
  address: Address,
  chain: Chain,
  node: Box<dyn NodeClient>,
}

impl Wallet {
  pub(crate) fn new(settings: &Settings) -> Result<Self, Error> {
    let node = settings.bitcoin_rpc_client()?;

    Self::with_client(Box::new(node), settings.chain(), &settings.descriptor())
  }

  /// Derives the wallet address from the descriptor. Any failure here is a
  /// configuration error; the instance cannot serve requests without it.
  pub(crate) fn with_client(
    node: Box<dyn NodeClient>,
    chain: Chain,
    descriptor: &str,
  ) -> Result<Self, Error> {
    let checksum = node.descriptor_checksum(descriptor).map_err(|err| {
      error::Config {
        message: format!("failed to check descriptor: {err}"),
      }
      .build()
    })?;

    let address = node
      .derive_addresses(&format!("{descriptor}#{checksum}"))
      .map_err(|err| {
        error::Config {
          message: format!("failed to derive addresses: {err}"),
        }
        .build()
      })?
      .into_iter()
      .next()
      .ok_or_else(|| {
        error::Config {
          message: format!("descriptor `{descriptor}` derived no addresses"),
        }
        .build()
      })?
      .require_network(chain.network())
      .map_err(|err| {
        error::Config {
          message: format!("derived address is not valid for {chain}: {err}"),
        }
        .build()
      })?;

    log::info!("wallet address {address} derived");

    Ok(Self {
      address,
      chain,
      node,
    })
  }

  pub(crate) fn address(&self) -> &Address {
    &self.address
  }

  pub(crate) fn chain(&self) -> Chain {
    self.chain
  }

  pub(crate) fn node(&self) -> &dyn NodeClient {
    self.node.as_ref()
  }

  /// Unspent outputs of the wallet address, largest first. The node's
  /// ordering is unspecified, so the sort is explicit; ties keep node
  /// order.
  fn unspent(&self) -> Result<Vec<Utxo>, Error> {
    let mut utxos = self
      .node
      .unspent(&self.address)?
      .into_iter()
      .filter(|utxo| utxo.spendable)
      .collect::<Vec<Utxo>>();

    utxos.sort_by_key(|utxo| cmp::Reverse(utxo.amount));

    Ok(utxos)
  }

  /// Returns a utxo worth at least `threshold`, consolidating the wallet's
  /// small outputs into one first when no single output qualifies.
  pub(crate) fn select_utxo(
    &self,
    threshold: Amount,
    consolidation_fee: Amount,
  ) -> Result<Utxo, Error> {
    let mut utxos = self.unspent()?;

    let Some(largest) = utxos.first() else {
      return error::NoUtxo {
        address: self.address.clone(),
      }
      .fail();
    };

    if largest.amount >= threshold {
      log::debug!(
        "selected {} carrying {} with {} confirmations",
        largest.outpoint,
        largest.amount,
        largest.confirmations,
      );
      return Ok(largest.clone());
    }

    if let Some(txid) = self.consolidate(&utxos, threshold, consolidation_fee)? {
      log::info!("consolidated wallet utxos in {txid}");
      utxos = self.unspent()?;
    }

    utxos
      .into_iter()
      .find(|utxo| utxo.amount >= threshold)
      .ok_or_else(|| error::NoSpendableUtxo { threshold }.build())
  }

  /// Combines up to `MAX_CONSOLIDATION_INPUTS` outputs strictly between
  /// dust and `threshold` into a single output paying the wallet address,
  /// or does nothing when fewer than `MIN_CONSOLIDATION_INPUTS` qualify.
  pub(crate) fn consolidate(
    &self,
    utxos: &[Utxo],
    threshold: Amount,
    fee: Amount,
  ) -> Result<Option<Txid>, Error> {
    let mut inputs = Vec::new();
    let mut total = Amount::ZERO;

    for utxo in utxos {
      if inputs.len() == MAX_CONSOLIDATION_INPUTS {
        break;
      }

      if utxo.amount > DUST && utxo.amount < threshold {
        inputs.push(utxo.outpoint);
        total += utxo.amount;
      }
    }

    if inputs.len() < MIN_CONSOLIDATION_INPUTS {
      log::info!(
        "not enough utxos under {threshold} to consolidate [{}/{MIN_CONSOLIDATION_INPUTS}]",
        inputs.len(),
      );
      return Ok(None);
    }

    let output = total.checked_sub(fee).ok_or_else(|| {
      error::Build {
        message: format!("consolidation fee {fee} exceeds gathered {total}"),
      }
      .build()
    })?;

    log::info!(
      "consolidating {} utxos carrying {total} into one output of {output}",
      inputs.len(),
    );

    let transaction = self
      .node
      .create_raw_transaction(&inputs, &[(self.address.clone(), output)])
      .map_err(|err| {
        error::Config {
          message: format!("node could not create consolidation transaction: {err}"),
        }
        .build()
      })?;

    let signed = self
      .node
      .sign_with_wallet(&transaction)
      .map_err(Error::into_broadcast)?;

    let txid = self.node.broadcast(&signed).map_err(Error::into_broadcast)?;

    Ok(Some(txid))
  }
}
