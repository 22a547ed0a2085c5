use {
  super::*,
  bitcoincore_rpc::{json::CreateRawTransactionInput, RpcApi},
  std::collections::HashMap,
};

/// An unspent output of the wallet address. Amounts are integer satoshis;
/// the node's floating-point BTC never leaves the rpc boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Utxo {
  pub(crate) outpoint: OutPoint,
  pub(crate) amount: Amount,
  pub(crate) confirmations: u32,
  pub(crate) spendable: bool,
}

/// The node-facing surface the rest of the crate consumes. Production is a
/// Bitcoin Core wallet over JSON-RPC; tests substitute a scripted fake.
pub(crate) trait NodeClient {
  fn descriptor_checksum(&self, descriptor: &str) -> Result<String, Error>;

  fn derive_addresses(&self, descriptor: &str) -> Result<Vec<Address<NetworkUnchecked>>, Error>;

  fn unspent(&self, address: &Address) -> Result<Vec<Utxo>, Error>;

  fn create_raw_transaction(
    &self,
    inputs: &[OutPoint],
    outputs: &[(Address, Amount)],
  ) -> Result<Transaction, Error>;

  fn sign_with_wallet(&self, transaction: &Transaction) -> Result<Transaction, Error>;

  fn broadcast(&self, transaction: &Transaction) -> Result<Txid, Error>;

  fn transaction(&self, txid: &Txid) -> Result<Transaction, Error>;
}

impl NodeClient for bitcoincore_rpc::Client {
  fn descriptor_checksum(&self, descriptor: &str) -> Result<String, Error> {
    self
      .get_descriptor_info(descriptor)?
      .checksum
      .ok_or_else(|| {
        error::Config {
          message: format!("node returned no checksum for descriptor `{descriptor}`"),
        }
        .build()
      })
  }

  fn derive_addresses(&self, descriptor: &str) -> Result<Vec<Address<NetworkUnchecked>>, Error> {
    Ok(RpcApi::derive_addresses(self, descriptor, None)?)
  }

  fn unspent(&self, address: &Address) -> Result<Vec<Utxo>, Error> {
    Ok(
      self
        .list_unspent(Some(0), Some(999_999), Some(&[address]), None, None)?
        .into_iter()
        .map(|entry| Utxo {
          outpoint: OutPoint::new(entry.txid, entry.vout),
          amount: entry.amount,
          confirmations: entry.confirmations,
          spendable: entry.spendable,
        })
        .collect(),
    )
  }

  fn create_raw_transaction(
    &self,
    inputs: &[OutPoint],
    outputs: &[(Address, Amount)],
  ) -> Result<Transaction, Error> {
    let inputs = inputs
      .iter()
      .map(|outpoint| CreateRawTransactionInput {
        txid: outpoint.txid,
        vout: outpoint.vout,
        sequence: None,
      })
      .collect::<Vec<CreateRawTransactionInput>>();

    let outputs = outputs
      .iter()
      .map(|(address, amount)| (address.to_string(), *amount))
      .collect::<HashMap<String, Amount>>();

    Ok(RpcApi::create_raw_transaction(
      self, &inputs, &outputs, None, None,
    )?)
  }

  fn sign_with_wallet(&self, transaction: &Transaction) -> Result<Transaction, Error> {
    let result = self.sign_raw_transaction_with_wallet(transaction, None, None)?;

    if !result.complete {
      return error::Broadcast {
        message: format!("wallet could not sign transaction: {:?}", result.errors),
      }
      .fail();
    }

    consensus::encode::deserialize(&result.hex).map_err(|err| {
      error::Rpc {
        message: format!("node returned undecodable signed transaction: {err}"),
      }
      .build()
    })
  }

  fn broadcast(&self, transaction: &Transaction) -> Result<Txid, Error> {
    Ok(self.send_raw_transaction(transaction)?)
  }

  fn transaction(&self, txid: &Txid) -> Result<Transaction, Error> {
    let hex = self.get_transaction(txid, None)?.hex;

    consensus::encode::deserialize(&hex).map_err(|err| {
      error::Rpc {
        message: format!("node returned undecodable transaction {txid}: {err}"),
      }
      .build()
    })
  }
}
