use {
  super::*,
  bitcoin::{
    absolute::LockTime,
    key::UntweakedKeypair,
    policy::MAX_STANDARD_TX_WEIGHT,
    secp256k1::{rand, Message, Secp256k1, XOnlyPublicKey},
    sighash::{Prevouts, SighashCache, TapSighashType},
    taproot::{ControlBlock, LeafVersion, TapLeafHash, TaprootBuilder},
    transaction::Version,
    Weight,
  },
};

/// Placeholder size of a wallet-signed P2WPKH input witness, used when
/// estimating the commit fee before the node signs. A DER signature never
/// exceeds 72 bytes, so the estimate errs high.
const P2WPKH_SIGNATURE_SIZE: usize = 72;
const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
  /// One reveal transaction exposes every inscription.
  SingleReveal,
  /// Each inscription gets its own commit output and reveal transaction.
  SeparateReveals,
}

/// An immutable inscription request: which outputs fund the commit, the fee
/// rates, the payloads, and how reveals are grouped.
pub(crate) struct Plan {
  pub(crate) commit_fee_rate: FeeRate,
  pub(crate) reveal_fee_rate: FeeRate,
  pub(crate) inscriptions: Vec<Inscription>,
  pub(crate) mode: Mode,
  pub(crate) postage: Amount,
}

#[derive(Debug)]
pub(crate) struct Transactions {
  pub(crate) commit_tx: Transaction,
  pub(crate) reveal_txs: Vec<Transaction>,
  pub(crate) inscription_ids: Vec<InscriptionId>,
  pub(crate) total_fees: Amount,
}

pub(crate) struct Inscribed {
  pub(crate) commit: Txid,
  pub(crate) reveals: Vec<Txid>,
  pub(crate) inscriptions: Vec<InscriptionId>,
  pub(crate) total_fees: Amount,
}

impl Plan {
  /// Signs the commit with the node wallet and broadcasts the pair. The
  /// commit must enter the mempool before any reveal that spends it.
  pub(crate) fn inscribe(&self, wallet: &Wallet, commit_inputs: &[Utxo]) -> Result<Inscribed, Error> {
    let Transactions {
      commit_tx,
      reveal_txs,
      inscription_ids,
      total_fees,
    } = self.create_inscription_transactions(
      commit_inputs,
      wallet.address().clone(),
      wallet.chain().network(),
    )?;

    let signed_commit_tx = wallet
      .node()
      .sign_with_wallet(&commit_tx)
      .map_err(Error::into_broadcast)?;

    let commit = wallet
      .node()
      .broadcast(&signed_commit_tx)
      .map_err(Error::into_broadcast)?;

    log::info!("commit transaction {commit} broadcast");

    let mut reveals = Vec::new();

    for reveal_tx in &reveal_txs {
      let reveal = wallet.node().broadcast(reveal_tx).map_err(|err| {
        error::Broadcast {
          message: format!(
            "failed to send reveal transaction: {err}; commit {commit} will be recovered once mined"
          ),
        }
        .build()
      })?;

      log::info!("reveal transaction {reveal} broadcast");

      reveals.push(reveal);
    }

    Ok(Inscribed {
      commit,
      reveals,
      inscriptions: inscription_ids,
      total_fees,
    })
  }

  /// Constructs the commit transaction and schnorr-signed reveal
  /// transaction(s) without touching the network, so the arithmetic is
  /// checkable in isolation. The commit comes back unsigned; its inputs
  /// belong to the node wallet.
  pub(crate) fn create_inscription_transactions(
    &self,
    commit_inputs: &[Utxo],
    change_address: Address,
    network: Network,
  ) -> Result<Transactions, Error> {
    if self.inscriptions.is_empty() {
      return error::Build {
        message: "nothing to inscribe",
      }
      .fail();
    }

    if commit_inputs.is_empty() {
      return error::Build {
        message: "no commit inputs",
      }
      .fail();
    }

    let groups: Vec<&[Inscription]> = match self.mode {
      Mode::SingleReveal => vec![self.inscriptions.as_slice()],
      Mode::SeparateReveals => self.inscriptions.chunks(1).collect(),
    };

    let secp256k1 = Secp256k1::new();
    let key_pair = UntweakedKeypair::new(&secp256k1, &mut rand::thread_rng());
    let (public_key, _parity) = XOnlyPublicKey::from_keypair(&key_pair);

    struct Reveal {
      control_block: ControlBlock,
      fee: Amount,
      outputs: Vec<TxOut>,
      script: ScriptBuf,
    }

    let mut commit_outputs = Vec::new();
    let mut reveals = Vec::new();

    for group in &groups {
      let reveal_script = Inscription::append_batch_reveal_script(
        group,
        ScriptBuf::builder()
          .push_slice(public_key.serialize())
          .push_opcode(opcodes::all::OP_CHECKSIG),
      );

      let taproot_spend_info = TaprootBuilder::new()
        .add_leaf(0, reveal_script.clone())
        .expect("adding leaf should work")
        .finalize(&secp256k1, public_key)
        .expect("finalizing taproot builder should work");

      let control_block = taproot_spend_info
        .control_block(&(reveal_script.clone(), LeafVersion::TapScript))
        .expect("should compute control block");

      let commit_tx_address = Address::p2tr_tweaked(taproot_spend_info.output_key(), network);

      let outputs = group
        .iter()
        .map(|inscription| TxOut {
          script_pubkey: inscription.destination.script_pubkey(),
          value: self.postage,
        })
        .collect::<Vec<TxOut>>();

      let (_, fee) = Self::build_reveal_transaction(
        &control_block,
        self.reveal_fee_rate,
        OutPoint::null(),
        outputs.clone(),
        &reveal_script,
      );

      commit_outputs.push(TxOut {
        script_pubkey: commit_tx_address.script_pubkey(),
        value: self.postage * u64::try_from(group.len()).unwrap() + fee,
      });

      reveals.push(Reveal {
        control_block,
        fee,
        outputs,
        script: reveal_script,
      });
    }

    let input_value = commit_inputs.iter().map(|utxo| utxo.amount).sum::<Amount>();
    let commit_value = commit_outputs.iter().map(|output| output.value).sum::<Amount>();

    let mut commit_tx = Transaction {
      version: Version(2),
      lock_time: LockTime::ZERO,
      input: commit_inputs
        .iter()
        .map(|utxo| TxIn {
          previous_output: utxo.outpoint,
          script_sig: ScriptBuf::new(),
          sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
          witness: Witness::new(),
        })
        .collect(),
      output: commit_outputs,
    };

    commit_tx.output.push(TxOut {
      script_pubkey: change_address.script_pubkey(),
      value: Amount::ZERO,
    });

    let commit_fee = self
      .commit_fee_rate
      .fee(Self::estimate_signed_vsize(&commit_tx));

    let change = input_value
      .checked_sub(commit_value)
      .and_then(|remainder| remainder.checked_sub(commit_fee))
      .ok_or_else(|| {
        error::Build {
          message: format!(
            "commit inputs carry {input_value} but {} is needed",
            commit_value + commit_fee
          ),
        }
        .build()
      })?;

    if change < DUST {
      commit_tx.output.pop();
    } else {
      commit_tx.output.last_mut().expect("change output was pushed").value = change;
    }

    let commit_txid = commit_tx.compute_txid();

    let commit_fee = input_value
      - commit_tx
        .output
        .iter()
        .map(|output| output.value)
        .sum::<Amount>();

    let mut reveal_txs = Vec::new();
    let mut inscription_ids = Vec::new();
    let mut total_fees = commit_fee;

    for (index, reveal) in reveals.into_iter().enumerate() {
      let vout = u32::try_from(index).unwrap();

      let (mut reveal_tx, _) = Self::build_reveal_transaction(
        &reveal.control_block,
        self.reveal_fee_rate,
        OutPoint {
          txid: commit_txid,
          vout,
        },
        reveal.outputs,
        &reveal.script,
      );

      for output in &reveal_tx.output {
        if output.value < output.script_pubkey.minimal_non_dust() {
          return error::Build {
            message: "reveal output would be dust",
          }
          .fail();
        }
      }

      let commit_output = commit_tx.output[index].clone();

      let mut sighash_cache = SighashCache::new(&mut reveal_tx);

      let sighash = sighash_cache
        .taproot_script_spend_signature_hash(
          0,
          &Prevouts::All(&[commit_output]),
          TapLeafHash::from_script(&reveal.script, LeafVersion::TapScript),
          TapSighashType::Default,
        )
        .expect("signature hash should compute");

      let signature = secp256k1.sign_schnorr(
        &Message::from_digest_slice(sighash.as_ref()).expect("sighash is 32 bytes"),
        &key_pair,
      );

      let witness = sighash_cache
        .witness_mut(0)
        .expect("getting mutable witness reference should work");

      witness.push(
        bitcoin::taproot::Signature {
          signature,
          sighash_type: TapSighashType::Default,
        }
        .to_vec(),
      );

      witness.push(&reveal.script);
      witness.push(reveal.control_block.serialize());

      let reveal_weight = reveal_tx.weight();

      if reveal_weight > Weight::from_wu(MAX_STANDARD_TX_WEIGHT.into()) {
        return error::Build {
          message: format!(
            "reveal transaction weight {reveal_weight} over maximum standard weight {MAX_STANDARD_TX_WEIGHT}"
          ),
        }
        .fail();
      }

      total_fees += reveal.fee;

      let reveal_txid = reveal_tx.compute_txid();

      match self.mode {
        Mode::SingleReveal => {
          for i in 0..self.inscriptions.len() {
            inscription_ids.push(InscriptionId {
              txid: reveal_txid,
              index: u32::try_from(i).unwrap(),
            });
          }
        }
        Mode::SeparateReveals => inscription_ids.push(InscriptionId {
          txid: reveal_txid,
          index: 0,
        }),
      }

      reveal_txs.push(reveal_tx);
    }

    Ok(Transactions {
      commit_tx,
      reveal_txs,
      inscription_ids,
      total_fees,
    })
  }

  fn build_reveal_transaction(
    control_block: &ControlBlock,
    fee_rate: FeeRate,
    input: OutPoint,
    output: Vec<TxOut>,
    script: &Script,
  ) -> (Transaction, Amount) {
    let reveal_tx = Transaction {
      input: vec![TxIn {
        previous_output: input,
        script_sig: ScriptBuf::new(),
        witness: Witness::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
      }],
      output,
      lock_time: LockTime::ZERO,
      version: Version(2),
    };

    let fee = {
      let mut reveal_tx = reveal_tx.clone();

      // dummy inscription witness for the reveal input
      reveal_tx.input[0].witness.push([0; SCHNORR_SIGNATURE_SIZE]);
      reveal_tx.input[0].witness.push(script);
      reveal_tx.input[0].witness.push(control_block.serialize());

      fee_rate.fee(reveal_tx.vsize())
    };

    (reveal_tx, fee)
  }

  fn estimate_signed_vsize(commit_tx: &Transaction) -> usize {
    let mut commit_tx = commit_tx.clone();

    for txin in commit_tx.input.iter_mut() {
      txin.witness = Witness::from_slice(&[
        vec![0; P2WPKH_SIGNATURE_SIZE],
        vec![0; COMPRESSED_PUBLIC_KEY_SIZE],
      ]);
    }

    commit_tx.vsize()
  }
}
