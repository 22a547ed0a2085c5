use {super::*, snafu::Snafu};

#[derive(Debug, PartialEq, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum Error {
  #[snafu(display("invalid configuration: {message}"))]
  Config { message: String },
  #[snafu(display("rpc: {message}"))]
  Rpc { message: String },
  #[snafu(display("no utxos are spendable by {address}"))]
  NoUtxo { address: Address },
  #[snafu(display("no spendable utxo above {threshold}, even after consolidation"))]
  NoSpendableUtxo { threshold: Amount },
  #[snafu(display("failed to build inscription transactions: {message}"))]
  Build { message: String },
  #[snafu(display("node rejected transaction: {message}"))]
  Broadcast { message: String },
  #[snafu(display("transaction witness carries no tapscript"))]
  MalformedWitness,
  #[snafu(display("transaction witness carries no inscription envelope"))]
  NotAnInscription,
}

impl Error {
  /// Signing and broadcast failures surface as `Broadcast` regardless of the
  /// transport error that produced them.
  pub(crate) fn into_broadcast(self) -> Self {
    match self {
      Self::Broadcast { .. } => self,
      other => Self::Broadcast {
        message: other.to_string(),
      },
    }
  }
}

impl From<bitcoincore_rpc::Error> for Error {
  fn from(err: bitcoincore_rpc::Error) -> Self {
    Self::Rpc {
      message: err.to_string(),
    }
  }
}
