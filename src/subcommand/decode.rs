use super::*;

#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct Output {
  pub txid: Txid,
  pub payload: String,
}

#[derive(Debug, Parser)]
pub struct Decode {
  #[arg(long, help = "Recover the payload embedded in <TXID>.")]
  txid: Txid,
}

impl Decode {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let sealer = Sealer::new(settings)?;

    let result = sealer.decode_inscription(self.txid);

    sealer.shutdown();

    print_json(Output {
      txid: self.txid,
      payload: hex::encode(result?),
    })
  }
}
