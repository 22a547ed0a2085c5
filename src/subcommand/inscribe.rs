use super::*;

#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct Output {
  pub commit: Txid,
  pub reveal: Txid,
  pub inscriptions: Vec<InscriptionId>,
  pub total_fees: u64,
}

#[derive(Debug, Parser)]
pub struct Inscribe {
  #[arg(long, conflicts_with = "payload", help = "Inscribe the contents of <FILE>.")]
  file: Option<PathBuf>,
  #[arg(long, conflicts_with = "file", help = "Inscribe the hex-encoded <PAYLOAD>.")]
  payload: Option<String>,
}

impl Inscribe {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let payload = if let Some(file) = &self.file {
      fs::read(file).with_context(|| format!("io error reading {}", file.display()))?
    } else if let Some(payload) = &self.payload {
      hex::decode(payload).context("payload is not valid hex")?
    } else {
      bail!("provide either --file or --payload");
    };

    let sealer = Sealer::new(settings)?;

    let result = sealer.inscribe_payload(&payload);

    sealer.shutdown();

    let inscribed = result?;

    print_json(Output {
      commit: inscribed.commit,
      reveal: inscribed.reveals[0],
      inscriptions: inscribed.inscriptions,
      total_fees: inscribed.total_fees.to_sat(),
    })
  }
}
