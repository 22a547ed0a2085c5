use super::*;

#[derive(Debug, Parser)]
#[command(version, about = "Embed binary payloads in Bitcoin transactions as inscriptions")]
pub struct Arguments {
  #[command(flatten)]
  pub options: Options,
  #[command(subcommand)]
  pub subcommand: Subcommand,
}

impl Arguments {
  pub fn run(self) -> Result {
    let settings = Settings::new(self.options, env::vars().collect())?;

    self.subcommand.run(settings)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subcommands_parse() {
    assert!(Arguments::try_parse_from([
      "bitseal",
      "--host",
      "127.0.0.1",
      "--chain",
      "regtest",
      "inscribe",
      "--payload",
      "00ff",
    ])
    .is_ok());

    assert!(Arguments::try_parse_from([
      "bitseal",
      "decode",
      "--txid",
      "0101010101010101010101010101010101010101010101010101010101010101",
    ])
    .is_ok());

    assert!(Arguments::try_parse_from(["bitseal"]).is_err());
  }
}
