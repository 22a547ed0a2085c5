use super::*;

pub mod decode;
pub mod inscribe;

#[derive(Debug, Parser)]
pub enum Subcommand {
  #[command(about = "Embed a payload in the chain")]
  Inscribe(inscribe::Inscribe),
  #[command(about = "Recover the payload embedded in a transaction")]
  Decode(decode::Decode),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> Result {
    match self {
      Self::Inscribe(inscribe) => inscribe.run(settings),
      Self::Decode(decode) => decode.run(settings),
    }
  }
}

fn print_json(output: impl Serialize) -> Result {
  serde_json::to_writer_pretty(io::stdout(), &output)?;
  println!();
  Ok(())
}
