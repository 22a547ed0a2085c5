use {
  super::*,
  serde::{de, Deserializer, Serializer},
};

/// Identifies one inscription within a reveal transaction, rendered as
/// `<txid>i<index>`.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct InscriptionId {
  pub txid: Txid,
  pub index: u32,
}

impl Display for InscriptionId {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}i{}", self.txid, self.index)
  }
}

impl FromStr for InscriptionId {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    if !s.is_ascii() {
      bail!("invalid character in inscription id: `{s}`");
    }

    const TXID_LEN: usize = 64;
    const MIN_LEN: usize = TXID_LEN + 2;

    if s.len() < MIN_LEN {
      bail!("inscription id too short: `{s}`");
    }

    let txid = &s[..TXID_LEN];

    let separator = &s[TXID_LEN..=TXID_LEN];

    if separator != "i" {
      bail!("invalid inscription id separator: `{separator}`");
    }

    let index = &s[TXID_LEN + 1..];

    Ok(Self {
      txid: txid.parse()?,
      index: index.parse()?,
    })
  }
}

impl Serialize for InscriptionId {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for InscriptionId {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    String::deserialize(deserializer)?
      .parse()
      .map_err(de::Error::custom)
  }
}
