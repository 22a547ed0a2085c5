use super::*;

/// Fee rate in satoshis per virtual byte, stored with millisatoshi
/// precision so fee math stays in integers.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FeeRate(u64);

impl FromStr for FeeRate {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let fee_rate = f64::from_str(s)?;

    if fee_rate.is_sign_negative() | fee_rate.is_nan() | fee_rate.is_infinite() {
      bail!("fee rate must be a finite non-negative number");
    }

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    Ok(Self((fee_rate * 1000.0).round() as u64))
  }
}

impl FeeRate {
  pub(crate) const fn from_sat_per_vb(rate: u64) -> Self {
    Self(rate * 1000)
  }

  pub(crate) fn fee(&self, vsize: usize) -> Amount {
    let vsize = u64::try_from(vsize).unwrap();
    Amount::from_sat((self.0 * vsize + 999) / 1000)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse() {
    assert_eq!("1.0".parse::<FeeRate>().unwrap().0, 1000);
    assert_eq!("11.1119".parse::<FeeRate>().unwrap().0, 11112);
    assert_eq!("11.1111".parse::<FeeRate>().unwrap().0, 11111);
    assert!("-4.2".parse::<FeeRate>().is_err());
    assert!("NaN".parse::<FeeRate>().is_err());
  }

  #[test]
  fn fee() {
    assert_eq!(
      "2.5".parse::<FeeRate>().unwrap().fee(100),
      Amount::from_sat(250)
    );
    assert_eq!(
      "2.0".parse::<FeeRate>().unwrap().fee(1024),
      Amount::from_sat(2048)
    );
    assert_eq!("1.1".parse::<FeeRate>().unwrap().fee(1), Amount::from_sat(2));
    assert_eq!(
      "1.0".parse::<FeeRate>().unwrap().fee(123456789),
      Amount::from_sat(123456789)
    );
  }

  #[test]
  fn fee_rounds_up() {
    assert_eq!(
      FeeRate::from_sat_per_vb(2).fee(100),
      "2.0".parse::<FeeRate>().unwrap().fee(100)
    );
    assert_eq!("0.001".parse::<FeeRate>().unwrap().fee(1), Amount::from_sat(1));
  }
}
