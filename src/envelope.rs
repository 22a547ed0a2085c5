use {
  super::*,
  bitcoin::blockdata::script::{
    Instruction::{self, Op, PushBytes},
    Instructions,
  },
  std::iter::Peekable,
};

pub(crate) const PROTOCOL_ID: [u8; 3] = *b"ord";
pub(crate) const BODY_TAG: [u8; 0] = [];
pub(crate) const CONTENT_TYPE_TAG: [u8; 1] = [1];

/// An envelope recovered from a reveal transaction's tapscript. The body is
/// the concatenation of the data pushes following the empty body tag, so
/// push-length prefixes never appear in the recovered payload.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub(crate) struct ParsedEnvelope {
  pub(crate) input: u32,
  pub(crate) offset: u32,
  pub(crate) content_type: Option<Vec<u8>>,
  pub(crate) body: Option<Vec<u8>>,
}

/// Extracts the payload carried by `transaction`, requiring an envelope in
/// some input's tapscript.
pub(crate) fn payload(transaction: &Transaction) -> Result<Vec<u8>, Error> {
  let Some(input) = transaction.input.first() else {
    return error::MalformedWitness.fail();
  };

  if input.witness.len() < 2 {
    return error::MalformedWitness.fail();
  }

  ParsedEnvelope::from_transaction(transaction)
    .into_iter()
    .find_map(|envelope| envelope.body)
    .ok_or_else(|| error::NotAnInscription.build())
}

impl ParsedEnvelope {
  pub(crate) fn from_transaction(transaction: &Transaction) -> Vec<Self> {
    let mut envelopes = Vec::new();

    for (i, input) in transaction.input.iter().enumerate() {
      if let Some(tapscript) = input.witness.tapscript() {
        if let Ok(input_envelopes) = Self::from_tapscript(tapscript, i) {
          envelopes.extend(input_envelopes);
        }
      }
    }

    envelopes
  }

  pub(crate) fn content_type(&self) -> Option<&str> {
    std::str::from_utf8(self.content_type.as_deref()?).ok()
  }

  fn from_tapscript(tapscript: &Script, input: usize) -> Result<Vec<Self>, script::Error> {
    let mut envelopes = Vec::new();

    let mut instructions = tapscript.instructions().peekable();

    while let Some(instruction) = instructions.next().transpose()? {
      if instruction == PushBytes((&[]).into()) {
        if let Some(payload) = Self::from_instructions(&mut instructions)? {
          envelopes.push(Self::parse(payload, input, envelopes.len()));
        }
      }
    }

    Ok(envelopes)
  }

  fn accept(
    instructions: &mut Peekable<Instructions>,
    instruction: Instruction,
  ) -> Result<bool, script::Error> {
    if instructions.peek() == Some(&Ok(instruction)) {
      instructions.next().transpose()?;
      Ok(true)
    } else {
      Ok(false)
    }
  }

  fn from_instructions(
    instructions: &mut Peekable<Instructions>,
  ) -> Result<Option<Vec<Vec<u8>>>, script::Error> {
    if !Self::accept(instructions, Op(opcodes::all::OP_IF))? {
      return Ok(None);
    }

    if !Self::accept(instructions, PushBytes((&PROTOCOL_ID).into()))? {
      return Ok(None);
    }

    let mut payload = Vec::new();

    loop {
      match instructions.next().transpose()? {
        None => return Ok(None),
        Some(Op(opcodes::all::OP_ENDIF)) => return Ok(Some(payload)),
        Some(PushBytes(push)) => payload.push(push.as_bytes().to_vec()),
        Some(_) => return Ok(None),
      }
    }
  }

  fn parse(payload: Vec<Vec<u8>>, input: usize, offset: usize) -> Self {
    let body = payload
      .iter()
      .enumerate()
      .position(|(i, push)| i % 2 == 0 && push.is_empty());

    let mut content_type = None;

    for item in payload[..body.unwrap_or(payload.len())].chunks(2) {
      if let [key, value] = item {
        if key.as_slice() == CONTENT_TYPE_TAG && content_type.is_none() {
          content_type = Some(value.clone());
        }
      }
    }

    Self {
      input: input.try_into().unwrap(),
      offset: offset.try_into().unwrap(),
      content_type,
      body: body.map(|i| payload[i + 1..].concat()),
    }
  }
}
