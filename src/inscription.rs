use super::*;

/// One payload to embed: a content type, the opaque body, and the address
/// the reveal output pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Inscription {
  pub(crate) body: Vec<u8>,
  pub(crate) content_type: Vec<u8>,
  pub(crate) destination: Address,
}

impl Inscription {
  pub(crate) fn new(content_type: &str, body: Vec<u8>, destination: Address) -> Self {
    Self {
      body,
      content_type: content_type.as_bytes().to_vec(),
      destination,
    }
  }

  pub(crate) fn append_reveal_script_to_builder(
    &self,
    mut builder: script::Builder,
  ) -> script::Builder {
    builder = builder
      .push_opcode(opcodes::OP_FALSE)
      .push_opcode(opcodes::all::OP_IF)
      .push_slice(envelope::PROTOCOL_ID)
      .push_slice(envelope::CONTENT_TYPE_TAG)
      .push_slice::<&script::PushBytes>(self.content_type.as_slice().try_into().unwrap())
      .push_slice(envelope::BODY_TAG);

    for chunk in self.body.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
      builder = builder.push_slice::<&script::PushBytes>(chunk.try_into().unwrap());
    }

    builder.push_opcode(opcodes::all::OP_ENDIF)
  }

  pub(crate) fn append_batch_reveal_script(
    inscriptions: &[Inscription],
    mut builder: script::Builder,
  ) -> ScriptBuf {
    for inscription in inscriptions {
      builder = inscription.append_reveal_script_to_builder(builder);
    }

    builder.into_script()
  }

  #[cfg(test)]
  pub(crate) fn append_reveal_script(&self, builder: script::Builder) -> ScriptBuf {
    self.append_reveal_script_to_builder(builder).into_script()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reveal_script_chunks_body() {
    assert_eq!(
      inscription("application/octet-stream", [])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      7
    );

    assert_eq!(
      inscription("application/octet-stream", [0; 1])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      8
    );

    assert_eq!(
      inscription("application/octet-stream", [0; 520])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      8
    );

    assert_eq!(
      inscription("application/octet-stream", [0; 521])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      9
    );

    assert_eq!(
      inscription("application/octet-stream", [0; 1040])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      9
    );

    assert_eq!(
      inscription("application/octet-stream", [0; 1041])
        .append_reveal_script(script::Builder::new())
        .instructions()
        .count(),
      10
    );
  }

  #[test]
  fn reveal_script_wire_format() {
    let script = inscription("application/octet-stream", *b"hello")
      .append_reveal_script(script::Builder::new());

    assert_eq!(
      script.as_bytes(),
      [
        &[
          opcodes::OP_FALSE.to_u8(),
          opcodes::all::OP_IF.to_u8(),
          3,
          b'o',
          b'r',
          b'd',
          1,
          1,
          24,
        ],
        b"application/octet-stream".as_slice(),
        &[0, 5],
        b"hello",
        &[opcodes::all::OP_ENDIF.to_u8()],
      ]
      .concat()
    );
  }

  #[test]
  fn round_trip_through_parser() {
    let script =
      inscription("application/octet-stream", [0x42; 1041]).append_reveal_script(script::Builder::new());

    let parsed = envelope::ParsedEnvelope::from_transaction(&transaction_with_witnesses(&[
      Witness::from_slice(&[script.into_bytes(), Vec::new()]),
    ]));

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].content_type(), Some("application/octet-stream"));
    assert_eq!(parsed[0].body.as_deref().unwrap(), [0x42; 1041]);
  }

  #[test]
  fn batch_reveal_script_repeats_envelopes() {
    let script = Inscription::append_batch_reveal_script(
      &[
        inscription("application/octet-stream", *b"foo"),
        inscription("application/octet-stream", *b"bar"),
      ],
      script::Builder::new(),
    );

    let parsed = envelope::ParsedEnvelope::from_transaction(&transaction_with_witnesses(&[
      Witness::from_slice(&[script.into_bytes(), Vec::new()]),
    ]));

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].body.as_deref(), Some(b"foo".as_slice()));
    assert_eq!(parsed[1].body.as_deref(), Some(b"bar".as_slice()));
    assert_eq!(parsed[1].offset, 1);
  }

  #[test]
  fn empty_body_is_preserved() {
    let script =
      inscription("application/octet-stream", []).append_reveal_script(script::Builder::new());

    let parsed = envelope::ParsedEnvelope::from_transaction(&transaction_with_witnesses(&[
      Witness::from_slice(&[script.into_bytes(), Vec::new()]),
    ]));

    assert_eq!(parsed[0].body.as_deref(), Some([].as_slice()));
  }
}
