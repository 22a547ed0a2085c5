use {
  super::*,
  bitcoin::hashes::{ripemd160, sha256, Hash},
  serde::de::DeserializeOwned,
  std::{
    io::{BufRead, BufReader, Write},
    net::{Shutdown, TcpStream},
    sync::{
      mpsc::{self, RecvTimeoutError},
      Arc, Mutex,
    },
    thread::JoinHandle,
  },
};

pub(crate) const PING_INTERVAL: Duration = Duration::from_secs(120);

/// Electrum-protocol client over a persistent TCP connection. Requests are
/// newline-delimited JSON-RPC 2.0; one mutex owns both halves of the socket
/// so framed responses never interleave. A background thread pings the
/// server every two minutes until shutdown.
pub(crate) struct Indexer {
  connection: Arc<Mutex<Connection>>,
  keep_alive: Option<JoinHandle<()>>,
  shutdown: mpsc::Sender<()>,
}

struct Connection {
  next_id: u64,
  reader: BufReader<TcpStream>,
  stream: TcpStream,
}

#[derive(Deserialize)]
struct Response {
  #[serde(default)]
  result: serde_json::Value,
  error: Option<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
  code: i64,
  message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct HistoryEntry {
  pub(crate) height: i64,
  pub(crate) tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct IndexerUtxo {
  pub(crate) height: i64,
  pub(crate) tx_hash: String,
  pub(crate) tx_pos: u32,
  pub(crate) value: u64,
}

impl Indexer {
  pub(crate) fn connect(url: &str) -> Result<Self, Error> {
    let stream = TcpStream::connect(url).map_err(|err| {
      error::Rpc {
        message: format!("failed to connect to indexer at `{url}`: {err}"),
      }
      .build()
    })?;

    let reader = BufReader::new(stream.try_clone().map_err(|err| {
      error::Rpc {
        message: format!("failed to clone indexer stream: {err}"),
      }
      .build()
    })?);

    let connection = Arc::new(Mutex::new(Connection {
      next_id: 0,
      reader,
      stream,
    }));

    let (shutdown, cancel) = mpsc::channel();

    let ping_connection = connection.clone();

    let keep_alive = thread::spawn(move || loop {
      match cancel.recv_timeout(PING_INTERVAL) {
        Err(RecvTimeoutError::Timeout) => {
          match Self::request::<serde_json::Value>(&ping_connection, "server.ping", Vec::new()) {
            Ok(_) => log::debug!("pinged indexer to keep the connection open"),
            Err(err) => {
              log::warn!("indexer keep-alive ping failed: {err}");
              break;
            }
          }
        }
        _ => break,
      }
    });

    log::info!("connected to electrum indexer at {url}");

    Ok(Self {
      connection,
      keep_alive: Some(keep_alive),
      shutdown,
    })
  }

  pub(crate) fn ping(&self) -> Result<(), Error> {
    Self::request::<serde_json::Value>(&self.connection, "server.ping", Vec::new())?;
    Ok(())
  }

  /// Raw hex of the transaction with `txid`.
  pub(crate) fn transaction(&self, txid: &Txid) -> Result<String, Error> {
    Self::request(
      &self.connection,
      "blockchain.transaction.get",
      vec![txid.to_string().into()],
    )
  }

  /// Confirmed and mempool history of the script hash of `public_key`.
  pub(crate) fn history(&self, public_key: &str) -> Result<Vec<HistoryEntry>, Error> {
    let script_hash = Self::script_hash(public_key)?;

    self.subscribe(&script_hash)?;

    Self::request(
      &self.connection,
      "blockchain.scripthash.get_history",
      vec![script_hash.into()],
    )
  }

  /// Unspent outputs of the script hash of `public_key`.
  pub(crate) fn unspent(&self, public_key: &str) -> Result<Vec<IndexerUtxo>, Error> {
    let script_hash = Self::script_hash(public_key)?;

    self.subscribe(&script_hash)?;

    Self::request(
      &self.connection,
      "blockchain.scripthash.listunspent",
      vec![script_hash.into()],
    )
  }

  fn subscribe(&self, script_hash: &str) -> Result<Option<String>, Error> {
    let status = Self::request(
      &self.connection,
      "blockchain.scripthash.subscribe",
      vec![script_hash.into()],
    )?;

    log::debug!("subscribed to script hash {script_hash}");

    Ok(status)
  }

  /// The Electrum lookup key for a compressed public key: the SHA-256 of
  /// its P2WPKH script, byte-reversed, hex-encoded.
  pub(crate) fn script_hash(public_key: &str) -> Result<String, Error> {
    let public_key = hex::decode(public_key).map_err(|err| {
      error::Rpc {
        message: format!("invalid public key hex: {err}"),
      }
      .build()
    })?;

    let key_hash = ripemd160::Hash::hash(sha256::Hash::hash(&public_key).as_byte_array());

    let mut script = vec![0x00, 0x14];
    script.extend_from_slice(key_hash.as_byte_array());

    let mut script_hash = sha256::Hash::hash(&script).to_byte_array();
    script_hash.reverse();

    Ok(hex::encode(script_hash))
  }

  fn request<T: DeserializeOwned>(
    connection: &Mutex<Connection>,
    method: &str,
    params: Vec<serde_json::Value>,
  ) -> Result<T, Error> {
    let mut connection = connection.lock().unwrap();

    let id = connection.next_id;
    connection.next_id += 1;

    let mut request = serde_json::to_vec(&serde_json::json!({
      "jsonrpc": "2.0",
      "id": id,
      "method": method,
      "params": params,
    }))
    .expect("request serialization cannot fail");

    request.push(b'\n');

    connection.stream.write_all(&request).map_err(|err| {
      error::Rpc {
        message: format!("failed to send `{method}` to indexer: {err}"),
      }
      .build()
    })?;

    let mut line = String::new();

    connection.reader.read_line(&mut line).map_err(|err| {
      error::Rpc {
        message: format!("failed to read `{method}` response: {err}"),
      }
      .build()
    })?;

    if line.is_empty() {
      return error::Rpc {
        message: "indexer closed the connection",
      }
      .fail();
    }

    let response = serde_json::from_str::<Response>(&line).map_err(|err| {
      error::Rpc {
        message: format!("undecodable `{method}` response: {err}"),
      }
      .build()
    })?;

    if let Some(err) = response.error {
      return error::Rpc {
        message: format!("indexer returned error {}: {}", err.code, err.message),
      }
      .fail();
    }

    serde_json::from_value(response.result).map_err(|err| {
      error::Rpc {
        message: format!("unexpected `{method}` result: {err}"),
      }
      .build()
    })
  }

  /// Stops the keep-alive thread and closes the socket.
  pub(crate) fn shutdown(mut self) {
    let _ = self.shutdown.send(());

    if let Some(keep_alive) = self.keep_alive.take() {
      let _ = keep_alive.join();
    }

    if let Ok(connection) = self.connection.lock() {
      let _ = connection.stream.shutdown(Shutdown::Both);
    }

    log::info!("electrum indexer disconnected");
  }
}

#[cfg(test)]
mod tests {
  use {super::*, std::net::TcpListener};

  #[test]
  fn script_hash_matches_known_vector() {
    assert_eq!(
      Indexer::script_hash("02e404b6b84b2a4956e7bbbd33745b23d4680451b30b258f016f57dbc9cbe28c6b")
        .unwrap(),
      "948029c82c2b1cf227a6d0e6f80f6657349b6ab0f55dc4a873f5779446f06f22",
    );
  }

  #[test]
  fn script_hash_is_a_stable_function_of_the_public_key() {
    let public_key = "02e404b6b84b2a4956e7bbbd33745b23d4680451b30b258f016f57dbc9cbe28c6b";

    assert_eq!(
      Indexer::script_hash(public_key).unwrap(),
      Indexer::script_hash(public_key).unwrap(),
    );

    assert_ne!(
      Indexer::script_hash(public_key).unwrap(),
      Indexer::script_hash("03e404b6b84b2a4956e7bbbd33745b23d4680451b30b258f016f57dbc9cbe28c6b")
        .unwrap(),
    );
  }

  #[test]
  fn script_hash_rejects_bad_hex() {
    assert!(matches!(
      Indexer::script_hash("not hex").unwrap_err(),
      Error::Rpc { .. }
    ));
  }

  const PUBLIC_KEY: &str = "02e404b6b84b2a4956e7bbbd33745b23d4680451b30b258f016f57dbc9cbe28c6b";

  fn serve() -> (thread::JoinHandle<Vec<String>>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
      let (mut stream, _) = listener.accept().unwrap();
      let mut reader = BufReader::new(stream.try_clone().unwrap());
      let mut methods = Vec::new();

      loop {
        let mut line = String::new();

        if reader.read_line(&mut line).unwrap() == 0 {
          break methods;
        }

        let request: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(request["jsonrpc"], "2.0");

        let method = request["method"].as_str().unwrap().to_string();

        let response = match method.as_str() {
          "server.ping" => serde_json::json!({ "id": request["id"], "result": null }),
          "blockchain.transaction.get" => {
            serde_json::json!({ "id": request["id"], "result": "00ff" })
          }
          "blockchain.scripthash.subscribe" => {
            serde_json::json!({ "id": request["id"], "result": null })
          }
          "blockchain.scripthash.listunspent" => serde_json::json!({
            "id": request["id"],
            "result": [{ "height": 100, "tx_hash": "ab", "tx_pos": 1, "value": 5000 }],
          }),
          "blockchain.scripthash.get_history" => serde_json::json!({
            "id": request["id"],
            "result": [{ "height": 100, "tx_hash": "ab" }],
          }),
          _ => serde_json::json!({
            "id": request["id"],
            "error": { "code": -32601, "message": "unknown method" },
          }),
        };

        methods.push(method);

        let mut response = serde_json::to_vec(&response).unwrap();
        response.push(b'\n');
        stream.write_all(&response).unwrap();
      }
    });

    (server, address)
  }

  #[test]
  fn requests_are_newline_delimited_and_responses_parsed() {
    let (server, address) = serve();

    let indexer = Indexer::connect(&address).unwrap();

    indexer.ping().unwrap();

    assert_eq!(indexer.transaction(&txid(1)).unwrap(), "00ff");

    indexer.shutdown();

    assert_eq!(
      server.join().unwrap(),
      vec!["server.ping", "blockchain.transaction.get"],
    );
  }

  #[test]
  fn scripthash_queries_subscribe_first() {
    let (server, address) = serve();

    let indexer = Indexer::connect(&address).unwrap();

    assert_eq!(
      indexer.unspent(PUBLIC_KEY).unwrap(),
      vec![IndexerUtxo {
        height: 100,
        tx_hash: "ab".into(),
        tx_pos: 1,
        value: 5000,
      }],
    );

    assert_eq!(
      indexer.history(PUBLIC_KEY).unwrap(),
      vec![HistoryEntry {
        height: 100,
        tx_hash: "ab".into(),
      }],
    );

    indexer.shutdown();

    assert_eq!(
      server.join().unwrap(),
      vec![
        "blockchain.scripthash.subscribe",
        "blockchain.scripthash.listunspent",
        "blockchain.scripthash.subscribe",
        "blockchain.scripthash.get_history",
      ],
    );
  }

  #[test]
  fn shutdown_stops_the_keep_alive_thread() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
      let (_stream, _) = listener.accept().unwrap();
    });

    // a prompt join requires the cancellation channel to fire; the ping
    // interval alone would hold the thread for two minutes
    let indexer = Indexer::connect(&address.to_string()).unwrap();
    indexer.shutdown();
    server.join().unwrap();
  }
}
