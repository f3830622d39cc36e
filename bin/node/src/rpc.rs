//! JSON-RPC surface over the child chain

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use plasma_core::{
    parse_address, to_hex, Amount, Block, BlockNumber, ChildChain, InclusionProof, PlasmaError,
    Signature, Transaction, UtxoPosition,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Chain shared between request handlers
pub(crate) type SharedChain = Arc<RwLock<ChildChain>>;

const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const LEDGER_ERROR: i64 = -32000;
const NOT_FOUND: i64 = -32001;

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub(crate) struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub(crate) struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Value,
}

/// JSON-RPC error object
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: INVALID_PARAMS, message: message.into() }
    }
}

impl From<PlasmaError> for RpcError {
    fn from(err: PlasmaError) -> Self {
        let code = if err.is_not_found() { NOT_FOUND } else { LEDGER_ERROR };
        Self { code, message: err.to_string() }
    }
}

/// Deposit observed on the root ledger
#[derive(Debug, Deserialize)]
struct DepositParams {
    blknum: BlockNumber,
    owner: String,
    amount: AmountParam,
}

/// Amounts above `u64::MAX` travel as decimal strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AmountParam {
    Number(u64),
    Decimal(String),
}

impl AmountParam {
    fn value(&self) -> Result<Amount, RpcError> {
        match self {
            Self::Number(n) => Ok(Amount::from(*n)),
            Self::Decimal(s) => s
                .parse()
                .map_err(|e| RpcError::invalid_params(format!("amount {s:?}: {e}"))),
        }
    }
}

/// Build the HTTP router
pub(crate) fn router(chain: SharedChain) -> Router {
    Router::new()
        .route("/", post(rpc_handler))
        .route("/health", get(health))
        .with_state(chain)
}

async fn health(State(chain): State<SharedChain>) -> Json<Value> {
    let chain = read(&chain);
    Json(json!({
        "status": "ok",
        "head": chain.head(),
        "queued": chain.queued_block_count(),
    }))
}

async fn rpc_handler(
    State(chain): State<SharedChain>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(handle(&chain, req))
}

/// Execute one request against the chain
pub(crate) fn handle(chain: &RwLock<ChildChain>, req: RpcRequest) -> RpcResponse {
    let (result, error) = match dispatch(chain, &req.method, req.params.as_ref()) {
        Ok(value) => (Some(value), None),
        Err(err) => {
            debug!(method = %req.method, code = err.code, message = %err.message, "rpc error");
            (None, Some(err))
        }
    };
    RpcResponse { jsonrpc: "2.0", result, error, id: req.id }
}

fn dispatch(
    chain: &RwLock<ChildChain>,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, RpcError> {
    match method {
        // Write operations
        "plasma_submitBlock" => {
            let block = Block::decode(&hex_param(params, 0)?)
                .map_err(|e| RpcError::invalid_params(format!("block: {e}")))?;
            let outcome = write(chain).submit_block(block)?;
            Ok(json!(outcome.as_str()))
        }
        "plasma_deposit" => {
            let deposit: DepositParams = param(params, 0)?;
            let owner = parse_address(&deposit.owner)
                .ok_or_else(|| RpcError::invalid_params("owner must be a 20-byte hex address"))?;
            let amount = deposit.amount.value()?;
            let outcome = write(chain).apply_deposit(deposit.blknum, owner, amount)?;
            Ok(json!(outcome.as_str()))
        }
        "plasma_exitStarted" => {
            let position: UtxoPosition = param(params, 0)?;
            write(chain).apply_exit(position)?;
            Ok(json!(true))
        }
        "plasma_confirmTransaction" => {
            let position: UtxoPosition = param(params, 0)?;
            let input: usize = param(params, 1)?;
            let signature = Signature::from_slice(&hex_param(params, 2)?)
                .ok_or_else(|| RpcError::invalid_params("signature must be 65 bytes"))?;
            write(chain).add_confirmation(position, input, signature)?;
            Ok(json!(true))
        }

        // Read operations
        "plasma_blockNumber" => Ok(json!(read(chain).head())),
        "plasma_getBlock" => {
            let number: BlockNumber = param(params, 0)?;
            let chain = read(chain);
            Ok(block_json(chain.get_block(number)?)?)
        }
        "plasma_getTransaction" => {
            let position: UtxoPosition = param(params, 0)?;
            let chain = read(chain);
            Ok(transaction_json(chain.get_transaction(position)?))
        }
        "plasma_getExitProof" => {
            let position: UtxoPosition = param(params, 0)?;
            Ok(proof_json(&read(chain).exit_proof(position)?))
        }
        "plasma_getChallengeProof" => {
            let exiting: UtxoPosition = param(params, 0)?;
            let spending: UtxoPosition = param(params, 1)?;
            Ok(proof_json(&read(chain).challenge_proof(exiting, spending)?))
        }
        _ => Err(RpcError { code: METHOD_NOT_FOUND, message: format!("method {method} not found") }),
    }
}

fn read(chain: &RwLock<ChildChain>) -> RwLockReadGuard<'_, ChildChain> {
    chain.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(chain: &RwLock<ChildChain>) -> RwLockWriteGuard<'_, ChildChain> {
    chain.write().unwrap_or_else(PoisonError::into_inner)
}

/// Positional parameter `index`
fn param<T: DeserializeOwned>(params: Option<&Value>, index: usize) -> Result<T, RpcError> {
    let value = params
        .and_then(Value::as_array)
        .and_then(|params| params.get(index))
        .ok_or_else(|| RpcError::invalid_params(format!("missing param {index}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| RpcError::invalid_params(format!("param {index}: {e}")))
}

fn hex_param(params: Option<&Value>, index: usize) -> Result<Vec<u8>, RpcError> {
    let raw: String = param(params, index)?;
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| RpcError::invalid_params(format!("param {index}: {e}")))
}

fn block_json(block: &Block) -> Result<Value, PlasmaError> {
    Ok(json!({
        "number": block.number,
        "hash": to_hex(block.hash()),
        "root": to_hex(block.root()?),
        "signature": block.signature.to_string(),
        "txCount": block.tx_count(),
        "transactions": block.transactions.iter().map(transaction_json).collect::<Vec<_>>(),
    }))
}

fn transaction_json(tx: &Transaction) -> Value {
    json!({
        "hash": to_hex(tx.hash()),
        "inputs": tx.inputs.iter().map(|input| json!({
            "blknum": input.blknum,
            "txindex": input.txindex,
            "oindex": input.oindex,
        })).collect::<Vec<_>>(),
        "outputs": tx.outputs.iter().map(|output| json!({
            "owner": to_hex(output.owner),
            "amount": output.amount.to_string(),
        })).collect::<Vec<_>>(),
        "signatures": tx.signatures.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "confirmations": tx.confirmations.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "spent": tx.spent,
        "raw": to_hex(tx.signed_encoded()),
    })
}

fn proof_json(proof: &InclusionProof) -> Value {
    json!({
        "position": proof.position,
        "encodedTransaction": to_hex(&proof.encoded_transaction),
        "merkleProof": to_hex(&proof.merkle_proof),
        "signatures": to_hex(&proof.signatures),
        "confirmations": to_hex(&proof.confirmations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_core::{
        address_of, encode_utxo_position, SecretKey, TransactionInput, TransactionOutput,
    };

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    fn chain() -> RwLock<ChildChain> {
        RwLock::new(ChildChain::new(address_of(&key(0x99))))
    }

    fn call(chain: &RwLock<ChildChain>, method: &str, params: Value) -> RpcResponse {
        let req: RpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        }))
        .unwrap();
        handle(chain, req)
    }

    fn deposit(chain: &RwLock<ChildChain>, blknum: u64, owner: u8, amount: u64) {
        let owner = to_hex(address_of(&key(owner)));
        let response =
            call(chain, "plasma_deposit", json!([{ "blknum": blknum, "owner": owner, "amount": amount }]));
        assert_eq!(response.result, Some(json!("applied")));
    }

    #[test]
    fn test_deposit_and_block_number() {
        let chain = chain();
        deposit(&chain, 1, 1, 100);
        let response = call(&chain, "plasma_blockNumber", json!([]));
        assert_eq!(response.result, Some(json!(2)));
        assert_eq!(response.id, json!(1));
    }

    #[test]
    fn test_large_amount_as_decimal_string() {
        let chain = chain();
        let owner = to_hex([7u8; 20]);
        let amount = u128::from(u64::MAX) + 1;
        let response = call(
            &chain,
            "plasma_deposit",
            json!([{ "blknum": 1, "owner": owner, "amount": amount.to_string() }]),
        );
        assert_eq!(response.result, Some(json!("applied")));

        let tx = call(&chain, "plasma_getTransaction", json!([encode_utxo_position(1, 0, 0)]));
        assert_eq!(tx.result.unwrap()["outputs"][0]["amount"], json!(amount.to_string()));
    }

    #[test]
    fn test_submit_block_and_exit_proof() {
        let chain = chain();
        deposit(&chain, 1, 1, 100);

        let mut tx = Transaction::new(
            &[TransactionInput::new(1, 0, 0)],
            &[TransactionOutput::new(address_of(&key(2)), 100)],
        )
        .unwrap();
        tx.sign(0, &key(1)).unwrap();
        let mut block = Block::new(vec![tx], 2);
        block.sign(&key(0x99));

        let response = call(&chain, "plasma_submitBlock", json!([to_hex(block.signed_encoded())]));
        assert_eq!(response.result, Some(json!("applied")));

        let fetched = call(&chain, "plasma_getBlock", json!([2])).result.unwrap();
        assert_eq!(fetched["root"], json!(to_hex(block.root().unwrap())));
        assert_eq!(fetched["txCount"], json!(1));

        let proof = call(&chain, "plasma_getExitProof", json!([encode_utxo_position(2, 0, 0)]))
            .result
            .unwrap();
        assert_eq!(proof["encodedTransaction"], json!(to_hex(block.transactions[0].encoded())));

        let duplicate = call(&chain, "plasma_submitBlock", json!([to_hex(block.signed_encoded())]));
        assert_eq!(duplicate.result, Some(json!("duplicate")));
    }

    #[test]
    fn test_ledger_errors_map_to_codes() {
        let chain = chain();
        let missing = call(&chain, "plasma_getBlock", json!([5]));
        assert_eq!(missing.error.unwrap().code, NOT_FOUND);

        let ahead = call(
            &chain,
            "plasma_deposit",
            json!([{ "blknum": 3, "owner": to_hex([1u8; 20]), "amount": 1 }]),
        );
        let error = ahead.error.unwrap();
        assert_eq!(error.code, LEDGER_ERROR);
        assert_eq!(error.message, "expected block 1, got 3");
    }

    #[test]
    fn test_bad_requests() {
        let chain = chain();
        assert_eq!(call(&chain, "eth_chainId", json!([])).error.unwrap().code, METHOD_NOT_FOUND);
        assert_eq!(call(&chain, "plasma_getBlock", json!([])).error.unwrap().code, INVALID_PARAMS);
        assert_eq!(
            call(&chain, "plasma_submitBlock", json!(["0xzz"])).error.unwrap().code,
            INVALID_PARAMS
        );
        assert_eq!(
            call(&chain, "plasma_confirmTransaction", json!([1_000_000_000u64, 0, "0x00"]))
                .error
                .unwrap()
                .code,
            INVALID_PARAMS
        );
    }

    #[test]
    fn test_error_response_omits_result() {
        let chain = chain();
        let body = serde_json::to_value(call(&chain, "nope", json!([]))).unwrap();
        assert!(body.get("result").is_none());
        assert_eq!(body["error"]["code"], json!(METHOD_NOT_FOUND));
    }
}
