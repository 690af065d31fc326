//! Runtime ABI codec for the ERC20 interface.
//!
//! The interface description is parsed once from [`ERC20_ABI_JSON`] and then
//! used to encode calls and decode results by function name. Decoding is
//! strict: short data, bytes past the end of the encoded result, and values
//! that do not fit their declared integer width are all rejected.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{hex, Bytes, Selector, U256};
use thiserror::Error;

/// Size of an ABI word in bytes.
const WORD: usize = 32;

/// Literal description of the ERC20 read-only surface.
pub const ERC20_ABI_JSON: &str = r#"[
    {
        "type": "function",
        "name": "name",
        "inputs": [],
        "outputs": [{"name": "", "type": "string"}],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "symbol",
        "inputs": [],
        "outputs": [{"name": "", "type": "string"}],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "decimals",
        "inputs": [],
        "outputs": [{"name": "", "type": "uint8"}],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "totalSupply",
        "inputs": [],
        "outputs": [{"name": "", "type": "uint256"}],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "balanceOf",
        "inputs": [{"name": "_owner", "type": "address"}],
        "outputs": [{"name": "balance", "type": "uint256"}],
        "stateMutability": "view"
    }
]"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// The literal interface description could not be parsed
    #[error("Invalid interface description: {0}")]
    InvalidInterface(String),

    /// The function is not part of the interface
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Argument count or types differ from the declared inputs
    #[error("Argument mismatch for {function}: {reason}")]
    ArgumentMismatch { function: String, reason: String },

    /// Raw data is inconsistent with the declared outputs
    #[error("Failed to decode {function}: {reason}")]
    Decode { function: String, reason: String },
}

impl AbiError {
    fn mismatch(function: &str, reason: impl ToString) -> Self {
        Self::ArgumentMismatch {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }

    fn decode(function: &str, reason: impl ToString) -> Self {
        Self::Decode {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parsed ERC20 interface description.
///
/// Immutable once loaded. Share it behind an `Arc` rather than reloading it
/// per request.
#[derive(Debug, Clone)]
pub struct Erc20Abi {
    abi: JsonAbi,
}

impl Erc20Abi {
    /// Load the built-in ERC20 description.
    pub fn load() -> Result<Self, AbiError> {
        Self::from_json(ERC20_ABI_JSON)
    }

    /// Load an interface description from a JSON ABI document.
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let abi: JsonAbi =
            serde_json::from_str(json).map_err(|e| AbiError::InvalidInterface(e.to_string()))?;

        Ok(Self { abi })
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))
    }

    /// All functions in the description.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.abi.functions()
    }

    /// 4-byte selector of a function, derived from its canonical signature.
    pub fn selector(&self, name: &str) -> Result<Selector, AbiError> {
        Ok(self.function(name)?.selector())
    }

    /// Encode a call: selector followed by the ABI-encoded arguments.
    pub fn encode(&self, name: &str, args: &[DynSolValue]) -> Result<Bytes, AbiError> {
        let function = self.function(name)?;

        if args.len() != function.inputs.len() {
            return Err(AbiError::mismatch(
                name,
                format!(
                    "expected {} argument(s), got {}",
                    function.inputs.len(),
                    args.len()
                ),
            ));
        }

        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| AbiError::mismatch(name, e))?;

        Ok(Bytes::from(encoded))
    }

    /// Decode the raw result of a call into one value per declared output.
    pub fn decode(&self, name: &str, raw: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        let function = self.function(name)?;

        let values = function
            .abi_decode_output(raw)
            .map_err(|e| AbiError::decode(name, e))?;

        if values.len() != function.outputs.len() {
            return Err(AbiError::decode(
                name,
                format!(
                    "expected {} output(s), got {}",
                    function.outputs.len(),
                    values.len()
                ),
            ));
        }

        for value in &values {
            check_width(value).map_err(|reason| AbiError::decode(name, reason))?;
        }

        let expected = match encoded_end(raw, &values) {
            Some(end) => end,
            None => function
                .abi_encode_output(&values)
                .map_err(|e| AbiError::decode(name, e))?
                .len(),
        };
        if raw.len() != expected {
            return Err(AbiError::decode(
                name,
                format!("expected {} bytes, got {}", expected, raw.len()),
            ));
        }

        Ok(values)
    }

    /// Decode the arguments of an encoded call, checking its selector.
    pub fn decode_input(&self, name: &str, calldata: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        let function = self.function(name)?;

        let Some((selector, args)) = calldata.split_first_chunk::<4>() else {
            return Err(AbiError::decode(name, "calldata shorter than a selector"));
        };

        if *selector != function.selector().0 {
            return Err(AbiError::decode(
                name,
                format!("selector mismatch: 0x{}", hex::encode(selector)),
            ));
        }

        function
            .abi_decode_input(args)
            .map_err(|e| AbiError::decode(name, e))
    }

    /// Encode values as the canonical result of a function.
    pub fn encode_output(&self, name: &str, values: &[DynSolValue]) -> Result<Bytes, AbiError> {
        let function = self.function(name)?;

        let encoded = function
            .abi_encode_output(values)
            .map_err(|e| AbiError::mismatch(name, e))?;

        Ok(Bytes::from(encoded))
    }
}

/// Reject unsigned values wider than their declared type.
fn check_width(value: &DynSolValue) -> Result<(), String> {
    match value {
        DynSolValue::Uint(v, bits) if *bits < 256 && v.bit_len() > *bits => {
            Err(format!("value {v} out of range for uint{bits}"))
        }
        _ => Ok(()),
    }
}

const fn is_static(value: &DynSolValue) -> bool {
    matches!(
        value,
        DynSolValue::Bool(_)
            | DynSolValue::Int(..)
            | DynSolValue::Uint(..)
            | DynSolValue::FixedBytes(..)
            | DynSolValue::Address(_)
    )
}

/// End of the data a decoded result actually occupies: the head words plus
/// the furthest string or bytes tail, each padded to a whole word.
///
/// `None` when a dynamic output is neither a string nor bytes.
fn encoded_end(raw: &[u8], values: &[DynSolValue]) -> Option<usize> {
    let mut end = values.len() * WORD;

    for (i, value) in values.iter().enumerate() {
        let content = match value {
            DynSolValue::String(s) => s.len(),
            DynSolValue::Bytes(b) => b.len(),
            v if is_static(v) => continue,
            _ => return None,
        };

        let head = raw.get(i * WORD..(i + 1) * WORD)?;
        let offset = usize::try_from(U256::from_be_slice(head)).ok()?;
        let tail_end = offset
            .saturating_add(WORD)
            .saturating_add(content.div_ceil(WORD) * WORD);
        end = end.max(tail_end);
    }

    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::IERC20;
    use alloy_primitives::{address, Address};
    use alloy_sol_types::SolCall;

    fn word(value: U256) -> Vec<u8> {
        value.to_be_bytes::<32>().to_vec()
    }

    fn abi() -> Erc20Abi {
        Erc20Abi::load().expect("built-in ABI must parse")
    }

    #[test]
    fn test_load_declares_erc20_surface() {
        let abi = abi();
        let mut names: Vec<_> = abi.functions().map(|f| f.name.clone()).collect();
        names.sort();

        assert_eq!(
            names,
            ["balanceOf", "decimals", "name", "symbol", "totalSupply"]
        );
    }

    #[test]
    fn test_invalid_description() {
        let err = Erc20Abi::from_json("{not json").unwrap_err();
        assert!(matches!(err, AbiError::InvalidInterface(_)));
    }

    #[test]
    fn test_selectors_match_static_binding() {
        let abi = abi();

        assert_eq!(abi.selector("name").unwrap().0, IERC20::nameCall::SELECTOR);
        assert_eq!(abi.selector("symbol").unwrap().0, IERC20::symbolCall::SELECTOR);
        assert_eq!(abi.selector("decimals").unwrap().0, IERC20::decimalsCall::SELECTOR);
        assert_eq!(
            abi.selector("totalSupply").unwrap().0,
            IERC20::totalSupplyCall::SELECTOR
        );
        assert_eq!(
            abi.selector("balanceOf").unwrap().0,
            IERC20::balanceOfCall::SELECTOR
        );

        assert_eq!(abi.selector("name").unwrap().0, hex!("06fdde03"));
        assert_eq!(abi.selector("balanceOf").unwrap().0, hex!("70a08231"));
    }

    #[test]
    fn test_encode_no_argument_call_is_selector_only() {
        let payload = abi().encode("decimals", &[]).unwrap();
        assert_eq!(&payload[..], hex!("313ce567"));
    }

    #[test]
    fn test_encode_balance_of() {
        let owner = address!("1234567890123456789012345678901234567890");
        let payload = abi()
            .encode("balanceOf", &[DynSolValue::Address(owner)])
            .unwrap();

        assert_eq!(payload.len(), 4 + 32);
        assert_eq!(&payload[..4], hex!("70a08231"));
        assert_eq!(&payload[4..16], [0u8; 12]);
        assert_eq!(&payload[16..], owner.as_slice());
    }

    #[test]
    fn test_encode_unknown_function() {
        let err = abi().encode("transfer", &[]).unwrap_err();
        assert_eq!(err, AbiError::UnknownFunction("transfer".to_string()));
    }

    #[test]
    fn test_encode_argument_count_mismatch() {
        let err = abi().encode("balanceOf", &[]).unwrap_err();
        assert!(matches!(err, AbiError::ArgumentMismatch { .. }));

        let err = abi()
            .encode("name", &[DynSolValue::Address(Address::ZERO)])
            .unwrap_err();
        assert!(matches!(err, AbiError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_encode_argument_type_mismatch() {
        let err = abi()
            .encode("balanceOf", &[DynSolValue::String("0xdead".into())])
            .unwrap_err();
        assert!(matches!(err, AbiError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_call_round_trip_for_every_function() {
        let abi = abi();
        let owners = [
            Address::ZERO,
            address!("ffffffffffffffffffffffffffffffffffffffff"),
            address!("0987654321098765432109876543210987654321"),
        ];

        for function in ["name", "symbol", "decimals", "totalSupply"] {
            let payload = abi.encode(function, &[]).unwrap();
            assert!(abi.decode_input(function, &payload).unwrap().is_empty());
        }

        for owner in owners {
            let args = [DynSolValue::Address(owner)];
            let payload = abi.encode("balanceOf", &args).unwrap();
            assert_eq!(abi.decode_input("balanceOf", &payload).unwrap(), args);
        }
    }

    #[test]
    fn test_decode_input_rejects_foreign_selector() {
        let abi = abi();
        let payload = abi.encode("name", &[]).unwrap();

        let err = abi.decode_input("symbol", &payload).unwrap_err();
        assert!(matches!(err, AbiError::Decode { .. }));
        assert!(abi.decode_input("symbol", &[0x95]).is_err());
    }

    #[test]
    fn test_decode_decimals_bounds() {
        let abi = abi();

        let zero = abi.decode("decimals", &word(U256::ZERO)).unwrap();
        assert_eq!(zero, [DynSolValue::Uint(U256::ZERO, 8)]);

        let max = abi.decode("decimals", &word(U256::from(255))).unwrap();
        assert_eq!(max, [DynSolValue::Uint(U256::from(255), 8)]);

        for value in [U256::from(256), U256::from(1u64 << 40), U256::MAX] {
            let err = abi.decode("decimals", &word(value)).unwrap_err();
            assert!(matches!(err, AbiError::Decode { .. }), "{value} accepted");
        }
    }

    #[test]
    fn test_decode_total_supply_is_full_width() {
        let raw = word(U256::MAX);
        let decoded = abi().decode("totalSupply", &raw).unwrap();
        assert_eq!(decoded, [DynSolValue::Uint(U256::MAX, 256)]);
    }

    #[test]
    fn test_decode_rejects_short_and_trailing_data() {
        let abi = abi();

        assert!(matches!(
            abi.decode("totalSupply", &[]).unwrap_err(),
            AbiError::Decode { .. }
        ));
        assert!(matches!(
            abi.decode("totalSupply", &[0u8; 31]).unwrap_err(),
            AbiError::Decode { .. }
        ));

        let mut raw = word(U256::from(1));
        raw.push(0);
        assert!(matches!(
            abi.decode("totalSupply", &raw).unwrap_err(),
            AbiError::Decode { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_data_after_string() {
        let abi = abi();
        let mut raw = abi
            .encode_output("name", &[DynSolValue::String("Test Token".to_string())])
            .unwrap()
            .to_vec();
        assert_eq!(raw.len(), 3 * WORD);

        raw.extend([0xff; 32]);
        let err = abi.decode("name", &raw).unwrap_err();
        assert_eq!(
            err,
            AbiError::Decode {
                function: "name".to_string(),
                reason: "expected 96 bytes, got 128".to_string(),
            }
        );

        // A single stray byte past the padded content is also rejected.
        raw.truncate(3 * WORD + 1);
        assert!(matches!(
            abi.decode("symbol", &raw).unwrap_err(),
            AbiError::Decode { .. }
        ));
    }

    #[test]
    fn test_decode_empty_string() {
        let mut raw = word(U256::from(32));
        raw.extend(word(U256::ZERO));

        let decoded = abi().decode("symbol", &raw).unwrap();
        assert_eq!(decoded, [DynSolValue::String(String::new())]);
    }

    #[test]
    fn test_decode_string() {
        let mut raw = word(U256::from(32));
        raw.extend(word(U256::from(10)));
        let mut content = b"Test Token".to_vec();
        content.resize(32, 0);
        raw.extend(content);

        let decoded = abi().decode("name", &raw).unwrap();
        assert_eq!(decoded, [DynSolValue::String("Test Token".to_string())]);
    }

    #[test]
    fn test_decode_string_follows_offset() {
        // Offset points past an unused word.
        let mut raw = word(U256::from(64));
        raw.extend(word(U256::from(0xdead)));
        raw.extend(word(U256::from(4)));
        let mut content = b"TEST".to_vec();
        content.resize(32, 0);
        raw.extend(content);

        let decoded = abi().decode("symbol", &raw).unwrap();
        assert_eq!(decoded, [DynSolValue::String("TEST".to_string())]);
    }

    #[test]
    fn test_decode_string_with_truncated_content() {
        let mut raw = word(U256::from(32));
        raw.extend(word(U256::from(100)));
        raw.extend([0x41; 32]);

        let err = abi().decode("name", &raw).unwrap_err();
        assert!(matches!(err, AbiError::Decode { .. }));
    }

    #[test]
    fn test_encode_output_matches_decode() {
        let abi = abi();
        let values = [DynSolValue::String("Test Token".to_string())];

        let raw = abi.encode_output("name", &values).unwrap();
        assert_eq!(abi.decode("name", &raw).unwrap(), values);
    }

    #[test]
    fn test_decode_unknown_function() {
        let err = abi().decode("allowance", &word(U256::ZERO)).unwrap_err();
        assert_eq!(err, AbiError::UnknownFunction("allowance".to_string()));
    }
}
