//! Forwarding-layer control commands and their signing
//!
//! Prefix registration is asked of the forwarder with signed commands.
//! A command is an Interest under the face's command prefix whose name
//! carries the verb, the encoded [`ControlParameters`], a unique sequence
//! component, and a trailing signature component. The forwarder answers
//! with a Data whose payload is a [`ControlResponse`].
//!
//! Signing is a seam: the face consumes a [`CommandSigner`] trait object
//! injected at construction. [`KeyedSigner`] (keyed blake3 MAC) is the
//! shipped implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::packet::Name;

/// Success code in a [`ControlResponse`].
pub const CONTROL_OK: u32 = 200;

const FLAG_CHILD_INHERIT: u64 = 0b01;
const FLAG_CAPTURE: u64 = 0b10;

/// Options attached to a prefix registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationOptions {
    /// Deliver Interests under descendants of the prefix too. On by
    /// default.
    pub child_inherit: bool,
    /// Shadow shorter registrations by other faces.
    pub capture: bool,
    /// Route origin advertised to the forwarder.
    pub origin: u64,
    /// Route cost advertised to the forwarder.
    pub cost: u64,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        RegistrationOptions {
            child_inherit: true,
            capture: false,
            origin: 0,
            cost: 0,
        }
    }
}

impl RegistrationOptions {
    pub fn with_child_inherit(mut self, value: bool) -> Self {
        self.child_inherit = value;
        self
    }

    pub fn with_capture(mut self, value: bool) -> Self {
        self.capture = value;
        self
    }

    pub fn with_origin(mut self, origin: u64) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_cost(mut self, cost: u64) -> Self {
        self.cost = cost;
        self
    }

    /// Flag bitfield as carried in [`ControlParameters`].
    pub fn flag_bits(&self) -> u64 {
        let mut bits = 0;
        if self.child_inherit {
            bits |= FLAG_CHILD_INHERIT;
        }
        if self.capture {
            bits |= FLAG_CAPTURE;
        }
        bits
    }
}

/// Parameters encoded into a register/unregister command name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    pub name: Name,
    pub flags: u64,
    pub origin: u64,
    pub cost: u64,
}

impl ControlParameters {
    pub fn for_registration(prefix: Name, options: &RegistrationOptions) -> Self {
        ControlParameters {
            name: prefix,
            flags: options.flag_bits(),
            origin: options.origin,
            cost: options.cost,
        }
    }
}

/// Forwarder's answer to a control command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub code: u32,
    pub text: String,
}

impl ControlResponse {
    pub fn ok() -> Self {
        ControlResponse { code: CONTROL_OK, text: String::from("OK") }
    }

    pub fn error(code: u32, text: impl Into<String>) -> Self {
        ControlResponse { code, text: text.into() }
    }

    pub fn is_success(&self) -> bool {
        self.code == CONTROL_OK
    }
}

/// Which command a name carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlVerb {
    Register,
    Unregister,
}

impl ControlVerb {
    pub fn component(&self) -> &'static str {
        match self {
            ControlVerb::Register => "register",
            ControlVerb::Unregister => "unregister",
        }
    }

    pub fn from_component(component: &[u8]) -> Option<Self> {
        match component {
            b"register" => Some(ControlVerb::Register),
            b"unregister" => Some(ControlVerb::Unregister),
            _ => None,
        }
    }
}

impl fmt::Display for ControlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component())
    }
}

/// Selects the identity used to sign commands. Interpreted by the
/// signer; the face passes it through untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SigningInfo {
    pub identity: Option<Name>,
}

impl SigningInfo {
    pub fn with_identity(mut self, identity: impl Into<Name>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

/// Errors produced by a command signer.
#[derive(Debug, Clone, PartialEq)]
pub enum SignerError {
    /// The command could not be signed.
    Sign(String),
    /// The response payload could not be parsed.
    Response(String),
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerError::Sign(reason) => write!(f, "failed to sign command: {reason}"),
            SignerError::Response(reason) => write!(f, "invalid command response: {reason}"),
        }
    }
}

impl std::error::Error for SignerError {}

/// Signs control commands and parses their responses.
///
/// Injected at face construction; the face never resolves signing
/// material from ambient state.
pub trait CommandSigner: Send + 'static {
    /// Produce the signature component appended to a command name.
    fn sign(&self, signed_portion: &[u8], signing: &SigningInfo) -> Result<Vec<u8>, SignerError>;

    /// Parse a command response payload into code + text.
    fn parse_response(&self, payload: &[u8]) -> Result<ControlResponse, SignerError>;
}

/// Keyed-MAC command signer.
pub struct KeyedSigner {
    key: [u8; 32],
}

impl KeyedSigner {
    pub fn new(key: [u8; 32]) -> Self {
        KeyedSigner { key }
    }

    /// Fixed-key signer for tests and examples.
    pub fn for_testing() -> Self {
        KeyedSigner { key: [7; 32] }
    }

    /// Check a signature produced by [`CommandSigner::sign`] with the
    /// same key. Used by harnesses standing in for the forwarder.
    pub fn verify(&self, signed_portion: &[u8], signature: &[u8]) -> bool {
        blake3::keyed_hash(&self.key, signed_portion).as_bytes() == signature
    }
}

impl fmt::Debug for KeyedSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.debug_struct("KeyedSigner").field("key", &"<redacted>").finish()
    }
}

impl CommandSigner for KeyedSigner {
    fn sign(&self, signed_portion: &[u8], _signing: &SigningInfo) -> Result<Vec<u8>, SignerError> {
        Ok(blake3::keyed_hash(&self.key, signed_portion).as_bytes().to_vec())
    }

    fn parse_response(&self, payload: &[u8]) -> Result<ControlResponse, SignerError> {
        postcard::from_bytes(payload).map_err(|e| SignerError::Response(e.to_string()))
    }
}

/// Build a full, signed command name: `<prefix>/<verb>/<params>/<seq>/<sig>`.
///
/// The signed portion is the encoding of the name up to and excluding the
/// signature component.
pub(crate) fn build_command_name(
    command_prefix: &Name,
    verb: ControlVerb,
    params: &ControlParameters,
    seq: u64,
    signer: &dyn CommandSigner,
    signing: &SigningInfo,
) -> Result<Name, SignerError> {
    let params_bytes =
        postcard::to_stdvec(params).map_err(|e| SignerError::Sign(e.to_string()))?;
    let unsigned = command_prefix
        .clone()
        .append(verb.component())
        .append(params_bytes)
        .append(seq.to_be_bytes().to_vec());
    let signed_portion =
        postcard::to_stdvec(&unsigned).map_err(|e| SignerError::Sign(e.to_string()))?;
    let signature = signer.sign(&signed_portion, signing)?;
    Ok(unsigned.append(signature))
}
