//! Exported application state and the genesis document built from it.
//!
//! The app state is a map from module name to that module's exported JSON,
//! written with two-space indentation so exports from different nodes can be
//! diffed by eye. Map keys are sorted, so equal states serialize to equal
//! bytes and hash to equal [`ExportedApp::app_state_hash`] values.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kita_genesis_core::ConsensusParams;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Module name to exported module state.
pub type AppState = BTreeMap<String, serde_json::Value>;

/// Public key of a genesis validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisPubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    /// Hex-encoded key bytes.
    pub value: String,
}

/// A validator as the consensus engine sees it at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// Bech32 consensus address.
    pub address: String,
    pub pub_key: GenesisPubKey,
    pub power: i64,
    pub name: String,
}

/// Result of one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedApp {
    /// Pretty-printed JSON of the [`AppState`].
    pub app_state: Vec<u8>,
    pub validators: Vec<GenesisValidator>,
    /// Height the exported chain starts from: last height + 1, or 0.
    pub height: i64,
    pub consensus_params: ConsensusParams,
}

impl ExportedApp {
    /// Serialize an app state the way every export writes it.
    pub fn encode_app_state(state: &AppState) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(state)?)
    }

    /// Blake3 hash of the serialized app state.
    pub fn app_state_hash(&self) -> [u8; 32] {
        *blake3::hash(&self.app_state).as_bytes()
    }

    /// Parse the app state back into a module map.
    pub fn decode_app_state(&self) -> Result<AppState> {
        Ok(serde_json::from_slice(&self.app_state)?)
    }

    /// Wrap the export into a genesis document for `chain_id`.
    pub fn into_genesis_document(self, chain_id: impl Into<String>) -> Result<GenesisDocument> {
        let app_state_hash = hex::encode(self.app_state_hash());
        let app_state = serde_json::from_slice(&self.app_state)?;
        Ok(GenesisDocument {
            chain_id: chain_id.into(),
            // A chain never starts below height 1.
            initial_height: self.height.max(1),
            consensus_params: self.consensus_params,
            validators: self.validators,
            app_state_hash,
            app_state,
        })
    }
}

/// A complete genesis file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisDocument {
    pub chain_id: String,
    pub initial_height: i64,
    pub consensus_params: ConsensusParams,
    pub validators: Vec<GenesisValidator>,
    /// Hex blake3 of the serialized app state, for cross-node comparison.
    pub app_state_hash: String,
    pub app_state: serde_json::Value,
}

impl GenesisDocument {
    /// Two-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut bytes = self.to_pretty_json()?;
        bytes.push(b'\n');
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote genesis document");
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
